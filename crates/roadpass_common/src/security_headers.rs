use axum::http::{HeaderMap, HeaderValue, Request};
use axum::response::Response;
use std::env;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

#[derive(Clone, Debug)]
pub struct SecurityHeadersLayer {
    enabled: bool,
    hsts_enabled: bool,
    csp_enabled: bool,
    csp_value: String,
}

impl SecurityHeadersLayer {
    pub fn new(enabled: bool, hsts_enabled: bool) -> Self {
        Self::with_csp(
            enabled,
            hsts_enabled,
            true,
            default_csp_header_value().to_string(),
        )
    }

    pub fn with_csp(
        enabled: bool,
        hsts_enabled: bool,
        csp_enabled: bool,
        csp_value: String,
    ) -> Self {
        let csp_value = csp_value.trim().to_string();
        Self {
            enabled,
            hsts_enabled,
            csp_enabled,
            csp_value: if csp_value.is_empty() {
                default_csp_header_value().to_string()
            } else {
                csp_value
            },
        }
    }

    // HSTS defaults on only for prod-like environments.
    pub fn from_env(env_name: &str) -> Self {
        let env_lower = env_name.trim().to_ascii_lowercase();
        let enabled = parse_bool_env("SECURITY_HEADERS_ENABLED", true);
        let hsts_default = matches!(env_lower.as_str(), "prod" | "production" | "staging");
        let hsts_enabled = parse_bool_env("HSTS_ENABLED", hsts_default);
        let csp_enabled = parse_bool_env("CSP_ENABLED", true);
        let csp_value = env::var("CSP_HEADER_VALUE").unwrap_or_default();
        Self::with_csp(enabled, hsts_enabled, csp_enabled, csp_value)
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersService {
            inner,
            enabled: self.enabled,
            hsts_enabled: self.hsts_enabled,
            csp_enabled: self.csp_enabled,
            csp_value: self.csp_value.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SecurityHeadersService<S> {
    inner: S,
    enabled: bool,
    hsts_enabled: bool,
    csp_enabled: bool,
    csp_value: String,
}

impl<S, B> Service<Request<B>> for SecurityHeadersService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let enabled = self.enabled;
        let hsts_enabled = self.hsts_enabled;
        let csp_enabled = self.csp_enabled;
        let csp_value = self.csp_value.clone();
        let mut inner = self.inner.clone();
        Box::pin(async move {
            let mut resp = inner.call(req).await?;
            if enabled {
                add_security_headers(resp.headers_mut(), hsts_enabled, csp_enabled, &csp_value);
            }
            Ok(resp)
        })
    }
}

fn default_csp_header_value() -> &'static str {
    "default-src 'self'; base-uri 'none'; frame-ancestors 'none'; object-src 'none'; img-src 'self' https: data:; connect-src 'self' https:; form-action 'self'"
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    let raw = env::var(key).unwrap_or_default();
    let v = raw.trim().to_ascii_lowercase();
    if v.is_empty() {
        return default;
    }
    !matches!(v.as_str(), "0" | "false" | "no" | "off")
}

fn add_security_headers(headers: &mut HeaderMap, hsts: bool, csp: bool, csp_value: &str) {
    set_if_absent(headers, "x-content-type-options", "nosniff");
    set_if_absent(headers, "x-frame-options", "DENY");
    set_if_absent(headers, "referrer-policy", "no-referrer");
    set_if_absent(headers, "permissions-policy", "camera=(), geolocation=(), microphone=()");
    if hsts {
        set_if_absent(
            headers,
            "strict-transport-security",
            "max-age=63072000; includeSubDomains",
        );
    }
    if csp {
        if let Ok(v) = HeaderValue::from_str(csp_value) {
            if !headers.contains_key("content-security-policy") {
                headers.insert("content-security-policy", v);
            }
        }
    }
}

fn set_if_absent(headers: &mut HeaderMap, name: &'static str, value: &'static str) {
    if !headers.contains_key(name) {
        headers.insert(name, HeaderValue::from_static(value));
    }
}
