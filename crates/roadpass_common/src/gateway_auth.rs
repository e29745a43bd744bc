use axum::http::{header::HeaderName, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};

pub const GATEWAY_AUTH_HEADER: &str = "x-gateway-auth";

// Authenticates the upstream gateway that forwards identity headers. When
// required, requests must carry the shared secret; x-user-* headers on
// requests that fail this check never reach a handler.
#[derive(Clone)]
pub struct GatewayAuthLayer {
    required: bool,
    secret: Option<String>,
    header: HeaderName,
}

impl GatewayAuthLayer {
    pub fn new(required: bool, secret: Option<String>) -> Self {
        Self {
            required,
            secret,
            header: HeaderName::from_static(GATEWAY_AUTH_HEADER),
        }
    }
}

impl<S> Layer<S> for GatewayAuthLayer {
    type Service = GatewayAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GatewayAuthService {
            inner,
            required: self.required,
            secret: self.secret.clone(),
            header: self.header.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GatewayAuthService<S> {
    inner: S,
    required: bool,
    secret: Option<String>,
    header: HeaderName,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl<S, B> Service<Request<B>> for GatewayAuthService<S>
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
        let required = self.required;
        let secret = self.secret.clone();
        let header = self.header.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !required {
                return inner.call(req).await;
            }

            let Some(secret) = secret.filter(|s| !s.trim().is_empty()) else {
                let body = axum::Json(ErrorBody {
                    detail: "gateway auth not configured",
                });
                return Ok((StatusCode::SERVICE_UNAVAILABLE, body).into_response());
            };

            let provided = req
                .headers()
                .get(&header)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .unwrap_or("");

            if provided.is_empty() || provided.as_bytes().ct_eq(secret.as_bytes()).unwrap_u8() != 1
            {
                let body = axum::Json(ErrorBody {
                    detail: "gateway auth required",
                });
                return Ok((StatusCode::UNAUTHORIZED, body).into_response());
            }

            inner.call(req).await
        })
    }
}
