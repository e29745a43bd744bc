use axum::http::{header::HeaderName, HeaderValue, Request};
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

// Correlation id for one request, exposed as a request extension so handlers
// and log spans can reference it.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

// An inbound id is kept so a trace can span the gateway hop; oversized or
// non-printable values are replaced rather than echoed back.
fn accept_inbound_id(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.len() > 128 {
        return None;
    }
    if !raw.bytes().all(|b| b.is_ascii_graphic()) {
        return None;
    }
    Some(raw.to_string())
}

fn mint_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl<S, B> Service<Request<B>> for RequestIdService<S>
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

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let header = HeaderName::from_static(REQUEST_ID_HEADER);
        let inbound = req
            .headers()
            .get(&header)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let rid = accept_inbound_id(inbound.as_deref()).unwrap_or_else(mint_id);
        req.extensions_mut().insert(RequestId(rid.clone()));

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let mut resp = inner.call(req).await?;
            if !resp.headers().contains_key(&header) {
                if let Ok(v) = HeaderValue::from_str(&rid) {
                    resp.headers_mut().insert(header, v);
                }
            }
            Ok(resp)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sane_inbound_ids_are_kept() {
        assert_eq!(accept_inbound_id(Some(" req-1 ")).as_deref(), Some("req-1"));
        assert_eq!(accept_inbound_id(Some("abc123")).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_or_garbled_inbound_ids_are_replaced() {
        assert!(accept_inbound_id(None).is_none());
        assert!(accept_inbound_id(Some("   ")).is_none());
        assert!(accept_inbound_id(Some("a b")).is_none());
        let long = "x".repeat(129);
        assert!(accept_inbound_id(Some(&long)).is_none());
    }

    #[test]
    fn minted_ids_are_simple_uuids() {
        let id = mint_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
