mod config;
mod db;
mod error;
mod handlers;
mod models;
mod state;

use axum::extract::MatchedPath;
use axum::http::{header, header::HeaderName, Method, StatusCode};
use axum::routing::{get, post, put};
use axum::Router;
use config::Config;
use roadpass_common::gateway_auth::GatewayAuthLayer;
use roadpass_common::host_guard::AllowedHostsLayer;
use roadpass_common::request_id::RequestIdLayer;
use roadpass_common::security_headers::SecurityHeadersLayer;
use state::AppState;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let pool = match db::connect(&cfg.db_url).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "db connect failed");
            std::process::exit(2);
        }
    };
    if let Err(e) = db::ensure_schema(&pool, &cfg.db_schema).await {
        tracing::error!(error = %e, "db ensure_schema failed");
        std::process::exit(2);
    }

    let http = match reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "http client init failed");
            std::process::exit(2);
        }
    };

    let state = AppState {
        pool,
        db_schema: cfg.db_schema.clone(),
        env_name: cfg.env_name.clone(),
        payment_base_url: cfg.payment_base_url.clone(),
        payment_key_id: cfg.payment_key_id.clone(),
        payment_key_secret: cfg.payment_key_secret.clone(),
        payment_currency: cfg.payment_currency.clone(),
        http,
    };

    let gateway = GatewayAuthLayer::new(cfg.require_gateway_auth, cfg.gateway_auth_secret.clone());

    let gated = Router::new()
        .route("/cars", get(handlers::list_cars))
        .route("/cars/:car_id", get(handlers::car_detail))
        .route(
            "/cars/:car_id/availability",
            get(handlers::check_car_availability),
        )
        .route("/bookings/order", post(handlers::create_payment_order))
        .route("/bookings/verify", post(handlers::verify_payment))
        .route("/bookings", get(handlers::my_bookings))
        .route("/bookings/:booking_id", get(handlers::booking_detail))
        .route(
            "/bookings/:booking_id/cancel",
            post(handlers::cancel_booking),
        )
        .route(
            "/admin/cars",
            get(handlers::admin_list_cars).post(handlers::admin_create_car),
        )
        .route(
            "/admin/cars/:car_id",
            put(handlers::admin_update_car).delete(handlers::admin_delete_car),
        )
        .route("/admin/bookings", get(handlers::admin_list_bookings))
        .route(
            "/admin/bookings/:booking_id/status",
            post(handlers::admin_set_booking_status),
        )
        .route("/admin/dashboard", get(handlers::admin_dashboard))
        .layer(gateway);

    let cors = if cfg.allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers(rental_cors_allowed_headers())
            .allow_credentials(false)
    } else {
        let origins: Vec<axum::http::HeaderValue> = cfg
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers(rental_cors_allowed_headers())
            // Identity arrives via gateway headers, not cookies.
            .allow_credentials(false)
            .allow_origin(AllowOrigin::list(origins))
    };

    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(gated)
        // Unknown routes return 404, not gateway-auth fallback details.
        .fallback(|| async { StatusCode::NOT_FOUND })
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(cfg.max_body_bytes))
        .layer(AllowedHostsLayer::new(cfg.allowed_hosts.clone()))
        .layer(SecurityHeadersLayer::from_env(&cfg.env_name))
        // Log the matched route template when available, never the query
        // string.
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or_else(|| req.uri().path());
                tracing::span!(
                    tracing::Level::INFO,
                    "http_request",
                    method = %req.method(),
                    path = %path
                )
            }),
        )
        .layer(RequestIdLayer::new());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], cfg.port)));
    tracing::info!(%addr, "starting roadpass_rental_service");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

fn rental_cors_allowed_headers() -> Vec<HeaderName> {
    vec![
        header::ACCEPT,
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        HeaderName::from_static("x-request-id"),
    ]
}
