use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode, header},
    routing::post,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, state::AppState};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1 << 20;
/// Upper bound on the lifetime of a single request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(14);

const LIMITER_SWEEP: Duration = Duration::from_secs(60);

/// Builds the application router: `POST /xhr` for commands, static files for
/// everything else.
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();
    assemble(xhr_routes(state), &static_dir)
}

/// Like [`router`], with a per-client-address rate limit on `/xhr` taken from
/// the configuration. Static files are not limited.
///
/// The limiter keys on the peer address, so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`. Must be called
/// inside a tokio runtime; a background task sweeps stale limiter entries.
pub fn rate_limited_router(state: AppState) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(state.config.rate_limit_interval_ms())
            .burst_size(state.config.rate_limit_burst)
            .use_headers()
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let governor_limiter = governor_conf.limiter().clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(LIMITER_SWEEP).await;
            tracing::debug!("🧹 Rate limiter tracks {} clients", governor_limiter.len());
            governor_limiter.retain_recent();
        }
    });

    let static_dir = state.config.static_dir.clone();
    let xhr = xhr_routes(state).route_layer(GovernorLayer::new(governor_conf));
    Ok(assemble(xhr, &static_dir))
}

fn xhr_routes(state: AppState) -> Router {
    Router::new()
        .route("/xhr", post(handlers::xhr::api_handler))
        .with_state(state)
}

fn assemble(xhr: Router, static_dir: &Path) -> Router {
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("max-age=31536000, immutable"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .service(ServeDir::new(static_dir));

    xhr.fallback_service(static_files)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
}
