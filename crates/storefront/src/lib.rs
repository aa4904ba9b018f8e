//! TicketWave storefront library.
//!
//! JSON API behind the FANS ONLY pass signup: the session-scoped signup
//! wizard, password and provider auth, and the pass holder profile. Exposed
//! as a library so the router can be driven from integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod signup;
pub mod state;

use std::time::Duration;

use axum::Router;
use axum::http::{Request, Response};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::service::SignedCookie;
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::state::AppState;

/// Build the application router.
///
/// `sessions` is the session layer to run under: Postgres-backed in the
/// binary, in-memory in tests.
pub fn app<Store>(
    state: AppState,
    sessions: SessionManagerLayer<Store, SignedCookie>,
) -> Router
where
    Store: SessionStore + Clone,
{
    let api = Router::new()
        .nest("/api/signup", routes::signup_routes())
        .nest("/api/users", routes::user_routes())
        .layer(middleware::api_rate_limiter());

    let auth = Router::new()
        .nest("/api/auth", routes::auth_routes())
        .layer(middleware::auth_rate_limiter());

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
            span.record("status", response.status().as_u16());
            span.record(
                "latency_ms",
                u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            );
            DefaultOnResponse::default().on_response(response, latency, span);
        });

    Router::new()
        .merge(routes::health_routes())
        .merge(api)
        .merge(auth)
        .layer(
            ServiceBuilder::new()
                .layer(trace)
                .layer(axum::middleware::from_fn(middleware::request_id_middleware))
                .layer(sessions),
        )
        .with_state(state)
}
