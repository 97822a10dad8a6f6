//! HTTP surface for the fanout dispatcher.
//!
//! | Route | Behavior |
//! |---|---|
//! | `GET /delay/sequential` | `numOfCalls` calls, one at a time |
//! | `GET /delay/parallel` | `numOfCalls` calls, at most `callLimit` at once |
//! | `GET /healthz`, `GET /up` | liveness |
//!
//! The router is generic over the downstream service so tests can mount it
//! on an in-memory stub instead of a live httpbin.

pub mod config;
pub mod error;
pub mod params;
pub mod response;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use fanout_dispatch::{DelayRequest, Dispatcher, DownstreamError, ExecutionMode, Payload};
use serde_json::{json, Value};
use std::collections::HashMap;
use tower::Service;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use params::{DelayParams, ValidationError};
pub use response::{CallBody, CallResult, DelayResponse};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState<S> {
    dispatcher: Dispatcher<S>,
}

impl<S> AppState<S> {
    pub fn new(dispatcher: Dispatcher<S>) -> Self {
        Self { dispatcher }
    }
}

/// Builds the application router.
pub fn router<S>(dispatcher: Dispatcher<S>) -> Router
where
    S: Service<DelayRequest, Response = Payload, Error = DownstreamError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    Router::new()
        .route("/delay/sequential", get(sequential::<S>))
        .route("/delay/parallel", get(parallel::<S>))
        .route("/healthz", get(health))
        .route("/up", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(dispatcher))
}

async fn sequential<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<DelayResponse>, ApiError>
where
    S: Service<DelayRequest, Response = Payload, Error = DownstreamError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    run(&state, &query, ExecutionMode::Sequential).await
}

async fn parallel<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<DelayResponse>, ApiError>
where
    S: Service<DelayRequest, Response = Payload, Error = DownstreamError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    run(&state, &query, ExecutionMode::Parallel).await
}

async fn run<S>(
    state: &AppState<S>,
    query: &HashMap<String, String>,
    mode: ExecutionMode,
) -> Result<Json<DelayResponse>, ApiError>
where
    S: Service<DelayRequest, Response = Payload, Error = DownstreamError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let params = DelayParams::from_query(query)?;
    tracing::info!(
        %mode,
        delay_secs = params.delay_secs,
        num_of_calls = params.num_of_calls,
        call_limit = ?params.call_limit,
        "Delay request"
    );

    let result = state.dispatcher.dispatch(params.into_request(mode)).await?;
    Ok(Json(DelayResponse::from(result)))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
