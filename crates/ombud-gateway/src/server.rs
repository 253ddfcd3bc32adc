//! Webhook server wiring: router, handlers, bootstrap.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ombud_broker::{OwnershipSnapshotEntry, OwnershipStore, WebhookDispatcher};
use ombud_core::{elapsed_ms, unix_timestamp_ms};

pub const WEBHOOK_ENDPOINT: &str = "/webhook";
pub const HEALTH_ENDPOINT: &str = "/health";
pub const DEBUG_CONVERSATIONS_ENDPOINT: &str = "/debug/conversations";

/// Shared state behind the gateway routes.
pub struct GatewayServerState {
    dispatcher: Arc<WebhookDispatcher>,
    store: Arc<OwnershipStore>,
    started_unix_ms: u64,
}

impl GatewayServerState {
    pub fn new(dispatcher: Arc<WebhookDispatcher>) -> Self {
        let store = dispatcher.store();
        Self {
            dispatcher,
            store,
            started_unix_ms: unix_timestamp_ms(),
        }
    }

    pub fn store(&self) -> &OwnershipStore {
        &self.store
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_ms: u64,
    tracked_conversations: usize,
}

pub fn build_gateway_router(state: Arc<GatewayServerState>) -> Router {
    Router::new()
        .route(WEBHOOK_ENDPOINT, post(handle_webhook))
        .route(HEALTH_ENDPOINT, get(handle_health))
        .route(DEBUG_CONVERSATIONS_ENDPOINT, get(handle_debug_conversations))
        .with_state(state)
}

/// Acks every delivery immediately with the fixed body the platform expects;
/// processing continues on a spawned task and its outcome never changes the
/// response.
async fn handle_webhook(
    State(state): State<Arc<GatewayServerState>>,
    body: Bytes,
) -> Json<Value> {
    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => {
            let dispatcher = Arc::clone(&state.dispatcher);
            tokio::spawn(async move {
                dispatcher.dispatch(&payload).await;
            });
        }
        Err(error) => {
            tracing::debug!(error = %error, "acknowledged webhook with unparseable body");
        }
    }
    Json(json!({ "status": "received" }))
}

async fn handle_health(State(state): State<Arc<GatewayServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_ms: elapsed_ms(state.started_unix_ms),
        tracked_conversations: state.store.tracked_count(),
    })
}

async fn handle_debug_conversations(
    State(state): State<Arc<GatewayServerState>>,
) -> Json<std::collections::BTreeMap<String, OwnershipSnapshotEntry>> {
    Json(state.store.snapshot())
}

/// Binds the listener and serves until ctrl-c.
pub async fn run_gateway_server(bind: &str, state: Arc<GatewayServerState>) -> Result<()> {
    let bind_addr = bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind '{bind}'"))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind gateway server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound gateway server address")?;

    println!(
        "gateway server listening: webhook={} health={} addr={}",
        WEBHOOK_ENDPOINT, HEALTH_ENDPOINT, local_addr
    );

    let app = build_gateway_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("gateway server exited unexpectedly")
}
