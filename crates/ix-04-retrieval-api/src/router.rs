//! # HTTP Routes
//!
//! Thin handlers over [`RetrievalService`]. Identifier parsing failures map to
//! 400, unknown chunk targets to 404.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::domain::errors::RetrievalError;
use crate::domain::types::{BroadcastRequest, BroadcastResponse, ObjectInfo};
use crate::middleware::auth::{AuthConfig, BasicAuthLayer};
use crate::ports::outbound::TransactionRelay;
use crate::service::{parse_identifier, RetrievalService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: RetrievalService,
    pub relay: Option<Arc<dyn TransactionRelay>>,
}

impl IntoResponse for RetrievalError {
    fn into_response(self) -> Response {
        let status = match &self {
            RetrievalError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            RetrievalError::NotFound => StatusCode::NOT_FOUND,
            RetrievalError::RelayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            RetrievalError::Relay(_) => StatusCode::BAD_GATEWAY,
            RetrievalError::Index(_)
            | RetrievalError::FileRead { .. }
            | RetrievalError::Internal(_) => {
                error!("[ix-04] Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct InfoQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ChunkQuery {
    pub q: String,
    pub chunk_index: u64,
    pub chunk_size: u64,
}

/// Build the router: `/health` open, everything else behind Basic auth.
pub fn build_router(state: AppState, auth: AuthConfig) -> Router {
    let protected = Router::new()
        .route("/obj/info", get(obj_info))
        .route("/obj/chunk", get(obj_chunk))
        .route("/tx/broadcast", post(tx_broadcast))
        .layer(BasicAuthLayer::new(auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn obj_info(
    State(state): State<AppState>,
    Query(query): Query<InfoQuery>,
) -> Result<Json<ObjectInfo>, RetrievalError> {
    let id = parse_identifier(&query.q)?;
    let service = state.service.clone();
    let info = tokio::task::spawn_blocking(move || service.info(&id))
        .await
        .map_err(|e| RetrievalError::Internal(e.to_string()))??;
    Ok(Json(info))
}

async fn obj_chunk(
    State(state): State<AppState>,
    Query(query): Query<ChunkQuery>,
) -> Result<Response, RetrievalError> {
    let id = parse_identifier(&query.q)?;
    let service = state.service.clone();
    let bytes = tokio::task::spawn_blocking(move || {
        service.chunk(&id, query.chunk_index, query.chunk_size)
    })
    .await
    .map_err(|e| RetrievalError::Internal(e.to_string()))??;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    )
        .into_response())
}

async fn tx_broadcast(
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, RetrievalError> {
    let relay = state.relay.ok_or(RetrievalError::RelayUnavailable)?;
    let response = match relay.broadcast(request.hex.trim()).await {
        Ok(txid) => {
            info!("[ix-04] Broadcast {}", txid);
            BroadcastResponse {
                txid,
                message: "ok".into(),
            }
        }
        Err(e) => BroadcastResponse {
            txid: String::new(),
            message: e.to_string(),
        },
    };
    Ok(Json(response))
}
