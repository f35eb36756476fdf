use std::net::SocketAddr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;

use crate::chain::system_time;
use crate::errors::{ChainError, ChainResult};
use crate::node::{MempoolStatus, NodeHandle, NodeStatus};
use crate::payload::parse_item;
use crate::types::UserState;
use crate::verdict::Verdict;

#[derive(Clone)]
struct AppState {
    node: NodeHandle,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct SubmitResponse {
    txid: String,
    kind: String,
    verdict: Verdict,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    height: u64,
}

#[derive(Serialize)]
struct TimeResponse {
    time: u64,
}

#[derive(Deserialize)]
struct UserStateQuery {
    time: Option<u64>,
}

pub async fn serve(node: NodeHandle, addr: SocketAddr) -> ChainResult<()> {
    let state = AppState { node };
    let router = Router::new()
        .route("/health", get(health))
        .route("/time", get(node_time))
        .route("/transactions", post(submit_transaction))
        .route("/userstate/:address", get(user_state))
        .route("/status/node", get(node_status))
        .route("/status/mempool", get(mempool_status))
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!(?addr, "RPC server listening");
    axum::serve(listener, router)
        .await
        .map_err(|err| ChainError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        height: state.node.node_status().height,
    })
}

async fn node_time() -> Json<TimeResponse> {
    Json(TimeResponse {
        time: system_time(),
    })
}

/// Submits one raw social payload. Terminal rejections come back as HTTP 400
/// together with the verdict code; transient verdicts map to 503 so clients
/// retry instead of discarding the transaction.
async fn submit_transaction(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<SubmitResponse>)> {
    let item = match parse_item(&payload) {
        Ok(item) => item,
        Err(_) => {
            let txid = payload
                .get("txid")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err((
                StatusCode::BAD_REQUEST,
                Json(SubmitResponse {
                    txid,
                    kind: String::new(),
                    verdict: Verdict::OpReturnFailed,
                }),
            ));
        }
    };
    let response = SubmitResponse {
        txid: item.txid().to_string(),
        kind: item.kind().name().to_string(),
        verdict: Verdict::Success,
    };
    match state.node.submit_item(item) {
        Ok(Verdict::Success) => Ok(Json(response)),
        Ok(verdict) => {
            let status = if verdict.is_transient() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::BAD_REQUEST
            };
            Err((status, Json(SubmitResponse { verdict, ..response })))
        }
        Err(_) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SubmitResponse {
                verdict: Verdict::Failed,
                ..response
            }),
        )),
    }
}

async fn user_state(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<UserStateQuery>,
) -> Result<Json<UserState>, (StatusCode, Json<ErrorResponse>)> {
    let time = query.time.unwrap_or_else(|| state.node.adjusted_time());
    state
        .node
        .user_state(&address, time)
        .map(Json)
        .map_err(to_http_error)
}

async fn node_status(State(state): State<AppState>) -> Json<NodeStatus> {
    Json(state.node.node_status())
}

async fn mempool_status(State(state): State<AppState>) -> Json<MempoolStatus> {
    Json(state.node.mempool_status())
}

fn to_http_error(err: ChainError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        ChainError::Transaction(_) | ChainError::Payload(_) | ChainError::Config(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
