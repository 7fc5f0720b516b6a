//! HTTP routes.
//!
//! - `GET /health`: health check
//! - `GET /api/tables`: the stored collection (`{}` if nothing stored)
//! - `POST /api/tables`: replace the stored collection

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::storage::{ServerStorageError, TableStore, Tables};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TableStore>,
}

impl AppState {
    pub fn new(store: impl TableStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Builds the full router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tables", get(get_tables).post(put_tables))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Error body for 4xx/5xx responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

/// Request failures, mapped to status codes.
#[derive(Debug)]
pub enum ApiError {
    /// Body is not a JSON object.
    InvalidPayload(String),
    /// Storage fault while reading or writing.
    Internal(ServerStorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidPayload(reason) => {
                tracing::warn!("Rejected table payload: {}", reason);
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "Invalid data format",
                    }),
                )
                    .into_response()
            }
            ApiError::Internal(e) => {
                tracing::error!("Table storage failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Server error",
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<ServerStorageError> for ApiError {
    fn from(e: ServerStorageError) -> Self {
        ApiError::Internal(e)
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_tables(State(state): State<AppState>) -> Result<Json<Tables>, ApiError> {
    let tables = state.store.load()?;
    Ok(Json(tables))
}

#[derive(Serialize)]
struct SaveResponse {
    success: bool,
}

/// Replaces the stored collection with the request body.
///
/// The body is parsed by hand so that every malformed payload gets the
/// same 400 `{error}` response.
async fn put_tables(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveResponse>, ApiError> {
    let tables = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(tables)) => tables,
        Ok(other) => {
            return Err(ApiError::InvalidPayload(format!(
                "expected an object, got {}",
                json_kind(&other)
            )))
        }
        Err(e) => return Err(ApiError::InvalidPayload(e.to_string())),
    };

    state.store.save(&tables)?;
    tracing::info!("Stored {} table(s)", tables.len());

    Ok(Json(SaveResponse { success: true }))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
