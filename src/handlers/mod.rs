// Handlers module
// HTTP handlers for the REST API

pub mod thoughts;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::{routes::ENDPOINTS, store::SharedStore};

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub endpoints: Vec<EndpointDescription>,
}

#[derive(Debug, Serialize)]
pub struct EndpointDescription {
    pub path: &'static str,
    pub methods: Vec<&'static str>,
}

/// Describe the exposed routes
/// GET /
pub async fn index() -> impl IntoResponse {
    let endpoints = ENDPOINTS
        .iter()
        .map(|endpoint| EndpointDescription {
            path: endpoint.path,
            methods: endpoint.methods.to_vec(),
        })
        .collect();

    Json(IndexResponse {
        message: "Endpoints for happy thought message:",
        endpoints,
    })
}

/// Health check handler
/// Returns "OK" when the store answers, 503 otherwise
pub async fn health_check(State(store): State<SharedStore>) -> impl IntoResponse {
    match store.ping().await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "message": "Store unavailable" })),
            )
                .into_response()
        }
    }
}
