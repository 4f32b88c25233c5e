use axum::{
    routing::{get, patch},
    Router,
};

use crate::{
    config::CorsConfig,
    handlers::{
        health_check, index,
        thoughts::{create_thought, like_thought, list_thoughts},
    },
    middleware::create_middleware_stack,
    store::SharedStore,
};

/// A route as advertised by the index endpoint
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub path: &'static str,
    pub methods: &'static [&'static str],
}

/// Every route registered in [`create_router`]; keep the two in step.
pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint { path: "/", methods: &["GET"] },
    Endpoint { path: "/health", methods: &["GET"] },
    Endpoint { path: "/happythoughts", methods: &["GET", "POST"] },
    Endpoint { path: "/happythoughts/:thoughtId/like", methods: &["PATCH"] },
];

/// Create the Axum router with all endpoints and middleware
pub fn create_router(store: SharedStore, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/happythoughts", get(list_thoughts).post(create_thought))
        .route("/happythoughts/:thoughtId/like", patch(like_thought))
        // Add shared state (thought store)
        .with_state(store)
        // Apply middleware stack
        .layer(create_middleware_stack(cors))
}
