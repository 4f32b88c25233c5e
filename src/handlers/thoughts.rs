// Thought handlers
// HTTP handlers for listing, creating and liking thoughts

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        thought::{parse_thought_id, FieldErrorKind},
        CreateThoughtRequest, LikeResponse, ValidationErrors,
    },
    store::{SharedStore, THOUGHTS_PAGE_SIZE},
};

/// List the most recent thoughts, newest first
/// GET /happythoughts
pub async fn list_thoughts(State(store): State<SharedStore>) -> ApiResult<impl IntoResponse> {
    info!("Fetching the {} most recent thoughts", THOUGHTS_PAGE_SIZE);

    let thoughts = store.list_recent(THOUGHTS_PAGE_SIZE).await?;

    info!("Retrieved {} thoughts", thoughts.len());
    Ok((StatusCode::OK, Json(thoughts)))
}

/// Create a new thought
/// POST /happythoughts
pub async fn create_thought(
    State(store): State<SharedStore>,
    payload: Result<Json<CreateThoughtRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|rejection| {
        ValidationErrors::single("body", FieldErrorKind::Invalid, rejection.body_text(), None)
    })?;

    let new_thought = request.validate()?;
    info!("Creating new thought with {} characters", new_thought.message().chars().count());

    let thought = store.insert(new_thought).await?;

    info!("Successfully created thought with id: {}", thought.id);
    Ok((StatusCode::CREATED, Json(thought)))
}

/// Add one heart to a thought
/// PATCH /happythoughts/:thoughtId/like
pub async fn like_thought(
    State(store): State<SharedStore>,
    Path(thought_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Liking thought with id: {}", thought_id);

    let id = parse_thought_id(&thought_id)
        .ok_or_else(|| ApiError::rejected(format!("Invalid thought id: {}", thought_id)))?;

    let thought = store
        .increment_hearts(id)
        .await
        .map_err(|e| e.into_rejection("Could not like thought"))?
        .ok_or_else(|| ApiError::not_found("Thought not found"))?;

    info!("Thought {} now has {} hearts", thought.id, thought.hearts);
    Ok((
        StatusCode::OK,
        Json(LikeResponse {
            success: true,
            response: thought,
        }),
    ))
}
