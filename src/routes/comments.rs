use crate::{
    error::{AppError, Result},
    models::comment::*,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/post/:post_id", get(list_post_comments))
        .route("/post/:post_id", post(create_comment))
        .route("/:id", put(update_comment))
        .route("/:id", delete(delete_comment))
}

async fn list_post_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let comments = state.comment_service.list_post_comments(&post_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": comments
    })))
}

async fn create_comment(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let comment = state
        .comment_service
        .create_comment(&post_id, &user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comment
    })))
}

async fn update_comment(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(comment_id): Path<String>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let comment = state
        .comment_service
        .update_comment(&comment_id, &user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comment
    })))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state
        .comment_service
        .delete_comment(&comment_id, &user.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted successfully"
    })))
}
