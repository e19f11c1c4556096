use crate::{
    error::{AppError, Result},
    models::post::*,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_post))
        .route("/", get(list_posts))
        .route("/:id", get(get_post))
        .route("/:id", put(update_post))
        .route("/:id", delete(delete_post))
        .route("/:id/like", post(like_post))
        .route("/:id/like", delete(unlike_post))
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let post = state.post_service.create_post(&user, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostQuery>,
) -> Result<Json<Value>> {
    let posts = state.post_service.list_posts(&query).await?;

    Ok(Json(json!({
        "success": true,
        "data": posts
    })))
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let post = state
        .post_service
        .get_post(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

async fn update_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let post = state
        .post_service
        .update_post(&post_id, &user.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": post
    })))
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.post_service.delete_post(&post_id, &user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Post deleted successfully"
    })))
}

async fn like_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.post_like_service.add_like(&post_id, &user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Post liked successfully"
    })))
}

async fn unlike_post(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state
        .post_like_service
        .remove_like(&post_id, &user.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Like removed successfully"
    })))
}
