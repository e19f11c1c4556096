use crate::{
    error::{AppError, Result},
    models::notification::{MarkReadRequest, NotificationQuery},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/read", post(mark_read))
        .route("/read-all", post(mark_all_read))
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let notifications = state
        .notification_service
        .list_notifications(&user.id, &query)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": notifications
    })))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    request.validate().map_err(AppError::ValidatorError)?;

    state
        .notification_service
        .mark_read(&user.id, &request.ids)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Notifications marked as read"
    })))
}

async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.notification_service.mark_all_read(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "All notifications marked as read"
    })))
}
