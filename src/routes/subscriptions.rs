use crate::{
    error::{AppError, Result},
    models::subscription::*,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(subscribe))
        .route("/", get(list_subscriptions))
        .route("/:id", delete(unsubscribe))
}

async fn subscribe(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let subscription = state.subscription_service.subscribe(&user, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": subscription
    })))
}

async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let subscriptions = state
        .subscription_service
        .list_subscriptions(&user.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": subscriptions
    })))
}

async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Path(subscription_id): Path<String>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state
        .subscription_service
        .unsubscribe(&subscription_id, &user.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Subscription removed successfully"
    })))
}
