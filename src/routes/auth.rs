use crate::{
    error::{AppError, Result},
    models::user::*,
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/confirm-email", post(confirm_email))
        .route("/resend-confirm-email", post(resend_confirm_email))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>> {
    let user = state.auth_service.register(request).await?;

    Ok(Json(json!({
        "success": true,
        "data": user
    })))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let response = state.auth_service.login(request).await?;

    Ok(Json(json!({
        "success": true,
        "data": response
    })))
}

async fn confirm_email(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfirmEmailRequest>,
) -> Result<Json<Value>> {
    state.auth_service.confirm_email(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Email confirmed successfully"
    })))
}

async fn resend_confirm_email(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.auth_service.resend_confirm_email(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Confirmation email sent"
    })))
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    state.auth_service.forgot_password(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "If the email exists, a reset link has been sent"
    })))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    state.auth_service.reset_password(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password reset successfully"
    })))
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    state.auth_service.change_password(&user.id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let access_token = state.auth_service.refresh_token(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "access_token": access_token }
    })))
}

async fn me(
    State(state): State<Arc<AppState>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    let user = user.ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let account = state.auth_service.get_account(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": account
    })))
}
