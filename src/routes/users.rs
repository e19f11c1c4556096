use crate::{error::Result, state::AppState};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:username", get(get_user))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<Value>> {
    let user = state.user_service.get_by_username(&username).await?;

    Ok(Json(json!({
        "success": true,
        "data": user
    })))
}
