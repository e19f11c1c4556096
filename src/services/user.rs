use crate::{
    error::{AppError, Result},
    models::user::{PublicUser, User},
    services::Database,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn get_by_username(&self, username: &str) -> Result<PublicUser> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM user WHERE username = $username",
                json!({"username": username}),
            )
            .await?;
        let users: Vec<User> = response.take(0)?;

        users
            .into_iter()
            .next()
            .map(PublicUser::from)
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn exists(&self, user_id: &str) -> Result<bool> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT meta::id(id) AS id FROM user WHERE meta::id(id) = $id",
                json!({"id": user_id}),
            )
            .await?;
        let rows: Vec<serde_json::Value> = response.take(0)?;
        Ok(!rows.is_empty())
    }
}
