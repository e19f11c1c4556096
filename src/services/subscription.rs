use crate::{
    error::{AppError, Result},
    models::notification::{NewSubscriptionData, UserBrief, UserRef},
    models::subscription::*,
    services::{dispatcher::{NotificationAction, NotificationHandler}, Database},
    services::auth::AuthUser,
    services::user::UserService,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct SubscriptionService {
    db: Arc<Database>,
    users: UserService,
    handler: NotificationHandler,
}

impl SubscriptionService {
    pub async fn new(
        db: Arc<Database>,
        users: UserService,
        handler: NotificationHandler,
    ) -> Result<Self> {
        Ok(Self { db, users, handler })
    }

    pub async fn subscribe(
        &self,
        user: &AuthUser,
        request: CreateSubscriptionRequest,
    ) -> Result<Subscription> {
        if request.to_user_id == user.id {
            return Err(AppError::forbidden("You cannot subscribe to yourself"));
        }

        if !self.users.exists(&request.to_user_id).await? {
            return Err(AppError::forbidden("Unknown user"));
        }

        if self.subscription_exists(&request.to_user_id, &user.id).await? {
            return Err(AppError::forbidden("You have already subscribed."));
        }

        let subscription = Subscription {
            id: Uuid::new_v4().to_string(),
            to_user_id: request.to_user_id.clone(),
            user_id: user.id.clone(),
            created_at: Utc::now(),
        };
        let subscription = self.db.create("subscription", subscription).await?;
        debug!("User {} subscribed to {}", user.id, request.to_user_id);

        self.handler
            .dispatch(NotificationAction::BlogSubscriptionsNew(NewSubscriptionData {
                to_user: UserRef {
                    id: request.to_user_id,
                },
                from_user: UserBrief {
                    id: user.id.clone(),
                    username: user.username.clone(),
                },
            }))
            .await?;

        Ok(subscription)
    }

    pub async fn unsubscribe(&self, subscription_id: &str, user_id: &str) -> Result<()> {
        let subscription = self
            .find_subscription(subscription_id)
            .await?
            .ok_or_else(|| AppError::not_found("Subscription"))?;

        if subscription.user_id != user_id {
            return Err(AppError::forbidden(
                "You can only remove your own subscriptions",
            ));
        }

        self.db
            .query_with_params(
                "DELETE subscription WHERE meta::id(id) = $id",
                json!({"id": subscription_id}),
            )
            .await?;
        Ok(())
    }

    pub async fn list_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM subscription \
                 WHERE user_id = $user_id ORDER BY created_at DESC",
                json!({"user_id": user_id}),
            )
            .await?;
        let subscriptions: Vec<Subscription> = response.take(0)?;
        Ok(subscriptions)
    }

    async fn find_subscription(&self, subscription_id: &str) -> Result<Option<Subscription>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM subscription WHERE meta::id(id) = $id",
                json!({"id": subscription_id}),
            )
            .await?;
        let subscriptions: Vec<Subscription> = response.take(0)?;
        Ok(subscriptions.into_iter().next())
    }

    async fn subscription_exists(&self, to_user_id: &str, user_id: &str) -> Result<bool> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT meta::id(id) AS id FROM subscription \
                 WHERE to_user_id = $to_user_id AND user_id = $user_id",
                json!({"to_user_id": to_user_id, "user_id": user_id}),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;
        Ok(!rows.is_empty())
    }
}
