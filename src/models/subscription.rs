use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `user_id` 订阅 `to_user_id` 的动态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub to_user_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub to_user_id: String,
}
