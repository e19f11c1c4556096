use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 持久化的站内通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemNotification {
    pub id: String,
    pub user_id: String,
    pub type_id: i64,
    pub event_id: i64,
    pub message: String,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Small classification enum stored as `event_id`. Used for filtering and
/// display only, never for business logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationEvent {
    PostLike,
    NewComment,
    NewPost,
    NewSubscriber,
}

impl NotificationEvent {
    pub const fn id(self) -> i64 {
        match self {
            NotificationEvent::PostLike => 1,
            NotificationEvent::NewComment => 2,
            NotificationEvent::NewPost => 3,
            NotificationEvent::NewSubscriber => 4,
        }
    }
}

/// Small classification enum stored as `type_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Like,
    Comments,
    Posts,
    Subscriptions,
}

impl NotificationType {
    pub const fn id(self) -> i64 {
        match self {
            NotificationType::Like => 1,
            NotificationType::Comments => 2,
            NotificationType::Posts => 3,
            NotificationType::Subscriptions => 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Typed action payloads. These are the shapes feature services assemble when
// they hand an event to the notification handler; callers are trusted to
// supply real ids (the dispatcher never re-verifies the acting user).
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRef {
    pub id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBrief {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailLinkData {
    pub email: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLikeData {
    pub post: PostRef,
    pub from_user: UserRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLikeRemoveData {
    pub post: PostRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCommentData {
    pub post: PostRef,
    pub from_user: UserRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostRef {
    pub id: String,
    pub user: UserBrief,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostData {
    pub post: NewPostRef,
    pub to_user_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscriptionData {
    pub to_user: UserRef,
    pub from_user: UserBrief,
}

// ---------------------------------------------------------------------------
// API request/query types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct MarkReadRequest {
    #[validate(length(min = 1, message = "ids must not be empty"))]
    pub ids: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    pub type_id: Option<i64>,
    pub event_id: Option<i64>,
    pub is_read: Option<bool>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}
