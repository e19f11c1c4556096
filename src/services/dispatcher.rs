use crate::{
    error::{AppError, Result},
    models::notification::*,
    services::{email::EmailSender, notification::NotificationService},
};
use serde_json::{json, Value};
use tracing::debug;

/// Domain events routed through the notification handler, one variant per
/// action with its own typed payload. The closed enum replaces the original
/// prefix-matched string dispatch, so routing is exhaustive and order-free.
#[derive(Debug, Clone)]
pub enum NotificationAction {
    UserConfirmEmail(EmailLinkData),
    UserForgotPassword(EmailLinkData),
    BlogPostsLike(PostLikeData),
    BlogPostsLikeRemove(PostLikeRemoveData),
    BlogPostsNewComment(NewCommentData),
    BlogPostsNew(NewPostData),
    BlogSubscriptionsNew(NewSubscriptionData),
}

impl NotificationAction {
    /// 按动作名解析调用方传入的payload
    ///
    /// Unknown names are a caller/dispatcher mismatch and surface as
    /// `NotImplemented`; nothing is written in that case.
    pub fn parse(action: &str, data: Value) -> Result<Self> {
        let parsed = match action {
            "USER_CONFIRM_EMAIL" => Self::UserConfirmEmail(serde_json::from_value(data)?),
            "USER_FORGOT_PASSWORD" => Self::UserForgotPassword(serde_json::from_value(data)?),
            "BLOG_POSTS_LIKE" => Self::BlogPostsLike(serde_json::from_value(data)?),
            "BLOG_POSTS_LIKE_REMOVE" => Self::BlogPostsLikeRemove(serde_json::from_value(data)?),
            "BLOG_POSTS_NEW_COMMENT" => Self::BlogPostsNewComment(serde_json::from_value(data)?),
            "BLOG_POSTS_NEW" => Self::BlogPostsNew(serde_json::from_value(data)?),
            "BLOG_SUBSCRIPTIONS_NEW" => Self::BlogSubscriptionsNew(serde_json::from_value(data)?),
            _ => {
                return Err(AppError::NotImplemented(format!(
                    "Unrecognized notification action: {}",
                    action
                )))
            }
        };
        Ok(parsed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UserConfirmEmail(_) => "USER_CONFIRM_EMAIL",
            Self::UserForgotPassword(_) => "USER_FORGOT_PASSWORD",
            Self::BlogPostsLike(_) => "BLOG_POSTS_LIKE",
            Self::BlogPostsLikeRemove(_) => "BLOG_POSTS_LIKE_REMOVE",
            Self::BlogPostsNewComment(_) => "BLOG_POSTS_NEW_COMMENT",
            Self::BlogPostsNew(_) => "BLOG_POSTS_NEW",
            Self::BlogSubscriptionsNew(_) => "BLOG_SUBSCRIPTIONS_NEW",
        }
    }
}

/// 用户域入口：确认邮箱/找回密码，每次调用发送一封邮件
#[derive(Clone)]
pub struct UserEntrypoint {
    mailer: EmailSender,
}

impl UserEntrypoint {
    pub fn new(mailer: EmailSender) -> Self {
        Self { mailer }
    }

    pub async fn confirm_email(&self, data: EmailLinkData) -> Result<()> {
        let body = format!(
            "Confirm email and complete the account registration via the link:\n\n{}",
            data.link
        );
        self.mailer
            .send("Complete the account registration.", &body, &[data.email])
            .await
    }

    pub async fn forgot_password(&self, data: EmailLinkData) -> Result<()> {
        let body = format!("Complete password reset via the link:\n\n{}", data.link);
        self.mailer
            .send("Password reset.", &body, &[data.email])
            .await
    }
}

/// 帖子域入口：点赞、取消点赞、新评论、新帖子广播
#[derive(Clone)]
pub struct BlogPostsEntrypoint {
    notifications: NotificationService,
}

impl BlogPostsEntrypoint {
    pub fn new(notifications: NotificationService) -> Self {
        Self { notifications }
    }

    pub async fn post_like(&self, data: PostLikeData) -> Result<()> {
        self.notifications
            .create_notification(
                &data.post.user_id,
                NotificationType::Like,
                NotificationEvent::PostLike,
                "New like on your post.".to_string(),
                json!({
                    "post_id": data.post.id,
                    "from_user_id": data.from_user.id,
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn post_like_remove(&self, data: PostLikeRemoveData) -> Result<()> {
        self.notifications
            .remove_unread(&data.post.user_id, NotificationEvent::PostLike, &data.post.id)
            .await
    }

    pub async fn new_comment(&self, data: NewCommentData) -> Result<()> {
        self.notifications
            .create_notification(
                &data.post.user_id,
                NotificationType::Comments,
                NotificationEvent::NewComment,
                "New comment on your post.".to_string(),
                json!({
                    "post_id": data.post.id,
                    "from_user_id": data.from_user.id,
                }),
            )
            .await?;
        Ok(())
    }

    /// 给每个订阅者各写一条通知
    ///
    /// Creates run one by one; if the n-th create fails, earlier rows stand
    /// (rollback, if any, is the caller's transaction boundary).
    pub async fn new_post(&self, data: NewPostData) -> Result<()> {
        let message = format!("New post from {}.", data.post.user.username);
        let payload = json!({
            "post_id": data.post.id,
            "from_user": {
                "id": data.post.user.id,
                "username": data.post.user.username,
            },
        });

        for to_user_id in &data.to_user_ids {
            self.notifications
                .create_notification(
                    to_user_id,
                    NotificationType::Posts,
                    NotificationEvent::NewPost,
                    message.clone(),
                    payload.clone(),
                )
                .await?;
        }
        Ok(())
    }
}

/// 订阅域入口：新订阅者
#[derive(Clone)]
pub struct BlogSubscriptionsEntrypoint {
    notifications: NotificationService,
}

impl BlogSubscriptionsEntrypoint {
    pub fn new(notifications: NotificationService) -> Self {
        Self { notifications }
    }

    pub async fn new_subscription(&self, data: NewSubscriptionData) -> Result<()> {
        self.notifications
            .create_notification(
                &data.to_user.id,
                NotificationType::Subscriptions,
                NotificationEvent::NewSubscriber,
                "New subscriber.".to_string(),
                json!({
                    "from_user": {
                        "id": data.from_user.id,
                        "username": data.from_user.username,
                    },
                }),
            )
            .await?;
        Ok(())
    }
}

/// 通知分发入口（门面）
///
/// Feature services call this in-line, inside the request that produced the
/// domain event. Purely a router: resolves the action to one entrypoint
/// method and performs no side effects of its own.
#[derive(Clone)]
pub struct NotificationHandler {
    user: UserEntrypoint,
    blog_posts: BlogPostsEntrypoint,
    blog_subscriptions: BlogSubscriptionsEntrypoint,
}

impl NotificationHandler {
    pub fn new(notifications: NotificationService, mailer: EmailSender) -> Self {
        Self {
            user: UserEntrypoint::new(mailer),
            blog_posts: BlogPostsEntrypoint::new(notifications.clone()),
            blog_subscriptions: BlogSubscriptionsEntrypoint::new(notifications),
        }
    }

    /// String boundary kept for callers that assemble loose payloads; the
    /// payload shape is validated here before anything runs.
    pub async fn accept(&self, action: &str, data: Value) -> Result<()> {
        self.dispatch(NotificationAction::parse(action, data)?).await
    }

    pub async fn dispatch(&self, action: NotificationAction) -> Result<()> {
        debug!("Dispatching notification action: {}", action.name());

        match action {
            NotificationAction::UserConfirmEmail(data) => self.user.confirm_email(data).await,
            NotificationAction::UserForgotPassword(data) => self.user.forgot_password(data).await,
            NotificationAction::BlogPostsLike(data) => self.blog_posts.post_like(data).await,
            NotificationAction::BlogPostsLikeRemove(data) => {
                self.blog_posts.post_like_remove(data).await
            }
            NotificationAction::BlogPostsNewComment(data) => {
                self.blog_posts.new_comment(data).await
            }
            NotificationAction::BlogPostsNew(data) => self.blog_posts.new_post(data).await,
            NotificationAction::BlogSubscriptionsNew(data) => {
                self.blog_subscriptions.new_subscription(data).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_routes_every_known_action() {
        let cases = vec![
            ("USER_CONFIRM_EMAIL", json!({"link": "sample-link", "email": "sample@gmail.com"})),
            ("USER_FORGOT_PASSWORD", json!({"link": "sample-link", "email": "sample@gmail.com"})),
            ("BLOG_POSTS_LIKE", json!({"post": {"id": "1", "user_id": "1"}, "from_user": {"id": "2"}})),
            ("BLOG_POSTS_LIKE_REMOVE", json!({"post": {"id": "1", "user_id": "1"}})),
            ("BLOG_POSTS_NEW_COMMENT", json!({"post": {"id": "1", "user_id": "1"}, "from_user": {"id": "2"}})),
            (
                "BLOG_POSTS_NEW",
                json!({"post": {"id": "1", "user": {"id": "1", "username": "sample"}}, "to_user_ids": ["1", "2", "3"]}),
            ),
            (
                "BLOG_SUBSCRIPTIONS_NEW",
                json!({"to_user": {"id": "1"}, "from_user": {"id": "2", "username": "sample"}}),
            ),
        ];

        for (name, data) in cases {
            let action = NotificationAction::parse(name, data).unwrap();
            assert_eq!(action.name(), name);
        }
    }

    #[test]
    fn test_parse_unknown_action_is_not_implemented() {
        let err = NotificationAction::parse("UNKNOWN_ACTION", json!({})).unwrap_err();
        assert!(matches!(err, crate::error::AppError::NotImplemented(_)));
    }

    #[test]
    fn test_parse_rejects_malformed_payload() {
        // BLOG_POSTS_LIKE without the post object is a shape violation
        let err = NotificationAction::parse("BLOG_POSTS_LIKE", json!({"from_user": {"id": "2"}}));
        assert!(err.is_err());
    }

    #[test]
    fn test_shared_name_fragments_do_not_collide() {
        // BLOG_POSTS_NEW and BLOG_POSTS_NEW_COMMENT share a prefix fragment;
        // exact-name matching must keep them apart.
        let action = NotificationAction::parse(
            "BLOG_POSTS_NEW_COMMENT",
            json!({"post": {"id": "1", "user_id": "1"}, "from_user": {"id": "2"}}),
        )
        .unwrap();
        assert!(matches!(action, NotificationAction::BlogPostsNewComment(_)));
    }
}
