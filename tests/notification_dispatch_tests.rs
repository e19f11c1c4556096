//! Notification dispatch tests against an in-memory SurrealDB instance.
//!
//! Each test connects to its own `mem://` engine, routes actions through the
//! handler the way feature services do, and inspects the resulting
//! `system_notification` rows.

use pulse_blog::{
    config::Config,
    error::AppError,
    models::notification::*,
    services::{Database, EmailSender, NotificationAction, NotificationHandler, NotificationService},
};
use serde_json::json;
use std::sync::Arc;

struct TestContext {
    db: Arc<Database>,
    notifications: NotificationService,
    handler: NotificationHandler,
}

async fn setup() -> TestContext {
    let config = Config::default();
    let db = Arc::new(Database::new(&config).await.unwrap());
    let notifications = NotificationService::new(db.clone()).await.unwrap();
    let mailer = EmailSender::new(&config).unwrap();
    let handler = NotificationHandler::new(notifications.clone(), mailer);

    TestContext {
        db,
        notifications,
        handler,
    }
}

impl TestContext {
    async fn rows_for(&self, user_id: &str) -> Vec<SystemNotification> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM system_notification \
                 WHERE user_id = $user_id ORDER BY created_at",
                json!({ "user_id": user_id }),
            )
            .await
            .unwrap();
        response.take(0).unwrap()
    }

    async fn all_rows(&self) -> Vec<SystemNotification> {
        let mut response = self
            .db
            .query("SELECT *, meta::id(id) AS id FROM system_notification")
            .await
            .unwrap();
        response.take(0).unwrap()
    }

    async fn like(&self, post_id: &str, post_owner: &str, from_user: &str) {
        self.handler
            .dispatch(NotificationAction::BlogPostsLike(PostLikeData {
                post: PostRef {
                    id: post_id.to_string(),
                    user_id: post_owner.to_string(),
                },
                from_user: UserRef {
                    id: from_user.to_string(),
                },
            }))
            .await
            .unwrap();
    }

    async fn like_remove(&self, post_id: &str, post_owner: &str) {
        self.handler
            .dispatch(NotificationAction::BlogPostsLikeRemove(PostLikeRemoveData {
                post: PostRef {
                    id: post_id.to_string(),
                    user_id: post_owner.to_string(),
                },
            }))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_post_like_creates_one_unread_notification() {
    let ctx = setup().await;

    ctx.like("post-1", "owner-1", "liker-1").await;

    let rows = ctx.rows_for("owner-1").await;
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.user_id, "owner-1");
    assert_eq!(row.type_id, NotificationType::Like.id());
    assert_eq!(row.event_id, NotificationEvent::PostLike.id());
    assert_eq!(row.message, "New like on your post.");
    assert_eq!(row.payload["post_id"], "post-1");
    assert_eq!(row.payload["from_user_id"], "liker-1");
    assert!(!row.is_read);
}

#[tokio::test]
async fn test_like_then_remove_leaves_no_rows() {
    let ctx = setup().await;

    ctx.like("post-1", "owner-1", "liker-1").await;
    ctx.like_remove("post-1", "owner-1").await;

    assert!(ctx.rows_for("owner-1").await.is_empty());
}

#[tokio::test]
async fn test_like_remove_is_scoped_to_the_post() {
    let ctx = setup().await;

    ctx.like("post-1", "owner-1", "liker-1").await;
    ctx.like("post-2", "owner-1", "liker-1").await;

    ctx.like_remove("post-2", "owner-1").await;

    let rows = ctx.rows_for("owner-1").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].payload["post_id"], "post-1");
}

#[tokio::test]
async fn test_like_remove_does_not_touch_other_events() {
    let ctx = setup().await;

    // A comment notification carries the same payload.post_id but a
    // different event id; removing the like must not delete it.
    ctx.handler
        .dispatch(NotificationAction::BlogPostsNewComment(NewCommentData {
            post: PostRef {
                id: "post-1".to_string(),
                user_id: "owner-1".to_string(),
            },
            from_user: UserRef {
                id: "commenter-1".to_string(),
            },
        }))
        .await
        .unwrap();
    ctx.like("post-1", "owner-1", "liker-1").await;

    ctx.like_remove("post-1", "owner-1").await;

    let rows = ctx.rows_for("owner-1").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_id, NotificationEvent::NewComment.id());
}

#[tokio::test]
async fn test_like_remove_spares_already_read_rows() {
    let ctx = setup().await;

    ctx.like("post-1", "owner-1", "liker-1").await;
    let ids: Vec<String> = ctx
        .rows_for("owner-1")
        .await
        .into_iter()
        .map(|row| row.id)
        .collect();
    ctx.notifications.mark_read("owner-1", &ids).await.unwrap();

    ctx.like_remove("post-1", "owner-1").await;

    let rows = ctx.rows_for("owner-1").await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_read);
}

#[tokio::test]
async fn test_new_comment_notifies_the_post_owner() {
    let ctx = setup().await;

    ctx.handler
        .dispatch(NotificationAction::BlogPostsNewComment(NewCommentData {
            post: PostRef {
                id: "post-1".to_string(),
                user_id: "owner-1".to_string(),
            },
            from_user: UserRef {
                id: "commenter-1".to_string(),
            },
        }))
        .await
        .unwrap();

    let rows = ctx.rows_for("owner-1").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].type_id, NotificationType::Comments.id());
    assert_eq!(rows[0].event_id, NotificationEvent::NewComment.id());
    assert_eq!(rows[0].message, "New comment on your post.");
    assert_eq!(rows[0].payload["from_user_id"], "commenter-1");
}

#[tokio::test]
async fn test_new_post_fans_out_to_every_subscriber() {
    let ctx = setup().await;

    ctx.handler
        .dispatch(NotificationAction::BlogPostsNew(NewPostData {
            post: NewPostRef {
                id: "post-1".to_string(),
                user: UserBrief {
                    id: "author-1".to_string(),
                    username: "sample".to_string(),
                },
            },
            to_user_ids: vec!["sub-1".to_string(), "sub-2".to_string()],
        }))
        .await
        .unwrap();

    let all = ctx.all_rows().await;
    assert_eq!(all.len(), 2);

    for user_id in ["sub-1", "sub-2"] {
        let rows = ctx.rows_for(user_id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_id, NotificationEvent::NewPost.id());
        assert_eq!(rows[0].message, "New post from sample.");
        assert_eq!(rows[0].payload["post_id"], "post-1");
        assert_eq!(rows[0].payload["from_user"]["id"], "author-1");
        assert_eq!(rows[0].payload["from_user"]["username"], "sample");
    }
}

#[tokio::test]
async fn test_new_post_with_no_recipients_writes_nothing() {
    let ctx = setup().await;

    ctx.handler
        .dispatch(NotificationAction::BlogPostsNew(NewPostData {
            post: NewPostRef {
                id: "post-1".to_string(),
                user: UserBrief {
                    id: "author-1".to_string(),
                    username: "sample".to_string(),
                },
            },
            to_user_ids: vec![],
        }))
        .await
        .unwrap();

    assert!(ctx.all_rows().await.is_empty());
}

#[tokio::test]
async fn test_new_subscription_notifies_the_target_user() {
    let ctx = setup().await;

    ctx.handler
        .dispatch(NotificationAction::BlogSubscriptionsNew(NewSubscriptionData {
            to_user: UserRef {
                id: "owner-1".to_string(),
            },
            from_user: UserBrief {
                id: "follower-1".to_string(),
                username: "follower".to_string(),
            },
        }))
        .await
        .unwrap();

    let rows = ctx.rows_for("owner-1").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].type_id, NotificationType::Subscriptions.id());
    assert_eq!(rows[0].event_id, NotificationEvent::NewSubscriber.id());
    assert_eq!(rows[0].message, "New subscriber.");
    assert_eq!(rows[0].payload["from_user"]["id"], "follower-1");
}

#[tokio::test]
async fn test_accept_parses_loose_payloads() {
    let ctx = setup().await;

    ctx.handler
        .accept(
            "BLOG_POSTS_LIKE",
            json!({"post": {"id": "post-1", "user_id": "owner-1"}, "from_user": {"id": "liker-1"}}),
        )
        .await
        .unwrap();

    let rows = ctx.rows_for("owner-1").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_id, NotificationEvent::PostLike.id());
}

#[tokio::test]
async fn test_accept_unknown_action_writes_nothing() {
    let ctx = setup().await;

    let err = ctx
        .handler
        .accept("BLOG_POSTS_UNKNOWN", json!({"post": {"id": "post-1"}}))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotImplemented(_)));
    assert!(ctx.all_rows().await.is_empty());
}

#[tokio::test]
async fn test_mark_read_only_touches_the_owner() {
    let ctx = setup().await;

    ctx.like("post-1", "owner-1", "liker-1").await;
    ctx.like("post-2", "owner-2", "liker-1").await;

    // owner-2 tries to mark owner-1's row as read
    let owner_1_ids: Vec<String> = ctx
        .rows_for("owner-1")
        .await
        .into_iter()
        .map(|row| row.id)
        .collect();
    ctx.notifications
        .mark_read("owner-2", &owner_1_ids)
        .await
        .unwrap();

    assert!(!ctx.rows_for("owner-1").await[0].is_read);
    assert!(!ctx.rows_for("owner-2").await[0].is_read);

    ctx.notifications
        .mark_read("owner-1", &owner_1_ids)
        .await
        .unwrap();
    assert!(ctx.rows_for("owner-1").await[0].is_read);
}

#[tokio::test]
async fn test_mark_all_read_is_idempotent() {
    let ctx = setup().await;

    ctx.like("post-1", "owner-1", "liker-1").await;
    ctx.like("post-2", "owner-1", "liker-2").await;

    ctx.notifications.mark_all_read("owner-1").await.unwrap();
    ctx.notifications.mark_all_read("owner-1").await.unwrap();

    let rows = ctx.rows_for("owner-1").await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.is_read));
}

#[tokio::test]
async fn test_list_notifications_filters_and_paginates() {
    let ctx = setup().await;

    for post in ["post-1", "post-2", "post-3"] {
        ctx.like(post, "owner-1", "liker-1").await;
    }
    ctx.handler
        .dispatch(NotificationAction::BlogPostsNewComment(NewCommentData {
            post: PostRef {
                id: "post-1".to_string(),
                user_id: "owner-1".to_string(),
            },
            from_user: UserRef {
                id: "commenter-1".to_string(),
            },
        }))
        .await
        .unwrap();

    let likes_only = ctx
        .notifications
        .list_notifications(
            "owner-1",
            &NotificationQuery {
                event_id: Some(NotificationEvent::PostLike.id()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(likes_only.total, 3);
    assert!(likes_only
        .data
        .iter()
        .all(|row| row.event_id == NotificationEvent::PostLike.id()));

    let first_page = ctx
        .notifications
        .list_notifications(
            "owner-1",
            &NotificationQuery {
                page: Some(1),
                per_page: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(first_page.total, 4);
    assert_eq!(first_page.data.len(), 3);
    assert_eq!(first_page.total_pages, 2);

    let second_page = ctx
        .notifications
        .list_notifications(
            "owner-1",
            &NotificationQuery {
                page: Some(2),
                per_page: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(second_page.data.len(), 1);
}

#[tokio::test]
async fn test_list_notifications_survives_oversized_paging() {
    let ctx = setup().await;

    ctx.like("post-1", "owner-1", "liker-1").await;

    let page = ctx
        .notifications
        .list_notifications(
            "owner-1",
            &NotificationQuery {
                page: Some(3),
                per_page: Some(usize::MAX),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.data.is_empty());
}
