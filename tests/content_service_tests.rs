//! Post, comment and account operations against an in-memory SurrealDB
//! instance, exercised through the services the routes call.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use chrono::Utc;
use pulse_blog::{
    config::Config,
    error::AppError,
    models::comment::{CreateCommentRequest, UpdateCommentRequest},
    models::post::{CreatePostRequest, PostQuery, UpdatePostRequest},
    models::user::{ChangePasswordRequest, LoginRequest, User},
    services::{
        auth::AuthUser, AuthService, CommentService, Database, EmailSender, NotificationHandler,
        NotificationService, PostService,
    },
};
use std::sync::Arc;
use uuid::Uuid;

struct TestContext {
    db: Arc<Database>,
    auth: AuthService,
    posts: PostService,
    comments: CommentService,
}

async fn setup() -> TestContext {
    let config = Config::default();
    let db = Arc::new(Database::new(&config).await.unwrap());
    let notifications = NotificationService::new(db.clone()).await.unwrap();
    let mailer = EmailSender::new(&config).unwrap();
    let handler = NotificationHandler::new(notifications, mailer);

    let auth = AuthService::new(db.clone(), &config, handler.clone())
        .await
        .unwrap();
    let posts = PostService::new(db.clone(), handler.clone()).await.unwrap();
    let comments = CommentService::new(db.clone(), handler).await.unwrap();

    TestContext {
        db,
        auth,
        posts,
        comments,
    }
}

fn author() -> AuthUser {
    AuthUser {
        id: "author-1".to_string(),
        username: "author".to_string(),
        email: "author@example.com".to_string(),
    }
}

impl TestContext {
    /// 直接写入一行用户记录，绕过注册时的确认邮件发送
    async fn seed_user(&self, email: &str, password: &str) -> User {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: "sample".to_string(),
            email: email.to_string(),
            password_hash,
            is_active: true,
            is_email_confirmed: true,
            confirm_token: None,
            confirm_token_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        self.db.create("user", user).await.unwrap()
    }
}

#[tokio::test]
async fn test_update_comment_returns_the_edited_row() {
    let ctx = setup().await;

    let post = ctx
        .posts
        .create_post(
            &author(),
            CreatePostRequest {
                content: "original post".to_string(),
            },
        )
        .await
        .unwrap();
    let comment = ctx
        .comments
        .create_comment(
            &post.id,
            "commenter-1",
            CreateCommentRequest {
                comment: "first take".to_string(),
            },
        )
        .await
        .unwrap();

    let updated = ctx
        .comments
        .update_comment(
            &comment.id,
            "commenter-1",
            UpdateCommentRequest {
                comment: "second take".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, comment.id);
    assert_eq!(updated.comment, "second take");
    assert!(updated.updated_at >= comment.updated_at);
}

#[tokio::test]
async fn test_update_comment_rejects_other_users() {
    let ctx = setup().await;

    let post = ctx
        .posts
        .create_post(
            &author(),
            CreatePostRequest {
                content: "a post".to_string(),
            },
        )
        .await
        .unwrap();
    let comment = ctx
        .comments
        .create_comment(
            &post.id,
            "commenter-1",
            CreateCommentRequest {
                comment: "mine".to_string(),
            },
        )
        .await
        .unwrap();

    let err = ctx
        .comments
        .update_comment(
            &comment.id,
            "someone-else",
            UpdateCommentRequest {
                comment: "hijacked".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
}

#[tokio::test]
async fn test_delete_comment_removes_own_row_only() {
    let ctx = setup().await;

    let post = ctx
        .posts
        .create_post(
            &author(),
            CreatePostRequest {
                content: "a post".to_string(),
            },
        )
        .await
        .unwrap();
    let comment = ctx
        .comments
        .create_comment(
            &post.id,
            "commenter-1",
            CreateCommentRequest {
                comment: "to be removed".to_string(),
            },
        )
        .await
        .unwrap();

    let err = ctx
        .comments
        .delete_comment(&comment.id, "someone-else")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    ctx.comments
        .delete_comment(&comment.id, "commenter-1")
        .await
        .unwrap();
    assert!(ctx
        .comments
        .list_post_comments(&post.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_update_post_edits_own_content() {
    let ctx = setup().await;

    let post = ctx
        .posts
        .create_post(
            &author(),
            CreatePostRequest {
                content: "draft".to_string(),
            },
        )
        .await
        .unwrap();

    let err = ctx
        .posts
        .update_post(
            &post.id,
            "someone-else",
            UpdatePostRequest {
                content: "hijacked".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let updated = ctx
        .posts
        .update_post(
            &post.id,
            &author().id,
            UpdatePostRequest {
                content: "final".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, post.id);
    assert_eq!(updated.content, "final");
}

#[tokio::test]
async fn test_list_posts_survives_oversized_paging() {
    let ctx = setup().await;

    ctx.posts
        .create_post(
            &author(),
            CreatePostRequest {
                content: "only post".to_string(),
            },
        )
        .await
        .unwrap();

    let page = ctx
        .posts
        .list_posts(&PostQuery {
            page: Some(3),
            per_page: Some(usize::MAX),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn test_change_password_requires_the_old_one() {
    let ctx = setup().await;
    let user = ctx.seed_user("sample@example.com", "old-password").await;

    let err = ctx
        .auth
        .change_password(
            &user.id,
            ChangePasswordRequest {
                old_password: "wrong-password".to_string(),
                new_password: "brand-new-password".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));

    ctx.auth
        .change_password(
            &user.id,
            ChangePasswordRequest {
                old_password: "old-password".to_string(),
                new_password: "brand-new-password".to_string(),
            },
        )
        .await
        .unwrap();

    // 新密码生效，旧密码失效
    let login = ctx
        .auth
        .login(LoginRequest {
            email: "sample@example.com".to_string(),
            password: "brand-new-password".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(login.user.id, user.id);

    let err = ctx
        .auth
        .login(LoginRequest {
            email: "sample@example.com".to_string(),
            password: "old-password".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
}

#[tokio::test]
async fn test_refresh_token_issues_a_verifiable_token() {
    let ctx = setup().await;
    let user = ctx.seed_user("sample@example.com", "a-password").await;

    let token = ctx.auth.refresh_token(&user.id).await.unwrap();
    let claims = ctx.auth.verify_jwt(&token).unwrap();
    assert_eq!(claims.sub, user.id);

    let account = ctx.auth.get_account(&user.id).await.unwrap();
    assert_eq!(account.email, "sample@example.com");
}
