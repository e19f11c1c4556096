use crate::{
    error::{AppError, Result},
    models::notification::{PostLikeData, PostLikeRemoveData, PostRef, UserRef},
    models::post::{Post, PostLike},
    services::{dispatcher::{NotificationAction, NotificationHandler}, Database},
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct PostLikeService {
    db: Arc<Database>,
    handler: NotificationHandler,
}

impl PostLikeService {
    pub async fn new(db: Arc<Database>, handler: NotificationHandler) -> Result<Self> {
        Ok(Self { db, handler })
    }

    pub async fn add_like(&self, post_id: &str, user_id: &str) -> Result<()> {
        let post = self.find_post(post_id).await?;

        if self.like_exists(post_id, user_id).await? {
            return Err(AppError::conflict("You have already liked this post"));
        }

        let like = PostLike {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now(),
        };
        self.db.create("post_like", like).await?;
        debug!("User {} liked post {}", user_id, post_id);

        self.handler
            .dispatch(NotificationAction::BlogPostsLike(PostLikeData {
                post: PostRef {
                    id: post.id,
                    user_id: post.user_id,
                },
                from_user: UserRef {
                    id: user_id.to_string(),
                },
            }))
            .await
    }

    pub async fn remove_like(&self, post_id: &str, user_id: &str) -> Result<()> {
        let post = self.find_post(post_id).await?;

        if !self.like_exists(post_id, user_id).await? {
            return Err(AppError::not_found("Like"));
        }

        self.db
            .query_with_params(
                "DELETE post_like WHERE post_id = $post_id AND user_id = $user_id",
                json!({"post_id": post_id, "user_id": user_id}),
            )
            .await?;
        debug!("User {} unliked post {}", user_id, post_id);

        self.handler
            .dispatch(NotificationAction::BlogPostsLikeRemove(PostLikeRemoveData {
                post: PostRef {
                    id: post.id,
                    user_id: post.user_id,
                },
            }))
            .await
    }

    async fn find_post(&self, post_id: &str) -> Result<Post> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM post WHERE meta::id(id) = $id",
                json!({"id": post_id}),
            )
            .await?;
        let posts: Vec<Post> = response.take(0)?;
        posts
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("Post"))
    }

    async fn like_exists(&self, post_id: &str, user_id: &str) -> Result<bool> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT meta::id(id) AS id FROM post_like \
                 WHERE post_id = $post_id AND user_id = $user_id",
                json!({"post_id": post_id, "user_id": user_id}),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;
        Ok(!rows.is_empty())
    }
}
