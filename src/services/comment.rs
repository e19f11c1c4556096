use crate::{
    error::{AppError, Result},
    models::comment::*,
    models::notification::{NewCommentData, PostRef, UserRef},
    models::post::Post,
    services::{dispatcher::{NotificationAction, NotificationHandler}, Database},
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
    handler: NotificationHandler,
}

impl CommentService {
    pub async fn new(db: Arc<Database>, handler: NotificationHandler) -> Result<Self> {
        Ok(Self { db, handler })
    }

    pub async fn create_comment(
        &self,
        post_id: &str,
        user_id: &str,
        request: CreateCommentRequest,
    ) -> Result<PostComment> {
        debug!("Creating comment for post: {}", post_id);

        request.validate().map_err(AppError::ValidatorError)?;

        let post = self.find_post(post_id).await?;

        let now = Utc::now();
        let comment = PostComment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            comment: request.comment,
            created_at: now,
            updated_at: now,
        };
        let comment = self.db.create("post_comment", comment).await?;

        self.handler
            .dispatch(NotificationAction::BlogPostsNewComment(NewCommentData {
                post: PostRef {
                    id: post.id,
                    user_id: post.user_id,
                },
                from_user: UserRef {
                    id: user_id.to_string(),
                },
            }))
            .await?;

        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        comment_id: &str,
        user_id: &str,
        request: UpdateCommentRequest,
    ) -> Result<PostComment> {
        request.validate().map_err(AppError::ValidatorError)?;

        let comment = self
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if comment.user_id != user_id {
            return Err(AppError::forbidden("You can only edit your own comments"));
        }

        // RETURN AFTER 会带回原始记录ID（Thing），重新查询拿字符串ID
        self.db
            .query_with_params(
                "UPDATE post_comment SET comment = $comment, updated_at = $now \
                 WHERE meta::id(id) = $id RETURN NONE",
                json!({
                    "id": comment_id,
                    "comment": request.comment,
                    "now": Utc::now(),
                }),
            )
            .await?;

        self.find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::internal("Failed to update comment"))
    }

    pub async fn delete_comment(&self, comment_id: &str, user_id: &str) -> Result<()> {
        let comment = self
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if comment.user_id != user_id {
            return Err(AppError::forbidden("You can only delete your own comments"));
        }

        self.db
            .query_with_params(
                "DELETE post_comment WHERE meta::id(id) = $id",
                json!({"id": comment_id}),
            )
            .await?;
        debug!("User {} deleted comment {}", user_id, comment_id);
        Ok(())
    }

    pub async fn list_post_comments(&self, post_id: &str) -> Result<Vec<PostComment>> {
        // 存在性检查：帖子没了就404而不是空列表
        self.find_post(post_id).await?;

        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM post_comment \
                 WHERE post_id = $post_id ORDER BY created_at DESC",
                json!({"post_id": post_id}),
            )
            .await?;
        let comments: Vec<PostComment> = response.take(0)?;
        Ok(comments)
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

    async fn find_comment(&self, comment_id: &str) -> Result<Option<PostComment>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM post_comment WHERE meta::id(id) = $id",
                json!({"id": comment_id}),
            )
            .await?;
        let comments: Vec<PostComment> = response.take(0)?;
        Ok(comments.into_iter().next())
    }
}
