use crate::{
    error::{AppError, Result},
    models::notification::{NewPostData, NewPostRef, UserBrief},
    models::post::*,
    models::response::Paginated,
    services::{dispatcher::{NotificationAction, NotificationHandler}, Database},
    services::auth::AuthUser,
    services::notification::MAX_PER_PAGE,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
    handler: NotificationHandler,
}

impl PostService {
    pub async fn new(db: Arc<Database>, handler: NotificationHandler) -> Result<Self> {
        Ok(Self { db, handler })
    }

    /// 发帖并向当前订阅者广播通知
    pub async fn create_post(&self, user: &AuthUser, request: CreatePostRequest) -> Result<Post> {
        request.validate().map_err(AppError::ValidatorError)?;

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            content: request.content,
            created_at: now,
            updated_at: now,
        };
        let post = self.db.create("post", post).await?;

        // 无订阅者时不触发分发
        let subscriber_ids = self.subscriber_ids(&user.id).await?;
        if !subscriber_ids.is_empty() {
            self.handler
                .dispatch(NotificationAction::BlogPostsNew(NewPostData {
                    post: NewPostRef {
                        id: post.id.clone(),
                        user: UserBrief {
                            id: user.id.clone(),
                            username: user.username.clone(),
                        },
                    },
                    to_user_ids: subscriber_ids,
                }))
                .await?;
        }

        Ok(post)
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT *, meta::id(id) AS id FROM post WHERE meta::id(id) = $id",
                json!({"id": post_id}),
            )
            .await?;
        let posts: Vec<Post> = response.take(0)?;
        Ok(posts.into_iter().next())
    }

    pub async fn list_posts(&self, query: &PostQuery) -> Result<Paginated<Post>> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query
            .per_page
            .unwrap_or(self.db.config.default_posts_per_page)
            .clamp(1, MAX_PER_PAGE);
        let start = (page - 1).saturating_mul(per_page);

        let where_clause = if query.user_id.is_some() {
            "WHERE user_id = $user_id"
        } else {
            ""
        };
        let params = json!({"user_id": query.user_id});

        let select = format!(
            "SELECT *, meta::id(id) AS id FROM post {} \
             ORDER BY created_at DESC LIMIT {} START {}",
            where_clause, per_page, start
        );
        let mut response = self.db.query_with_params(&select, &params).await?;
        let posts: Vec<Post> = response.take(0)?;

        let count = format!("SELECT count() AS total FROM post {} GROUP ALL", where_clause);
        let mut response = self.db.query_with_params(&count, &params).await?;
        let totals: Vec<Value> = response.take(0)?;
        let total = totals
            .first()
            .and_then(|row| row["total"].as_u64())
            .unwrap_or(0) as usize;

        Ok(Paginated::new(posts, total, page, per_page))
    }

    /// 编辑自己的帖子。内容替换不重新广播通知
    pub async fn update_post(
        &self,
        post_id: &str,
        user_id: &str,
        request: UpdatePostRequest,
    ) -> Result<Post> {
        request.validate().map_err(AppError::ValidatorError)?;

        let post = self
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        if post.user_id != user_id {
            return Err(AppError::forbidden("You can only edit your own posts"));
        }

        self.db
            .query_with_params(
                "UPDATE post SET content = $content, updated_at = $now \
                 WHERE meta::id(id) = $id RETURN NONE",
                json!({
                    "id": post_id,
                    "content": request.content,
                    "now": Utc::now(),
                }),
            )
            .await?;

        self.get_post(post_id)
            .await?
            .ok_or_else(|| AppError::internal("Failed to update post"))
    }

    pub async fn delete_post(&self, post_id: &str, user_id: &str) -> Result<()> {
        let post = self
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        if post.user_id != user_id {
            return Err(AppError::forbidden("You can only delete your own posts"));
        }

        self.db
            .query_with_params(
                "DELETE post WHERE meta::id(id) = $id",
                json!({"id": post_id}),
            )
            .await?;
        Ok(())
    }

    /// 当前订阅者用户ID，按ID升序（广播顺序保持稳定）
    async fn subscriber_ids(&self, user_id: &str) -> Result<Vec<String>> {
        debug!("Loading subscriber ids for user: {}", user_id);

        let mut response = self
            .db
            .query_with_params(
                "SELECT user_id FROM subscription WHERE to_user_id = $to_user_id \
                 ORDER BY user_id",
                json!({"to_user_id": user_id}),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;

        Ok(rows
            .iter()
            .filter_map(|row| row["user_id"].as_str().map(String::from))
            .collect())
    }
}
