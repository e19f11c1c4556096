use crate::{
    error::Result,
    models::notification::*,
    models::response::Paginated,
    services::Database,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 分页上限，防止超大 per_page 拖垮查询
pub const MAX_PER_PAGE: usize = 100;

/// 站内通知存储
///
/// Plain CRUD against the `system_notification` table. No uniqueness
/// constraint backs the "one unread like-notification per (user, post)"
/// assumption; removal approximates it with the four-field filter below.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn create_notification(
        &self,
        user_id: &str,
        notification_type: NotificationType,
        event: NotificationEvent,
        message: String,
        payload: Value,
    ) -> Result<SystemNotification> {
        debug!("Creating {:?} notification for user: {}", event, user_id);

        let now = Utc::now();
        let notification = SystemNotification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            type_id: notification_type.id(),
            event_id: event.id(),
            message,
            payload,
            is_read: false,
            created_at: now,
            updated_at: now,
        };

        let created = self.db.create("system_notification", notification).await?;
        Ok(created)
    }

    /// 删除指定帖子下未读的该事件通知
    ///
    /// Scoped strictly by (owner, event, payload.post_id, unread); rows that
    /// are already read, or belong to another post or event, are untouched.
    pub async fn remove_unread(
        &self,
        user_id: &str,
        event: NotificationEvent,
        post_id: &str,
    ) -> Result<()> {
        let query = r#"
            DELETE system_notification
            WHERE user_id = $user_id
            AND event_id = $event_id
            AND payload.post_id = $post_id
            AND is_read = false
        "#;

        self.db
            .query_with_params(query, json!({
                "user_id": user_id,
                "event_id": event.id(),
                "post_id": post_id,
            }))
            .await?;

        Ok(())
    }

    /// 批量标记已读，只作用于本人的通知；他人的ID被静默忽略
    pub async fn mark_read(&self, user_id: &str, ids: &[String]) -> Result<()> {
        let query = r#"
            UPDATE system_notification
            SET is_read = true, updated_at = $now
            WHERE user_id = $user_id
            AND meta::id(id) IN $ids
            RETURN NONE
        "#;

        self.db
            .query_with_params(query, json!({
                "user_id": user_id,
                "ids": ids,
                "now": Utc::now(),
            }))
            .await?;

        Ok(())
    }

    /// 全部标记已读，可重复调用
    pub async fn mark_all_read(&self, user_id: &str) -> Result<()> {
        let query = r#"
            UPDATE system_notification
            SET is_read = true, updated_at = $now
            WHERE user_id = $user_id
            AND is_read = false
            RETURN NONE
        "#;

        self.db
            .query_with_params(query, json!({
                "user_id": user_id,
                "now": Utc::now(),
            }))
            .await?;

        Ok(())
    }

    pub async fn list_notifications(
        &self,
        user_id: &str,
        query: &NotificationQuery,
    ) -> Result<Paginated<SystemNotification>> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query
            .per_page
            .unwrap_or(self.db.config.default_notifications_per_page)
            .clamp(1, MAX_PER_PAGE);
        let start = (page - 1).saturating_mul(per_page);

        let mut conditions = vec!["user_id = $user_id".to_string()];
        if query.type_id.is_some() {
            conditions.push("type_id = $type_id".to_string());
        }
        if query.event_id.is_some() {
            conditions.push("event_id = $event_id".to_string());
        }
        if query.is_read.is_some() {
            conditions.push("is_read = $is_read".to_string());
        }
        let where_clause = conditions.join(" AND ");

        let params = json!({
            "user_id": user_id,
            "type_id": query.type_id,
            "event_id": query.event_id,
            "is_read": query.is_read,
        });

        let select = format!(
            "SELECT *, meta::id(id) AS id FROM system_notification \
             WHERE {} ORDER BY created_at DESC LIMIT {} START {}",
            where_clause, per_page, start
        );
        let mut response = self.db.query_with_params(&select, &params).await?;
        let notifications: Vec<SystemNotification> = response.take(0)?;

        let count = format!(
            "SELECT count() AS total FROM system_notification WHERE {} GROUP ALL",
            where_clause
        );
        let mut response = self.db.query_with_params(&count, &params).await?;
        let totals: Vec<Value> = response.take(0)?;
        let total = totals
            .first()
            .and_then(|row| row["total"].as_u64())
            .unwrap_or(0) as usize;

        Ok(Paginated::new(notifications, total, page, per_page))
    }
}
