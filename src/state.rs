use crate::{
    config::Config,
    services::{
        auth::AuthService,
        comment::CommentService,
        database::Database,
        dispatcher::NotificationHandler,
        notification::NotificationService,
        post::PostService,
        post_like::PostLikeService,
        subscription::SubscriptionService,
        user::UserService,
    },
};

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Database,

    /// 认证服务
    pub auth_service: AuthService,

    /// 用户服务
    pub user_service: UserService,

    /// 帖子服务
    pub post_service: PostService,

    /// 点赞服务
    pub post_like_service: PostLikeService,

    /// 评论服务
    pub comment_service: CommentService,

    /// 订阅服务
    pub subscription_service: SubscriptionService,

    /// 通知存储服务
    pub notification_service: NotificationService,

    /// 通知分发入口
    pub notification_handler: NotificationHandler,
}

impl AppState {
    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.config.is_development()
    }
}
