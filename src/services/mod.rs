pub mod database;
pub mod email;
pub mod dispatcher;
pub mod notification;
pub mod auth;
pub mod user;
pub mod post;
pub mod post_like;
pub mod comment;
pub mod subscription;

// 重新导出常用类型
pub use database::Database;
pub use email::EmailSender;
pub use dispatcher::{NotificationAction, NotificationHandler};
pub use notification::NotificationService;
pub use auth::AuthService;
pub use user::UserService;
pub use post::PostService;
pub use post_like::PostLikeService;
pub use comment::CommentService;
pub use subscription::SubscriptionService;
