pub mod auth;
pub mod users;
pub mod posts;
pub mod comments;
pub mod subscriptions;
pub mod notifications;
