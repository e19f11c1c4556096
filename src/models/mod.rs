pub mod user;
pub mod post;
pub mod comment;
pub mod subscription;
pub mod notification;
pub mod response;
