use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub confirm_token_expiry_hours: i64,
    pub reset_token_expiry_hours: i64,

    // Email configuration
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_from_name: String,
    pub smtp_from_email: String,
    pub smtp_use_tls: bool,

    // Frontend URLs
    pub public_host: String,

    // Content settings
    pub max_post_length: usize,
    pub max_comment_length: usize,
    pub default_posts_per_page: usize,
    pub default_notifications_per_page: usize,

    // Rate limiting
    pub rate_limit_requests: u32,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "pulse".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "blog".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-me".to_string()),
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()?,
            confirm_token_expiry_hours: env::var("CONFIRM_TOKEN_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()?,
            reset_token_expiry_hours: env::var("RESET_TOKEN_EXPIRY_HOURS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,

            smtp_host: env::var("SMTP_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()?,
            smtp_username: env::var("SMTP_USERNAME")
                .unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD")
                .unwrap_or_default(),
            smtp_from_name: env::var("SMTP_FROM_NAME")
                .unwrap_or_else(|_| "Pulse Blog".to_string()),
            smtp_from_email: env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@pulse-blog.com".to_string()),
            smtp_use_tls: env::var("SMTP_USE_TLS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()?,

            public_host: env::var("PUBLIC_HOST")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),

            max_post_length: env::var("MAX_POST_LENGTH")
                .unwrap_or_else(|_| "500".to_string())
                .parse()?,
            max_comment_length: env::var("MAX_COMMENT_LENGTH")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,
            default_posts_per_page: env::var("DEFAULT_POSTS_PER_PAGE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            default_notifications_per_page: env::var("DEFAULT_NOTIFICATIONS_PER_PAGE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    /// 测试用默认配置：内存数据库，本地SMTP
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            database_url: "mem://".to_string(),
            database_namespace: "pulse".to_string(),
            database_name: "blog".to_string(),
            database_username: String::new(),
            database_password: String::new(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 168,
            confirm_token_expiry_hours: 24,
            reset_token_expiry_hours: 2,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from_name: "Pulse Blog".to_string(),
            smtp_from_email: "noreply@pulse-blog.com".to_string(),
            smtp_use_tls: false,
            public_host: "http://localhost:3001".to_string(),
            max_post_length: 500,
            max_comment_length: 2000,
            default_posts_per_page: 20,
            default_notifications_per_page: 20,
            rate_limit_requests: 100,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_memory_database() {
        let config = Config::default();
        assert_eq!(config.database_url, "mem://");
        assert!(!config.is_production());
    }
}
