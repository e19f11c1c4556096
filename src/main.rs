use std::sync::Arc;
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, Router},
};
use tokio::time::{interval, Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_blog::{
    config::Config,
    routes,
    state::AppState,
    utils,
    services::{
        AuthService,
        CommentService,
        Database,
        EmailSender,
        NotificationHandler,
        NotificationService,
        PostLikeService,
        PostService,
        SubscriptionService,
        UserService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "pulse_blog=debug,tower_http=debug".into())
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pulse-Blog service...");

    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化数据库连接
    let db = Arc::new(Database::new(&config).await?);
    db.verify_connection().await?;
    info!("Database connection established successfully");

    // 初始化通知分发（邮件 + 站内通知）
    let email_sender = EmailSender::new(&config)?;
    let notification_service = NotificationService::new(db.clone()).await?;
    let notification_handler =
        NotificationHandler::new(notification_service.clone(), email_sender);

    // 初始化所有服务
    let auth_service = AuthService::new(db.clone(), &config, notification_handler.clone()).await?;
    let user_service = UserService::new(db.clone()).await?;
    let post_service = PostService::new(db.clone(), notification_handler.clone()).await?;
    let post_like_service = PostLikeService::new(db.clone(), notification_handler.clone()).await?;
    let comment_service = CommentService::new(db.clone(), notification_handler.clone()).await?;
    let subscription_service = SubscriptionService::new(
        db.clone(),
        user_service.clone(),
        notification_handler.clone(),
    )
    .await?;

    // 创建应用状态
    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: (*db).clone(),
        auth_service,
        user_service,
        post_service,
        post_like_service,
        comment_service,
        subscription_service,
        notification_service,
        notification_handler,
    });

    // 启动后台任务
    start_background_tasks(app_state.clone()).await;

    // 配置 CORS
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(
            config.cors_allowed_origins
                .split(',')
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        );

    // 构建应用路由
    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/blog/auth", routes::auth::router())
        .nest("/api/blog/users", routes::users::router())
        .nest("/api/blog/posts", routes::posts::router())
        .nest("/api/blog/comments", routes::comments::router())
        .nest("/api/blog/subscriptions", routes::subscriptions::router())
        .nest("/api/blog/notifications", routes::notifications::router())
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            utils::middleware::auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            utils::middleware::rate_limit_middleware,
        ))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "Pulse-Blog is running!"
}

async fn start_background_tasks(app_state: Arc<AppState>) {
    info!("Starting background tasks...");

    // 清理过期确认/重置令牌任务
    let auth_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(3600)); // 每小时执行一次

        loop {
            interval.tick().await;
            if let Err(e) = auth_state.auth_service.cleanup_expired_tokens().await {
                error!("Failed to cleanup expired tokens: {}", e);
            }
        }
    });

    info!("Background tasks started successfully");
}
