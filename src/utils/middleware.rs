use crate::{error::AppError, services::auth::AuthUser, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

type KeyedRateLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;
static RATE_LIMITER: OnceCell<KeyedRateLimiter> = OnceCell::const_new();

/// 认证中间件
///
/// Verifies the bearer token and loads the user into request extensions.
/// Requests without a valid token continue as unauthenticated; handlers
/// decide whether that is acceptable.
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    if let Some(auth_header) = headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                match app_state.auth_service.verify_jwt(token) {
                    Ok(claims) => match app_state.auth_service.find_by_id(&claims.sub).await {
                        Ok(Some(user)) if user.is_active => {
                            debug!("Authenticated user: {} ({})", user.id, user.email);
                            request.extensions_mut().insert(AuthUser {
                                id: user.id,
                                username: user.username,
                                email: user.email,
                            });
                        }
                        Ok(_) => {
                            debug!("Token subject missing or inactive: {}", claims.sub);
                        }
                        Err(e) => {
                            warn!("Failed to load user for token subject: {}", e);
                        }
                    },
                    Err(e) => {
                        // 无效令牌按未认证请求继续
                        debug!("JWT verification failed: {}", e);
                    }
                }
            }
        }
    }

    Ok(next.run(request).await)
}

/// 速率限制中间件
pub async fn rate_limit_middleware(
    State(app_state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    let rate_limiter = RATE_LIMITER
        .get_or_init(|| async {
            let quota =
                Quota::per_minute(NonZeroU32::new(app_state.config.rate_limit_requests).unwrap())
                    .allow_burst(NonZeroU32::new(10).unwrap());
            RateLimiter::dashmap(quota)
        })
        .await;

    let client_ip = get_client_ip(&request);

    match rate_limiter.check_key(&client_ip) {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            warn!("Rate limit exceeded for IP: {}", client_ip);
            Err(AppError::RateLimitExceeded)
        }
    }
}

/// 获取客户端 IP 地址
fn get_client_ip(request: &Request<Body>) -> String {
    let headers = request.headers();

    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(ip_str) = forwarded_for.to_str() {
            if let Some(ip) = ip_str.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.to_string();
        }
    }

    request
        .extensions()
        .get::<std::net::SocketAddr>()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 可选认证提取器
pub struct OptionalAuth(pub Option<AuthUser>);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<AuthUser>().cloned();
        Ok(OptionalAuth(user))
    }
}
