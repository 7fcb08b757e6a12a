//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 订单接口（下单、查询、支付、取消、支付回调）
//! - [`stock`] - 库存接口（查询、管理员调整）
//!
//! 认证由上游网关完成；本服务只信任 `x-user-id` 头中的用户标识并据此
//! 划分数据边界。

pub mod health;
pub mod orders;
pub mod stock;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;
use crate::utils::AppError;

/// 当前请求的用户标识（来自 `x-user-id` 头）
pub struct CurrentUser(pub i64);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| AppError::invalid("Missing or invalid x-user-id header"))?;
        Ok(CurrentUser(user_id))
    }
}

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(stock::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
