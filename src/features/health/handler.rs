use axum::{Router, http::StatusCode, response::Json, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// 根路径存活响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RootResponse {
    #[schema(example = "FaceFusion API is running")]
    pub message: String,
}

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    #[schema(example = "healthy")]
    pub status: String,
}

pub fn create_health_router() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

#[utoipa::path(
    get,
    path = "/",
    summary = "存活探测",
    description = "固定返回服务运行中的提示信息。",
    responses((status = 200, description = "服务运行中", body = RootResponse)),
    tag = "Health"
)]
pub async fn root() -> (StatusCode, Json<RootResponse>) {
    (
        StatusCode::OK,
        Json(RootResponse {
            message: "FaceFusion API is running".to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "用于探活的健康检查端点，固定返回 healthy。",
    responses((status = 200, description = "服务健康", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
        }),
    )
}
