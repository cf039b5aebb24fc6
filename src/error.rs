use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 请求体无法解析（非 multipart 或格式损坏）
    #[error("请求格式错误: {0}")]
    BadRequest(String),

    /// 参数校验错误
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 请求体超过配置的上限
    #[error("请求体过大: {0}")]
    PayloadTooLarge(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// 换脸流程错误（detail 直接透传给调用方）
    #[error(transparent)]
    Swap(#[from] SwapError),
}

/// 换脸流程错误类型
///
/// 三类错误对调用方一律表现为 500，仅 `code` 字段不同。
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum SwapError {
    /// 外部工具以非零状态退出
    #[error("FaceFusion failed: {stderr}")]
    ExternalTool {
        /// 退出码（被信号终止时为空）
        exit_code: Option<i32>,
        /// 捕获的标准错误输出
        stderr: String,
    },

    /// 外部工具退出成功但未生成输出文件
    #[error("FaceFusion did not generate an output file")]
    OutputMissing,

    /// 暂存、调用或复制过程中的其它错误
    #[error("Error processing request: {0}")]
    Processing(String),
}

impl From<std::io::Error> for SwapError {
    fn from(err: std::io::Error) -> Self {
        SwapError::Processing(err.to_string())
    }
}

/// RFC7807 风格的错误响应（Problem Details）。
///
/// `detail` 为人类可读的错误信息；换脸错误时与外部工具的诊断输出保持一致。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Internal Server Error")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 500)]
    pub status: u16,

    /// 人类可读的详细信息。
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "FaceFusion did not generate an output file")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "FACESWAP_OUTPUT_MISSING")]
    pub code: String,

    /// 请求追踪 ID（由 request-id 中间件注入）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Swap(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Swap(e) => match e {
                SwapError::ExternalTool { .. } => "FACESWAP_TOOL_FAILED",
                SwapError::OutputMissing => "FACESWAP_OUTPUT_MISSING",
                SwapError::Processing(_) => "FACESWAP_PROCESSING_FAILED",
            },
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNPROCESSABLE_ENTITY => "Validation Failed",
            StatusCode::PAYLOAD_TOO_LARGE => "Payload Too Large",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.to_string()),
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}
