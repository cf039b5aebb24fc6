use axum::body::Bytes;
use serde::Serialize;

/// 响应图片的媒体类型
pub const OUTPUT_MEDIA_TYPE: &str = "image/png";
/// 响应建议文件名
pub const OUTPUT_FILENAME: &str = "swapped.png";

/// `POST /swap` 的 multipart 表单（仅用于 OpenAPI 文档）
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SwapForm {
    /// 源人脸图片
    #[schema(value_type = String, format = Binary)]
    pub source: Vec<u8>,
    /// 目标图片
    #[schema(value_type = String, format = Binary)]
    pub target: Vec<u8>,
}

/// 解析后的上传内容
#[derive(Debug, Default)]
pub struct SwapUpload {
    pub source: Option<Bytes>,
    pub target: Option<Bytes>,
}
