use axum::{
    Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, header},
    response::Response,
    routing::post,
};

use crate::{error::AppError, state::AppState};

use super::models::{OUTPUT_FILENAME, OUTPUT_MEDIA_TYPE, SwapForm, SwapUpload};

pub fn create_swap_router(max_upload_bytes: usize) -> Router<AppState> {
    // axum 默认 2MiB 的请求体上限对图片上传过小；0 表示不限制
    let limit = if max_upload_bytes == 0 {
        DefaultBodyLimit::disable()
    } else {
        DefaultBodyLimit::max(max_upload_bytes)
    };
    Router::<AppState>::new().route("/swap", post(post_swap).layer(limit))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// 读取 `source` / `target` 两个文件字段；其余字段忽略，媒体类型只记录不校验。
async fn read_upload(multipart: &mut Multipart) -> Result<(Bytes, Bytes), AppError> {
    let mut upload = SwapUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        let slot = match name.as_str() {
            "source" => &mut upload.source,
            "target" => &mut upload.target,
            _ => {
                tracing::debug!(field = %name, "忽略未知表单字段");
                continue;
            }
        };
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        tracing::debug!(
            field = %name,
            file_name = ?file_name,
            content_type = ?content_type,
            bytes = data.len(),
            "已接收上传文件"
        );
        *slot = Some(data);
    }

    match (upload.source, upload.target) {
        (Some(source), Some(target)) => Ok((source, target)),
        (None, _) => Err(AppError::Validation("缺少表单字段 source".to_string())),
        (_, None) => Err(AppError::Validation("缺少表单字段 target".to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/swap",
    summary = "人脸替换",
    description = "上传源人脸与目标图片，调用外部 FaceFusion 工具完成换脸并返回结果图片（PNG）。",
    request_body(content = SwapForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "换脸结果图片（image/png）"),
        (status = 400, description = "请求体不是合法的 multipart/form-data", body = AppError),
        (status = 422, description = "缺少 source 或 target 字段", body = AppError),
        (status = 500, description = "外部工具失败 / 未生成输出 / 处理异常", body = AppError)
    ),
    tag = "Swap"
)]
pub async fn post_swap(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (source, target) = read_upload(&mut multipart).await?;

    let artifact = state.swap.swap(&source, &target).await?;
    let len = artifact.len();
    let body = artifact.into_body().await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, OUTPUT_MEDIA_TYPE)
        .header(header::CONTENT_LENGTH, len)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{OUTPUT_FILENAME}\""),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("构建响应失败: {e}")))
}
