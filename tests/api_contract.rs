use axum::{
    http::{StatusCode, header},
    response::IntoResponse,
};

use faceswap_backend::{AppError, SwapError};

async fn problem_of(err: AppError) -> (StatusCode, String, serde_json::Value) {
    let resp = err.into_response();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .expect("missing Content-Type")
        .to_str()
        .expect("invalid Content-Type")
        .to_string();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    (status, content_type, v)
}

/// 全局错误为 RFC7807 ProblemDetails（application/problem+json）。
#[tokio::test]
async fn validation_error_is_problem_details() {
    let (status, content_type, v) =
        problem_of(AppError::Validation("缺少表单字段 source".to_string())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(content_type, "application/problem+json");
    assert_eq!(v["status"], 422);
    assert_eq!(v["code"], "VALIDATION_FAILED");
    assert!(v.get("type").is_some());
    assert!(v.get("title").is_some());
    assert!(v.get("detail").is_some());
}

/// 外部工具失败时 detail 原样携带其标准错误输出。
#[tokio::test]
async fn tool_failure_detail_carries_stderr() {
    let err = AppError::from(SwapError::ExternalTool {
        exit_code: Some(1),
        stderr: "model not found".to_string(),
    });
    let (status, _, v) = problem_of(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["status"], 500);
    assert_eq!(v["detail"], "FaceFusion failed: model not found");
    assert!(v.get("requestId").is_none());
}

#[tokio::test]
async fn output_missing_and_processing_details() {
    let (_, _, missing) = problem_of(SwapError::OutputMissing.into()).await;
    assert_eq!(missing["detail"], "FaceFusion did not generate an output file");

    let (_, _, processing) =
        problem_of(SwapError::Processing("No space left on device".into()).into()).await;
    assert_eq!(
        processing["detail"],
        "Error processing request: No space left on device"
    );
}
