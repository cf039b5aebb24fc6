use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::root,
        crate::features::health::handler::health_check,
        crate::features::swap::handler::post_swap,
    ),
    components(schemas(
        crate::error::ProblemDetails,
        crate::features::swap::SwapForm,
    )),
    tags(
        (name = "Swap", description = "人脸替换：上传源人脸与目标图片，由外部 FaceFusion 工具生成结果。"),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "FaceFusion API",
        version = env!("CARGO_PKG_VERSION"),
        description = "外部换脸工具的 HTTP 门面（Axum + utoipa）。错误统一为 application/problem+json。"
    )
)]
pub struct ApiDoc;
