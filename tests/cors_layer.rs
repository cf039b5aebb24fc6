mod common;

use axum::{
    body::Body,
    http::{Request, header},
};
use tower::ServiceExt;

use faceswap_backend::config::CorsConfig;
use common::{TestDirs, build_app, script_config};

fn cors_app(cors: CorsConfig, dirs: &TestDirs) -> axum::Router {
    let mut config = script_config("exit 0", dirs);
    config.cors = cors;
    build_app(&config)
}

#[tokio::test]
async fn cors_layer_adds_allow_origin_header() {
    let dirs = TestDirs::new();
    let app = cors_app(
        CorsConfig {
            enabled: true,
            allowed_origins: vec!["https://example.com".to_string()],
            ..CorsConfig::default()
        },
        &dirs,
    );

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    let allow_origin = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .expect("missing allow origin")
        .to_str()
        .expect("invalid allow origin");
    assert_eq!(allow_origin, "https://example.com");
}

#[tokio::test]
async fn swap_preflight_allows_post_by_default() {
    let dirs = TestDirs::new();
    let app = cors_app(
        CorsConfig {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            ..CorsConfig::default()
        },
        &dirs,
    );

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/swap")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    let allow_methods = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .expect("missing allow methods")
        .to_str()
        .expect("invalid allow methods");
    assert!(allow_methods.contains("POST"));
}

#[tokio::test]
async fn disabled_cors_adds_no_headers() {
    let dirs = TestDirs::new();
    let app = cors_app(CorsConfig::default(), &dirs);

    let req = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");
    assert!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
