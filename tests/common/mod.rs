#![allow(dead_code)]

use std::path::Path;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use tempfile::TempDir;

use faceswap_backend::{AppConfig, AppState, build_router, config::FaceSwapConfig};

pub const BOUNDARY: &str = "----faceswap-test-boundary-7MA4YWxkTrZu0gW";

/// 模拟外部工具：输出 = source 字节 + target 字节
pub const CONCAT_TOOL: &str = r#"
while [ "$#" -gt 0 ]; do
  case "$1" in
    --source) src="$2"; shift 2 ;;
    --target) tgt="$2"; shift 2 ;;
    --output) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
cat "$src" "$tgt" > "$out"
"#;

/// 每个测试独立的工作区与产物目录
pub struct TestDirs {
    pub scratch: TempDir,
    pub artifacts: TempDir,
}

impl TestDirs {
    pub fn new() -> Self {
        Self {
            scratch: tempfile::tempdir().expect("scratch dir"),
            artifacts: tempfile::tempdir().expect("artifact dir"),
        }
    }

    pub fn scratch_entries(&self) -> usize {
        dir_entries(self.scratch.path())
    }

    pub fn artifact_entries(&self) -> usize {
        dir_entries(self.artifacts.path())
    }
}

pub fn dir_entries(path: &Path) -> usize {
    std::fs::read_dir(path).expect("read dir").count()
}

/// 以 `sh -c <script>` 充当外部工具的配置（$0 = facefusion，$1.. 为固定参数）
pub fn script_config(script: &str, dirs: &TestDirs) -> AppConfig {
    tool_config(
        "sh",
        vec!["-c".to_string(), script.to_string(), "facefusion".to_string()],
        dirs,
    )
}

pub fn tool_config(binary: &str, leading_args: Vec<String>, dirs: &TestDirs) -> AppConfig {
    AppConfig {
        faceswap: FaceSwapConfig {
            binary: binary.to_string(),
            leading_args,
            scratch_dir: Some(dirs.scratch.path().to_string_lossy().into_owned()),
            artifact_dir: Some(dirs.artifacts.path().to_string_lossy().into_owned()),
            ..FaceSwapConfig::default()
        },
        ..AppConfig::default()
    }
}

pub fn build_app(config: &AppConfig) -> Router {
    build_router(AppState::from_config(&config.faceswap), config)
}

pub fn multipart_body(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, data) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{name}.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn swap_request(parts: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/swap")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("build swap request")
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(resp).await;
    serde_json::from_slice(&bytes).expect("parse json")
}
