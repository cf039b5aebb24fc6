use crate::config::AppConfig;
use crate::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};

/// 执行启动检查
///
/// 1. 确保工作区与响应产物目录存在（配置了自定义目录时）
/// 2. 检查外部换脸工具是否可定位（仅告警，不阻断启动）
pub async fn run_startup_checks(config: &AppConfig) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    let swap = &config.faceswap;
    if let Some(dir) = swap.scratch_path() {
        ensure_dir("scratch_dir", &dir)?;
    }
    if let Some(dir) = swap.artifact_path() {
        ensure_dir("artifact_dir", &dir)?;
    }

    match locate_binary(&swap.binary) {
        Some(path) => tracing::info!("✅ 外部换脸工具: {:?}", path),
        None => tracing::warn!(
            "⚠️ 未找到外部换脸工具 {:?}，/swap 请求将返回处理失败",
            swap.binary
        ),
    }

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

/// 确保目录存在
fn ensure_dir(label: &str, dir: &Path) -> Result<(), AppError> {
    if dir.is_dir() {
        tracing::info!("✅ {} 已存在: {:?}", label, dir);
        return Ok(());
    }
    tracing::warn!("📁 未找到 {}，正在创建: {:?}", label, dir);
    fs::create_dir_all(dir)
        .map_err(|e| AppError::Internal(format!("创建 {label} 失败: {e}")))?;
    Ok(())
}

/// 按 PATH 规则定位可执行文件；含路径分隔符时直接检查该路径。
fn locate_binary(binary: &str) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::{ensure_dir, locate_binary};

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let root = tempfile::tempdir().expect("tempdir");
        let nested = root.path().join("a").join("b");
        ensure_dir("scratch_dir", &nested).expect("create dir");
        assert!(nested.is_dir());
        // 已存在时再次调用同样成功
        ensure_dir("scratch_dir", &nested).expect("existing dir");
    }

    #[test]
    fn locate_binary_handles_explicit_paths() {
        let root = tempfile::tempdir().expect("tempdir");
        let tool = root.path().join("facefusion");
        std::fs::write(&tool, b"#!/bin/sh\n").expect("write tool");

        assert_eq!(locate_binary(tool.to_str().expect("utf8")), Some(tool.clone()));
        let missing = root.path().join("missing");
        assert!(locate_binary(missing.to_str().expect("utf8")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn locate_binary_searches_path() {
        assert!(locate_binary("sh").is_some());
        assert!(locate_binary("definitely-not-a-facefusion-binary").is_none());
    }
}
