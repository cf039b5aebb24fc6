use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::SwapError;

const SOURCE_FILE: &str = "source.png";
const TARGET_FILE: &str = "target.png";
const OUTPUT_FILE: &str = "output.png";

/// 请求级暂存工作区。
///
/// 持有一个独占的临时目录，内含 source/target/output 三个固定槽位；
/// 值被 drop 时递归删除整个目录（成功与失败路径一致）。
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: Option<TempDir>,
    root: PathBuf,
}

impl ScratchWorkspace {
    /// 在 `parent`（缺省为系统临时目录）下创建新的工作区目录。
    pub async fn create(parent: Option<&Path>) -> Result<Self, SwapError> {
        let parent = parent.map(Path::to_path_buf);
        let dir = tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix("faceswap-");
            match parent {
                Some(p) => builder.tempdir_in(p),
                None => builder.tempdir(),
            }
        })
        .await
        .map_err(|e| SwapError::Processing(format!("创建工作区失败: {e}")))??;
        let root = dir.path().to_path_buf();
        tracing::debug!(workspace = %root.display(), "工作区已创建");
        Ok(Self {
            dir: Some(dir),
            root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn source_path(&self) -> PathBuf {
        self.root.join(SOURCE_FILE)
    }

    pub fn target_path(&self) -> PathBuf {
        self.root.join(TARGET_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(OUTPUT_FILE)
    }

    /// 写入 source 与 target 两份上传内容（原样落盘，不做格式校验）。
    pub async fn stage(&self, source: &[u8], target: &[u8]) -> Result<(), SwapError> {
        tokio::fs::write(self.source_path(), source).await?;
        tokio::fs::write(self.target_path(), target).await?;
        Ok(())
    }

    /// 输出文件是否存在（外部工具成功的唯一判据）。
    pub async fn has_output(&self) -> bool {
        tokio::fs::try_exists(self.output_path())
            .await
            .unwrap_or(false)
    }

    /// 在阻塞线程池中递归删除工作区；正常路径走这里，`Drop` 只兜底取消与 panic。
    pub async fn close(mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let root = self.root.clone();
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => tracing::debug!(workspace = %root.display(), "工作区已清理"),
            Ok(Err(e)) => tracing::warn!(workspace = %root.display(), "工作区清理失败: {}", e),
            Err(e) => tracing::warn!(workspace = %root.display(), "工作区清理任务异常: {}", e),
        }
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => tracing::debug!(workspace = %self.root.display(), "工作区已清理"),
            Err(e) => tracing::warn!(
                workspace = %self.root.display(),
                "工作区清理失败: {}",
                e
            ),
        }
    }
}
