use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use futures_util::Stream;
use tempfile::TempPath;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::error::SwapError;

/// 响应产物：输出图片在工作区之外的独立副本。
///
/// 工作区销毁后仍然存在，直到响应体被完整发送（或连接中断）后才删除。
#[derive(Debug)]
pub struct ResponseArtifact {
    path: TempPath,
    len: u64,
}

impl ResponseArtifact {
    /// 将 `output` 复制到 `dir`（缺省为系统临时目录）下新建的临时文件。
    pub async fn copy_from(output: &Path, dir: Option<&Path>) -> Result<Self, SwapError> {
        let dir = dir.map(Path::to_path_buf);
        // tempfile 的创建是同步系统调用，放到阻塞线程池执行
        let path = tokio::task::spawn_blocking(move || -> io::Result<TempPath> {
            let mut builder = tempfile::Builder::new();
            builder.prefix("swapped-").suffix(".png");
            let file = match dir {
                Some(d) => builder.tempfile_in(d)?,
                None => builder.tempfile()?,
            };
            Ok(file.into_temp_path())
        })
        .await
        .map_err(|e| SwapError::Processing(format!("创建响应产物失败: {e}")))??;
        let len = tokio::fs::copy(output, &path).await?;
        tracing::debug!(artifact = %path.display(), bytes = len, "响应产物已生成");
        Ok(Self { path, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    /// 打开产物并转换为流式响应体；临时文件的所有权随流转移，流被 drop 时删除文件。
    pub async fn into_body(self) -> Result<Body, SwapError> {
        let file = File::open(&self.path).await?;
        let stream = ArtifactStream {
            inner: ReaderStream::new(file),
            path: Some(self.path),
        };
        Ok(Body::from_stream(stream))
    }
}

/// 读取产物文件的字节流，持有临时路径直至自身被 drop。
struct ArtifactStream {
    inner: ReaderStream<File>,
    path: Option<TempPath>,
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl Drop for ArtifactStream {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let shown = path.display().to_string();
        // 单个文件的 unlink，直接在当前线程完成
        match path.close() {
            Ok(()) => tracing::debug!(artifact = %shown, "响应产物已删除"),
            Err(e) => tracing::warn!(artifact = %shown, "响应产物删除失败: {}", e),
        }
    }
}
