use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::config::FaceSwapConfig;
use crate::error::{AppError, SwapError};

use super::artifact::ResponseArtifact;
use super::runner::FaceFusionRunner;
use super::workspace::ScratchWorkspace;

/// 换脸服务：暂存 → 调用 → 校验 → 产出 的线性流水线。
#[derive(Debug, Clone)]
pub struct SwapService {
    runner: FaceFusionRunner,
    scratch_dir: Option<PathBuf>,
    artifact_dir: Option<PathBuf>,
    /// 外部工具并发许可（未配置上限时为空）
    permits: Option<Arc<Semaphore>>,
    in_flight: Arc<AtomicUsize>,
}

/// 进行中任务计数守卫
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SwapService {
    pub fn new(cfg: &FaceSwapConfig) -> Self {
        Self {
            runner: FaceFusionRunner::from_config(cfg),
            scratch_dir: cfg.scratch_path(),
            artifact_dir: cfg.artifact_path(),
            permits: (cfg.max_concurrent > 0)
                .then(|| Arc::new(Semaphore::new(cfg.max_concurrent))),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn runner(&self) -> &FaceFusionRunner {
        &self.runner
    }

    /// 当前进行中（含等待并发许可）的换脸任务数
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 执行一次换脸。
    ///
    /// 工作区在本函数返回前（无论成功失败）即被删除，请求被取消时由 `Drop` 兜底；返回的产物独立于工作区存在。
    pub async fn swap(&self, source: &[u8], target: &[u8]) -> Result<ResponseArtifact, AppError> {
        let _in_flight = InFlightGuard::enter(&self.in_flight);
        let _permit = match &self.permits {
            Some(sem) => Some(
                sem.clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(format!("并发许可获取失败: {e}")))?,
            ),
            None => None,
        };

        let started = Instant::now();
        let workspace = ScratchWorkspace::create(self.scratch_dir.as_deref()).await?;
        let result = self.run_pipeline(&workspace, source, target).await;
        workspace.close().await;
        match &result {
            Ok(artifact) => tracing::info!(
                bytes = artifact.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "换脸完成"
            ),
            Err(e) => tracing::warn!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "换脸失败: {}",
                e
            ),
        }
        Ok(result?)
    }

    async fn run_pipeline(
        &self,
        workspace: &ScratchWorkspace,
        source: &[u8],
        target: &[u8],
    ) -> Result<ResponseArtifact, SwapError> {
        workspace.stage(source, target).await?;

        let output = self.runner.run(workspace).await?;
        if !output.status.success() {
            tracing::debug!(stderr = %output.stderr, "外部换脸工具标准错误输出");
        }
        output.into_result()?;

        if !workspace.has_output().await {
            return Err(SwapError::OutputMissing);
        }

        ResponseArtifact::copy_from(&workspace.output_path(), self.artifact_dir.as_deref()).await
    }
}
