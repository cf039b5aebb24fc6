use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use tokio::process::Command;

use crate::config::FaceSwapConfig;
use crate::error::SwapError;

use super::workspace::ScratchWorkspace;

/// 非交互模式参数
const HEADLESS_FLAG: &str = "--headless";

/// 外部换脸工具调用器（每次调用派生一个子进程）。
#[derive(Debug, Clone)]
pub struct FaceFusionRunner {
    binary: String,
    leading_args: Vec<String>,
    extra_args: Vec<String>,
}

/// 子进程的退出状态与捕获输出
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl FaceFusionRunner {
    pub fn new(binary: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            leading_args: Vec::new(),
            extra_args,
        }
    }

    /// 设置置于固定参数之前的参数
    pub fn with_leading_args(mut self, leading_args: Vec<String>) -> Self {
        self.leading_args = leading_args;
        self
    }

    pub fn from_config(cfg: &FaceSwapConfig) -> Self {
        Self::new(cfg.binary.clone(), cfg.extra_args.clone())
            .with_leading_args(cfg.leading_args.clone())
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command(&self, ws: &ScratchWorkspace) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.leading_args)
            .arg("--source")
            .arg(ws.source_path())
            .arg("--target")
            .arg(ws.target_path())
            .arg("--output")
            .arg(ws.output_path())
            .arg(HEADLESS_FLAG)
            .args(&self.extra_args);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 请求被取消（客户端断开）时一并终止子进程，避免向已删除的工作区写入
            .kill_on_drop(true);
        cmd
    }

    /// 运行外部工具并等待其结束；stdout/stderr 并发读取，避免管道写满阻塞。
    ///
    /// 仅在进程无法启动或等待失败时返回错误，非零退出由调用方判断。
    pub async fn run(&self, ws: &ScratchWorkspace) -> Result<ToolOutput, SwapError> {
        let started = Instant::now();
        tracing::info!(
            binary = %self.binary,
            workspace = %ws.path().display(),
            "启动外部换脸工具"
        );

        let output = self.command(ws).output().await.map_err(|e| {
            tracing::error!(binary = %self.binary, "外部换脸工具启动失败: {}", e);
            SwapError::from(e)
        })?;

        let result = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::info!(
            exit_code = ?result.status.code(),
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "外部换脸工具已退出"
        );
        Ok(result)
    }
}

impl ToolOutput {
    /// 非零退出时转换为 [`SwapError::ExternalTool`]。
    pub fn into_result(self) -> Result<(), SwapError> {
        if self.status.success() {
            return Ok(());
        }
        Err(SwapError::ExternalTool {
            exit_code: self.status.code(),
            stderr: self.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::FaceFusionRunner;
    use crate::error::SwapError;
    use crate::features::swap::workspace::ScratchWorkspace;

    #[tokio::test]
    async fn passes_workspace_paths_and_headless_flag() {
        let ws = ScratchWorkspace::create(None).await.expect("workspace");
        // `echo` 原样回显参数，用于断言参数顺序
        let runner = FaceFusionRunner::new(
            "echo",
            vec!["--face-selector-mode".into(), "one".into()],
        );
        let out = runner.run(&ws).await.expect("run echo");
        assert!(out.status.success());

        let expected = format!(
            "--source {} --target {} --output {} --headless --face-selector-mode one",
            ws.source_path().display(),
            ws.target_path().display(),
            ws.output_path().display()
        );
        assert_eq!(out.stdout.trim_end(), expected);
    }

    #[tokio::test]
    async fn leading_args_precede_fixed_arguments() {
        let ws = ScratchWorkspace::create(None).await.expect("workspace");
        let runner = FaceFusionRunner::new("sh", Vec::new()).with_leading_args(vec![
            "-c".into(),
            r#"printf '%s|' "$0" "$1" "$7"; echo "stderr line" >&2"#.into(),
            "facefusion".into(),
        ]);
        let out = runner.run(&ws).await.expect("run sh");
        assert!(out.status.success());
        assert_eq!(out.stdout, "facefusion|--source|--headless|");
        assert_eq!(out.stderr.trim_end(), "stderr line");
    }

    #[tokio::test]
    async fn non_zero_exit_becomes_external_tool_error() {
        let ws = ScratchWorkspace::create(None).await.expect("workspace");
        let runner = FaceFusionRunner::new("false", Vec::new());
        let out = runner.run(&ws).await.expect("run false");
        match out.into_result() {
            Err(SwapError::ExternalTool { exit_code, .. }) => assert_eq!(exit_code, Some(1)),
            other => panic!("expected ExternalTool, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_processing_error() {
        let ws = ScratchWorkspace::create(None).await.expect("workspace");
        let runner = FaceFusionRunner::new("/nonexistent/facefusion-binary", Vec::new());
        let err = runner.run(&ws).await.expect_err("spawn must fail");
        assert!(matches!(err, SwapError::Processing(_)), "got {err:?}");
    }
}
