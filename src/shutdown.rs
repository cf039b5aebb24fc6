//! 优雅退出管理模块
//!
//! 监听 SIGINT/SIGTERM（Windows 下为 Ctrl+C），并把退出事件广播给 HTTP 服务与后台任务。

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, broadcast};
use tracing::{debug, info, warn};

/// 优雅退出管理器
#[derive(Debug, Clone)]
pub struct ShutdownManager {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug)]
struct ShutdownInner {
    notify: Notify,
    reason_tx: broadcast::Sender<ShutdownReason>,
    /// 首次触发的退出原因（先触发后等待时直接返回）
    reason: Mutex<Option<ShutdownReason>>,
    shutting_down: AtomicBool,
}

/// 退出原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
    /// 应用请求退出
    Application,
}

/// 优雅退出错误类型
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("信号设置失败: {0}")]
    SignalSetup(String),
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (reason_tx, _) = broadcast::channel(4);
        Self {
            inner: Arc::new(ShutdownInner {
                notify: Notify::new(),
                reason_tx,
                reason: Mutex::new(None),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    fn recorded_reason(&self) -> ShutdownReason {
        self.inner
            .reason
            .lock()
            .ok()
            .and_then(|g| g.clone())
            .unwrap_or(ShutdownReason::Application)
    }

    /// 等待退出信号，返回退出原因
    pub async fn wait_for_shutdown(&self) -> ShutdownReason {
        // 先注册等待再检查标志，避免错过 notify_waiters
        let notified = self.inner.notify.notified();
        if self.is_shutting_down() {
            return self.recorded_reason();
        }
        debug!("等待退出信号...");
        notified.await;
        self.recorded_reason()
    }

    /// 触发优雅退出；重复触发只有第一次生效
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        if self
            .inner
            .shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("重复的退出信号被忽略: {:?}", reason);
            return;
        }

        info!("触发优雅退出: {:?}", reason);
        if let Ok(mut guard) = self.inner.reason.lock() {
            *guard = Some(reason.clone());
        }
        if self.inner.reason_tx.send(reason).is_err() {
            debug!("当前没有退出事件订阅者");
        }
        self.inner.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    /// 订阅退出事件
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.inner.reason_tx.subscribe()
    }

    /// 启动信号处理任务
    pub async fn start_signal_handler(&self) -> Result<(), ShutdownError> {
        let manager = self.clone();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigint = signal(SignalKind::interrupt())
                .map_err(|e| ShutdownError::SignalSetup(e.to_string()))?;
            let mut sigterm = signal(SignalKind::terminate())
                .map_err(|e| ShutdownError::SignalSetup(e.to_string()))?;

            tokio::spawn(async move {
                let reason = tokio::select! {
                    _ = sigint.recv() => ShutdownReason::Interrupt,
                    _ = sigterm.recv() => ShutdownReason::Terminate,
                };
                info!("接收到退出信号: {:?}", reason);
                manager.trigger_shutdown(reason);
            });
        }

        #[cfg(not(unix))]
        {
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("监听Ctrl+C信号失败: {}", e);
                    return;
                }
                info!("接收到Ctrl+C信号");
                manager.trigger_shutdown(ShutdownReason::Interrupt);
            });
        }

        info!("信号处理器已启动");
        Ok(())
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 优雅退出句柄，供后台任务感知退出事件
#[derive(Debug)]
pub struct ShutdownHandle {
    reason_rx: broadcast::Receiver<ShutdownReason>,
    manager: ShutdownManager,
}

impl ShutdownHandle {
    pub fn new(manager: &ShutdownManager) -> Self {
        Self {
            reason_rx: manager.subscribe(),
            manager: manager.clone(),
        }
    }

    /// 等待退出事件；通道关闭时返回 None
    pub async fn wait(&mut self) -> Option<ShutdownReason> {
        if self.manager.is_shutting_down() {
            return Some(self.manager.recorded_reason());
        }
        match self.reason_rx.recv().await {
            Ok(reason) => Some(reason),
            Err(e) => {
                warn!("退出事件接收失败: {}", e);
                None
            }
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.manager.is_shutting_down()
    }
}

impl Clone for ShutdownHandle {
    fn clone(&self) -> Self {
        Self::new(&self.manager)
    }
}
