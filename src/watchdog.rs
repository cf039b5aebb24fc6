//! systemd 看门狗模块
//!
//! 在 systemd 下运行时上报 READY/STOPPING 状态并定期发送 WATCHDOG 心跳；其它环境下全部为空操作。

use crate::config::WatchdogConfig;
use crate::shutdown::{ShutdownHandle, ShutdownManager};
use tracing::{debug, info, warn};

type NotifyResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[cfg(target_os = "linux")]
mod systemd_impl {
    use super::NotifyResult;
    use sd_notify::{NotifyState, notify};

    fn send(state: NotifyState) -> NotifyResult {
        if std::env::var_os("NOTIFY_SOCKET").is_none() {
            tracing::debug!("不在systemd环境下运行，忽略通知");
            return Ok(());
        }
        notify(false, &[state])?;
        Ok(())
    }

    pub fn ready() -> NotifyResult {
        send(NotifyState::Ready)
    }

    pub fn stopping() -> NotifyResult {
        send(NotifyState::Stopping)
    }

    pub fn heartbeat() -> NotifyResult {
        send(NotifyState::Watchdog)
    }

    /// systemd 配置的看门狗超时（微秒），未启用时为 None
    pub fn timeout_us() -> Option<u64> {
        let mut usec: u64 = 0;
        sd_notify::watchdog_enabled(false, &mut usec).then_some(usec)
    }
}

#[cfg(not(target_os = "linux"))]
mod systemd_impl {
    use super::NotifyResult;

    pub fn ready() -> NotifyResult {
        Ok(())
    }

    pub fn stopping() -> NotifyResult {
        Ok(())
    }

    pub fn heartbeat() -> NotifyResult {
        Ok(())
    }

    pub fn timeout_us() -> Option<u64> {
        None
    }
}

/// systemd 看门狗管理器
#[derive(Debug, Clone)]
pub struct SystemdWatchdog {
    config: WatchdogConfig,
    shutdown_handle: ShutdownHandle,
}

impl SystemdWatchdog {
    pub fn new(config: WatchdogConfig, shutdown_manager: &ShutdownManager) -> Self {
        Self {
            config,
            shutdown_handle: ShutdownHandle::new(shutdown_manager),
        }
    }

    /// 服务已可接收请求
    pub fn notify_ready(&self) -> NotifyResult {
        systemd_impl::ready()
    }

    /// 服务正在停止
    pub fn notify_stopping(&self) -> NotifyResult {
        systemd_impl::stopping()
    }

    /// 验证看门狗配置：心跳间隔须为正，且小于 systemd 超时的一半
    pub fn validate_config(&self) -> Result<(), String> {
        if !self.config.enabled {
            return Ok(());
        }
        if self.config.interval_secs == 0 {
            return Err("看门狗间隔时间不能为0".to_string());
        }
        let limit_secs = systemd_impl::timeout_us()
            .map(|us| us / 1_000_000)
            .unwrap_or(self.config.timeout_secs);
        if self.config.interval_secs * 2 >= limit_secs {
            return Err(format!(
                "看门狗间隔时间({}s)过大，应小于看门狗超时时间({}s)的一半",
                self.config.interval_secs, limit_secs
            ));
        }
        Ok(())
    }

    /// 启动心跳任务，收到退出事件后停止
    pub fn start_watchdog_task(&self) {
        if !self.config.enabled {
            info!("看门狗功能已禁用");
            return;
        }
        if cfg!(target_os = "linux") && systemd_impl::timeout_us().is_none() {
            warn!("systemd看门狗未启用或不在systemd环境下运行");
            return;
        }

        let interval = self.config.interval_duration();
        let mut shutdown_handle = self.shutdown_handle.clone();
        info!("启动看门狗任务，间隔: {:?}", interval);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = systemd_impl::heartbeat() {
                            warn!("看门狗心跳发送失败: {}", e);
                        } else {
                            debug!("看门狗心跳发送成功");
                        }
                    }
                    _ = shutdown_handle.wait() => {
                        info!("看门狗任务检测到退出信号，停止发送心跳");
                        break;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        let manager = ShutdownManager::new();
        let mut config = WatchdogConfig::default();

        // 禁用状态始终通过
        assert!(SystemdWatchdog::new(config.clone(), &manager).validate_config().is_ok());

        config.enabled = true;
        config.interval_secs = 0;
        assert!(SystemdWatchdog::new(config.clone(), &manager).validate_config().is_err());

        config.interval_secs = 10;
        config.timeout_secs = 60;
        if systemd_impl::timeout_us().is_none() {
            assert!(SystemdWatchdog::new(config.clone(), &manager).validate_config().is_ok());

            config.interval_secs = 30;
            assert!(SystemdWatchdog::new(config, &manager).validate_config().is_err());
        }
    }

    #[test]
    fn notifications_are_noops_outside_systemd() {
        let manager = ShutdownManager::new();
        let watchdog = SystemdWatchdog::new(WatchdogConfig::default(), &manager);
        if std::env::var_os("NOTIFY_SOCKET").is_none() {
            assert!(watchdog.notify_ready().is_ok());
            assert!(watchdog.notify_stopping().is_ok());
        }
    }
}
