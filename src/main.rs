use faceswap_backend::startup::run_startup_checks;
use faceswap_backend::{AppConfig, AppState, ShutdownManager, SystemdWatchdog, build_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faceswap_backend=info,tower_http=info".into()),
        )
        .init();

    let shutdown_manager = ShutdownManager::new();

    if let Err(e) = AppConfig::init_global() {
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();

    if let Err(e) = shutdown_manager.start_signal_handler().await {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    let watchdog = SystemdWatchdog::new(config.shutdown.watchdog.clone(), &shutdown_manager);
    if let Err(e) = watchdog.validate_config() {
        tracing::error!("看门狗配置验证失败: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run_startup_checks(config).await {
        tracing::error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    let app_state = AppState::from_config(&config.faceswap);
    let swap_service = app_state.swap.clone();
    let app = build_router(app_state, config);

    watchdog.start_watchdog_task();

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Swap API: http://{}/swap", addr);
    tracing::info!("FaceFusion binary: {}", swap_service.runner().binary());

    if let Err(e) = watchdog.notify_ready() {
        tracing::warn!("发送ready信号失败: {}", e);
    }

    let shutdown_config = &config.shutdown;
    let swap_for_shutdown = swap_service.clone();
    let shutdown_signal = async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!(
            "接收到退出信号: {:?}，开始优雅退出（进行中的换脸任务: {}）",
            reason,
            swap_for_shutdown.in_flight()
        );
        if let Err(e) = watchdog.notify_stopping() {
            tracing::warn!("发送stopping信号失败: {}", e);
        }

        // 外部进程没有超时限制，超过退出期限仍未结束时按配置强制退出
        tokio::spawn(async move {
            tokio::time::sleep(shutdown_config.timeout_duration()).await;
            tracing::warn!(
                "优雅退出超时（{}秒），仍有 {} 个换脸任务未完成",
                shutdown_config.timeout_secs,
                swap_for_shutdown.in_flight()
            );
            if shutdown_config.force_quit {
                tracing::info!("等待 {} 秒后强制退出", shutdown_config.force_delay_secs);
                tokio::time::sleep(shutdown_config.force_delay_duration()).await;
                std::process::exit(1);
            }
        });
    };

    // 停止接收新连接，等待进行中的请求完成
    let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
        shutdown_signal.await;
        tracing::info!("开始优雅关闭HTTP服务器...");
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
