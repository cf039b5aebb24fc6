use crate::config::FaceSwapConfig;
use crate::features::swap::SwapService;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 换脸服务（外部工具调用与临时文件管理）
    pub swap: SwapService,
}

impl AppState {
    pub fn from_config(cfg: &FaceSwapConfig) -> Self {
        Self {
            swap: SwapService::new(cfg),
        }
    }
}
