//! # 扫描会话状态
//!
//! 页面唯一的可变状态记录，由页面事件循环独占并显式传入各状态机操作。

use crate::media::CapturedImage;

/// 条码扫描阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPhase {
    #[default]
    Idle,
    Scanning,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: ScanPhase,
    /// 最近一次成功抓帧；抓帧失败时保持不变。
    pub last_capture: Option<CapturedImage>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scanning(&self) -> bool {
        self.phase == ScanPhase::Scanning
    }
}
