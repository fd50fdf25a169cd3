//! # 条码识别循环状态机
//!
//! ```text
//!            start（init 成功）
//!   Idle ─────────────────────────▶ Scanning
//!    ▲                                 │
//!    └──── stop / 识别到有效条码 ◀──────┘
//! ```
//!
//! - `start` 仅在 Idle 时有效；引擎初始化失败只记录日志，保持 Idle。
//! - 识别到有效条码后无条件停止引擎并回到 Idle，不会自动恢复扫描。
//! - 无效条码（空串、非可打印字符）记录后忽略，继续扫描。

use std::time::Instant;

use super::{normalize_code, DecodedBarcode, DecoderConfig, DetectionEngine, DetectionStream};
use crate::session::{ScanPhase, SessionState};

/// `start` 的结果，页面据此切换控件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyScanning,
    Failed,
}

pub struct BarcodeLoop<E> {
    engine: E,
    detections: Option<DetectionStream>,
    started_at: Option<Instant>,
}

impl<E: DetectionEngine> BarcodeLoop<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            detections: None,
            started_at: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn start(&mut self, state: &mut SessionState, container: (u32, u32)) -> StartOutcome {
        if state.is_scanning() {
            log::debug!("🔁 已在扫描中，忽略重复启动");
            return StartOutcome::AlreadyScanning;
        }

        let config = DecoderConfig::for_container(container);
        match self.engine.init(&config) {
            Ok(stream) => {
                self.detections = Some(stream);
                self.started_at = Some(Instant::now());
                state.phase = ScanPhase::Scanning;
                log::info!("🔍 条码扫描已开始 - 容器 {}x{}", container.0, container.1);
                StartOutcome::Started
            }
            Err(err) => {
                log::error!("❌ 条码引擎初始化失败，保持空闲: {}", err);
                StartOutcome::Failed
            }
        }
    }

    /// 停止扫描；原本处于 Scanning 时返回 `true`。
    pub fn stop(&mut self, state: &mut SessionState) -> bool {
        if !state.is_scanning() {
            return false;
        }

        self.engine.stop();
        self.detections = None;
        state.phase = ScanPhase::Idle;

        if let Some(started_at) = self.started_at.take() {
            log::info!("⏹️ 条码扫描已停止 - 持续 {}ms", started_at.elapsed().as_millis());
        }
        true
    }

    /// 等待下一次识别。
    ///
    /// 没有活跃订阅时永远挂起；订阅结束时返回 `None`。
    pub async fn next_detection(&mut self) -> Option<DecodedBarcode> {
        match self.detections.as_mut() {
            Some(stream) => {
                let next = stream.next().await;
                if next.is_none() {
                    self.detections = None;
                }
                next
            }
            None => std::future::pending().await,
        }
    }

    /// 处理一次识别；返回需要提交的条码。
    ///
    /// 有效识别无条件结束扫描。无效码（如键盘楔形输入的空行）只记日志，保持 Scanning。
    pub fn on_detection(&mut self, state: &mut SessionState, detection: DecodedBarcode) -> Option<String> {
        if !state.is_scanning() {
            log::debug!("🔕 空闲状态下收到识别结果，忽略");
            return None;
        }

        let code = match normalize_code(&detection.code) {
            Ok(code) => code,
            Err(err) => {
                log::warn!("⚠️ 忽略识别结果，继续扫描: {}", err);
                return None;
            }
        };

        log::info!("📦 识别到条码: {} ({:?})", code, detection.symbology);
        self.stop(state);
        Some(code)
    }
}
