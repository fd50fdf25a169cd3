//! # 扫描页面控制器
//!
//! ## 设计思路
//!
//! 上传扫描、抓帧扫描、条码扫描三条路径共用同一条流水线：
//!
//! ```text
//! Trigger ──▶ ScanRequest ──▶ ScanDispatcher ──▶ SubmitOutcome ──▶ ScanView
//!                  ▲
//! BarcodeLoop ─────┘（识别到条码）
//! ```
//!
//! ## 实现思路
//!
//! - 页面形态由 `PageVariant` 参数化：抓帧后是否需要单独确认再提交。
//! - 同一时刻最多一个未完成的提交。提交期间触发器被禁用，抓帧与手动提交类触发被拒绝；
//!   条码识别触发的提交排队，等当前提交完成后再发出。
//! - 提交前结果区置为 "Scanning..." 并清空原始输出，完成后只替换一次。
//! - 会话状态 `SessionState` 只在本控制器的事件循环中被修改。

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use tokio::sync::mpsc;

use super::view::{Control, ScanView};
use crate::barcode::{BarcodeLoop, DecodedBarcode, DetectionEngine, StartOutcome};
use crate::config::ClientConfig;
use crate::media::{acquire_camera, capture_frame, CameraSource, FacingMode, MediaError, UploadSelection, VideoStream};
use crate::scan::{render_results, ScanBackend, ScanDispatcher, ScanRequest, SubmitOutcome};
use crate::session::SessionState;

pub const SCANNING_PLACEHOLDER: &str = "Scanning...";
pub const UPLOAD_MISSING: &str = "Please upload an image file first.";
pub const CAMERA_NOT_READY: &str = "Camera not ready. Please grant permission and try again.";
pub const CAPTURE_READY: &str = "✅ Image captured. Ready to scan.";
pub const BARCODE_FALLBACK_HINT: &str = "Scan ingredient image instead.";

type PendingSubmission = Pin<Box<dyn Future<Output = SubmitOutcome>>>;

/// 页面形态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageVariant {
    /// `true`：抓帧后先确认再提交；`false`：抓帧即提交。
    pub confirm_capture: bool,
}

impl PageVariant {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            confirm_capture: config.confirm_capture,
        }
    }
}

/// 用户触发。
#[derive(Debug, Clone)]
pub enum Trigger {
    /// 扫描上传的图片；`None` 表示没有选择文件。
    ScanUpload(Option<UploadSelection>),
    Capture,
    ScanCaptured,
    StartBarcode,
    StopBarcode,
    /// 手动输入的条码。
    LookupBarcode(String),
}

impl Trigger {
    /// 提交进行中时需要拒绝的触发：会发起提交或改写结果区的触发。
    fn blocked_while_busy(&self) -> bool {
        match self {
            Self::ScanUpload(_) | Self::Capture | Self::ScanCaptured | Self::LookupBarcode(_) => true,
            Self::StartBarcode | Self::StopBarcode => false,
        }
    }
}

pub struct ScanPage<B, E, V> {
    dispatcher: Rc<ScanDispatcher<B>>,
    barcode: BarcodeLoop<E>,
    view: V,
    config: ClientConfig,
    variant: PageVariant,
    state: SessionState,
    camera: Option<Box<dyn VideoStream>>,
    pending: Option<PendingSubmission>,
    queued: VecDeque<ScanRequest>,
    last_outcome: Option<SubmitOutcome>,
}

impl<B, E, V> ScanPage<B, E, V>
where
    B: ScanBackend + 'static,
    E: DetectionEngine,
    V: ScanView,
{
    pub fn new(dispatcher: ScanDispatcher<B>, engine: E, view: V, config: ClientConfig) -> Self {
        let variant = PageVariant::from_config(&config);
        Self {
            dispatcher: Rc::new(dispatcher),
            barcode: BarcodeLoop::new(engine),
            view,
            config,
            variant,
            state: SessionState::new(),
            camera: None,
            pending: None,
            queued: VecDeque::new(),
            last_outcome: None,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn variant(&self) -> PageVariant {
        self.variant
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// 最近一次完成的提交结果。
    pub fn last_outcome(&self) -> Option<&SubmitOutcome> {
        self.last_outcome.as_ref()
    }

    /// 页面加载：设置初始控件并申请摄像头。
    pub fn mount(&mut self, camera: &mut dyn CameraSource) {
        self.view.set_visible(Control::ScanCaptured, false);
        self.view.set_visible(Control::StopBarcode, false);
        self.view.set_visible(Control::BarcodeResult, false);
        self.view.set_visible(Control::StartBarcode, true);

        self.camera = acquire_camera(camera, FacingMode::Environment);
        self.view
            .set_visible(Control::CaptureSection, self.camera.is_some());
    }

    pub fn handle_trigger(&mut self, trigger: Trigger) {
        if self.is_busy() && trigger.blocked_while_busy() {
            log::warn!("⏳ 已有扫描请求进行中，忽略触发: {:?}", trigger);
            return;
        }

        match trigger {
            Trigger::ScanUpload(None) => self.view.show_error(UPLOAD_MISSING),
            Trigger::ScanUpload(Some(selection)) => match selection.load(&self.config) {
                Ok(upload) => self.begin_submission(ScanRequest::Image(upload)),
                Err(err) => {
                    log::error!("❌ 上传图片加载失败: {}", err);
                    self.view.show_error(&err.to_string());
                }
            },
            Trigger::Capture => self.capture(),
            Trigger::ScanCaptured => match self.state.last_capture.as_ref() {
                Some(captured) => {
                    let upload = captured.to_upload();
                    self.begin_submission(ScanRequest::Image(upload));
                }
                None => log::warn!("📷 尚未抓帧，忽略扫描请求"),
            },
            Trigger::StartBarcode => self.start_barcode(),
            Trigger::StopBarcode => {
                if self.barcode.stop(&mut self.state) {
                    self.restore_barcode_controls();
                }
            }
            Trigger::LookupBarcode(code) => match crate::barcode::normalize_code(&code) {
                Ok(code) => {
                    self.view.show_barcode(&code);
                    self.begin_submission(ScanRequest::Barcode(code));
                }
                Err(err) => self.view.show_error(&err.to_string()),
            },
        }
    }

    fn capture(&mut self) {
        let Some(stream) = self.camera.as_mut() else {
            log::error!("📷 没有可用的视频流");
            self.view.show_error(CAMERA_NOT_READY);
            return;
        };

        let captured = match capture_frame(stream.as_mut(), &self.config) {
            Ok(captured) => captured,
            Err(MediaError::NotReady) => {
                self.view.show_error(CAMERA_NOT_READY);
                return;
            }
            Err(err) => {
                log::error!("❌ 抓帧失败: {}", err);
                self.view.show_error(&err.to_string());
                return;
            }
        };

        let upload = captured.to_upload();
        log::info!("📷 已保存抓帧 - {}", captured.describe());
        self.state.last_capture = Some(captured);

        if self.variant.confirm_capture {
            self.view.set_status(CAPTURE_READY);
            self.view.set_visible(Control::ScanCaptured, true);
        } else {
            self.begin_submission(ScanRequest::Image(upload));
        }
    }

    fn start_barcode(&mut self) {
        let container = self.view.barcode_container_size();
        if self.barcode.start(&mut self.state, container) == StartOutcome::Started {
            self.view.set_visible(Control::StartBarcode, false);
            self.view.set_visible(Control::StopBarcode, true);
        }
    }

    fn restore_barcode_controls(&mut self) {
        self.view.set_visible(Control::StartBarcode, true);
        self.view.set_visible(Control::StopBarcode, false);
    }

    /// 处理一次识别事件；`None` 表示订阅已结束。
    pub fn handle_detection(&mut self, detection: Option<DecodedBarcode>) {
        let Some(detection) = detection else {
            if self.barcode.stop(&mut self.state) {
                log::warn!("⚠️ 识别订阅意外结束，已停止扫描");
                self.restore_barcode_controls();
            }
            return;
        };

        let Some(code) = self.barcode.on_detection(&mut self.state, detection) else {
            return;
        };

        self.view.show_barcode(&code);
        self.restore_barcode_controls();

        let request = ScanRequest::Barcode(code);
        if self.is_busy() {
            log::info!("⏳ 条码提交排队，等待当前请求完成");
            self.queued.push_back(request);
        } else {
            self.begin_submission(request);
        }
    }

    fn begin_submission(&mut self, request: ScanRequest) {
        self.view.set_status(SCANNING_PLACEHOLDER);
        self.view.clear_raw_output();
        if matches!(request, ScanRequest::Image(_)) {
            self.view.set_visible(Control::ScanCaptured, false);
        }
        self.view.set_triggers_enabled(false);

        let dispatcher = Rc::clone(&self.dispatcher);
        self.pending = Some(Box::pin(async move { dispatcher.submit(request).await }));
    }

    fn finish_submission(&mut self, outcome: SubmitOutcome) {
        self.pending = None;

        match &outcome {
            SubmitOutcome::Results(result) => self.view.show_results(&render_results(result)),
            SubmitOutcome::Failed(message) => self.view.show_error(message),
            SubmitOutcome::NotFound(error) => self
                .view
                .show_warning(&format!("⚠️ {}\n{}", error, BARCODE_FALLBACK_HINT)),
        }
        self.last_outcome = Some(outcome);
        self.view.set_triggers_enabled(true);

        if let Some(next) = self.queued.pop_front() {
            self.begin_submission(next);
        }
    }

    /// 驱动进行中的提交与条码扫描，直到两者都结束。
    pub async fn settle(&mut self) {
        while self.is_busy() || self.state.is_scanning() {
            tokio::select! {
                outcome = wait_pending(&mut self.pending), if self.pending.is_some() => {
                    self.finish_submission(outcome);
                }
                detection = self.barcode.next_detection(), if self.state.is_scanning() => {
                    self.handle_detection(detection);
                }
            }
        }
    }

    /// 页面事件循环：触发器通道关闭且没有进行中的工作时返回。
    pub async fn run(&mut self, mut triggers: mpsc::UnboundedReceiver<Trigger>) {
        let mut triggers_open = true;

        while triggers_open || self.is_busy() || self.state.is_scanning() {
            tokio::select! {
                trigger = triggers.recv(), if triggers_open => match trigger {
                    Some(trigger) => self.handle_trigger(trigger),
                    None => triggers_open = false,
                },
                outcome = wait_pending(&mut self.pending), if self.pending.is_some() => {
                    self.finish_submission(outcome);
                }
                detection = self.barcode.next_detection(), if self.state.is_scanning() => {
                    self.handle_detection(detection);
                }
            }
        }
    }
}

async fn wait_pending(pending: &mut Option<PendingSubmission>) -> SubmitOutcome {
    match pending.as_mut() {
        Some(submission) => submission.as_mut().await,
        None => std::future::pending().await,
    }
}
