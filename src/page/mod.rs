//! # 扫描页面（page）
//!
//! - `controller`：`ScanPage`，持有会话状态，路由用户触发与识别事件
//! - `view`：`ScanView` 视图表面及其 HTML / 终端实现

mod controller;
mod view;

pub use controller::{
    PageVariant, ScanPage, Trigger, BARCODE_FALLBACK_HINT, CAMERA_NOT_READY, CAPTURE_READY, SCANNING_PLACEHOLDER,
    UPLOAD_MISSING,
};
pub use view::{Control, HtmlView, ScanView, TerminalView};
