//! # 视图表面
//!
//! 页面控制器只通过 `ScanView` 操作界面：结果区、原始输出面板、各类控件显隐、
//! 条码结果显示与触发器可用性。
//!
//! - `HtmlView`：内存中的页面表面，结果区保存 HTML 片段
//! - `TerminalView`：终端表面，结果以纯文本打印

use std::collections::BTreeSet;
use std::io::Write;

use crate::scan::render::escape_html;
use crate::scan::RenderedScan;

/// 可显隐的页面控件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Control {
    /// 摄像头预览与抓帧按钮。
    CaptureSection,
    /// “扫描已抓取图片”按钮。
    ScanCaptured,
    StartBarcode,
    StopBarcode,
    /// 条码结果显示框。
    BarcodeResult,
}

pub trait ScanView {
    /// 结果区替换为一行状态文本。
    fn set_status(&mut self, text: &str);

    /// 结果区替换为错误消息。
    fn show_error(&mut self, message: &str);

    /// 结果区替换为警告消息。
    fn show_warning(&mut self, message: &str);

    /// 结果区与原始输出面板替换为渲染结果。
    fn show_results(&mut self, rendered: &RenderedScan);

    fn clear_raw_output(&mut self);

    fn set_visible(&mut self, control: Control, visible: bool);

    fn set_triggers_enabled(&mut self, enabled: bool);

    fn show_barcode(&mut self, code: &str);

    /// 条码取景容器尺寸，作为解码目标区域。
    fn barcode_container_size(&self) -> (u32, u32) {
        (640, 480)
    }
}

/// 内存页面表面。
#[derive(Debug, Clone)]
pub struct HtmlView {
    pub result_html: String,
    pub raw_output: String,
    pub barcode_result: String,
    pub triggers_enabled: bool,
    /// 结果区被渲染结果替换的次数。
    pub render_count: usize,
    hidden: BTreeSet<Control>,
    container: (u32, u32),
}

impl HtmlView {
    pub fn new() -> Self {
        Self::with_container((640, 480))
    }

    pub fn with_container(container: (u32, u32)) -> Self {
        Self {
            result_html: String::new(),
            raw_output: String::new(),
            barcode_result: String::new(),
            triggers_enabled: true,
            render_count: 0,
            hidden: BTreeSet::new(),
            container,
        }
    }

    pub fn is_visible(&self, control: Control) -> bool {
        !self.hidden.contains(&control)
    }
}

impl Default for HtmlView {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanView for HtmlView {
    fn set_status(&mut self, text: &str) {
        self.result_html = format!("<p class=\"status\">{}</p>", escape_html(text));
    }

    fn show_error(&mut self, message: &str) {
        self.result_html = format!("<p class=\"error\">{}</p>", escape_html(message));
    }

    fn show_warning(&mut self, message: &str) {
        self.result_html = format!(
            "<p class=\"warning\">{}</p>",
            escape_html(message).replace('\n', "<br>")
        );
    }

    fn show_results(&mut self, rendered: &RenderedScan) {
        self.result_html = rendered.to_html();
        self.raw_output = rendered.raw_output.clone();
        self.render_count += 1;
    }

    fn clear_raw_output(&mut self) {
        self.raw_output.clear();
    }

    fn set_visible(&mut self, control: Control, visible: bool) {
        if visible {
            self.hidden.remove(&control);
        } else {
            self.hidden.insert(control);
        }
    }

    fn set_triggers_enabled(&mut self, enabled: bool) {
        self.triggers_enabled = enabled;
    }

    fn show_barcode(&mut self, code: &str) {
        self.barcode_result = code.to_string();
        self.hidden.remove(&Control::BarcodeResult);
    }

    fn barcode_container_size(&self) -> (u32, u32) {
        self.container
    }
}

/// 终端表面：把结果区更新逐条写到输出流。
pub struct TerminalView<W: Write> {
    out: W,
    html: bool,
}

impl<W: Write> TerminalView<W> {
    /// `html` 为 `true` 时结果区输出 HTML 片段，否则输出纯文本。
    pub fn new(out: W, html: bool) -> Self {
        Self { out, html }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{}", text) {
            log::error!("❌ 终端输出失败: {}", err);
        }
    }
}

impl<W: Write> ScanView for TerminalView<W> {
    fn set_status(&mut self, text: &str) {
        self.emit(text);
    }

    fn show_error(&mut self, message: &str) {
        self.emit(&format!("❌ {}", message));
    }

    fn show_warning(&mut self, message: &str) {
        self.emit(message);
    }

    fn show_results(&mut self, rendered: &RenderedScan) {
        let body = if self.html {
            rendered.to_html()
        } else {
            rendered.to_plain_text()
        };
        self.emit(&body);
        self.emit("");
        self.emit(&rendered.raw_output);
    }

    fn clear_raw_output(&mut self) {}

    fn set_visible(&mut self, control: Control, visible: bool) {
        log::debug!("🖥️ 控件 {:?} visible={}", control, visible);
    }

    fn set_triggers_enabled(&mut self, enabled: bool) {
        log::debug!("🖥️ 触发器 enabled={}", enabled);
    }

    fn show_barcode(&mut self, code: &str) {
        self.emit(&format!("📦 Barcode: {}", code));
    }
}
