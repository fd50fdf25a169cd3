//! # 条码识别模块（barcode）
//!
//! - `engine`：识别引擎抽象、识别事件订阅、键盘楔形引擎
//! - `detection_loop`：Idle / Scanning 状态机
//! - `code`：条码字符串校验

mod code;
mod detection_loop;
mod engine;
mod error;

pub use code::normalize_code;
pub use detection_loop::{BarcodeLoop, StartOutcome};
pub use engine::{
    detection_channel, DecodedBarcode, DecoderConfig, DetectionEngine, DetectionSink, DetectionStream,
    KeyboardWedgeEngine, Symbology, UnavailableEngine,
};
pub use error::BarcodeError;
