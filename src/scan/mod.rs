//! # 扫描请求与结果渲染模块（scan）
//!
//! ## 设计思路
//!
//! 将“请求组装 → HTTP 往返 → 结果分类 → 渲染”按职责拆分：
//!
//! - `request`：扫描请求（图片 / 条码二选一）与上传数据模型
//! - `model`：服务端返回的扫描结果模型，所有字段可选
//! - `client`：基于 `reqwest` 的 HTTP 后端实现
//! - `dispatcher`：把 HTTP 结果归类为“结果 / 失败 / 未收录警告”
//! - `render`：纯函数，扫描结果 → 展示片段（HTML / 纯文本）
//!
//! ## 调用链
//!
//! ```text
//! ScanRequest
//!    ↓
//! dispatcher.rs（提交 + 结果归类，永不向上抛错）
//!    ├─ client.rs（multipart / JSON 请求 + 阶段耗时日志）
//!    ↓
//! SubmitOutcome
//!    ↓
//! render.rs（唯一的终端渲染阶段）
//! ```

mod client;
mod dispatcher;
mod error;
mod model;
pub mod render;
mod request;

pub use client::HttpScanClient;
pub use dispatcher::{
    ScanBackend, ScanDispatcher, ScanReply, SubmitOutcome, BARCODE_LOOKUP_FAILED, NETWORK_ERROR,
    SCAN_FAILED_FALLBACK,
};
pub use error::ScanError;
pub use model::{Detection, RiskReason, RiskyIngredient, ScanResult, Severity};
pub use render::{render_results, RenderedScan, Section};
pub use request::{ImageUpload, ScanRequest};
