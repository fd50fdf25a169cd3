//! # 扫描请求分发
//!
//! ## 设计思路
//!
//! `ScanDispatcher` 只负责“提交 + 结果归类”，不直接操作视图。
//! 任何传输失败都在这里被吸收为 `SubmitOutcome::Failed`，调用侧永远拿到一个结果。
//!
//! ## 归类规则
//!
//! | 端点 | 响应 | 结果 |
//! |------|------|------|
//! | 图片 | 2xx | `Results` |
//! | 图片 | 非 2xx | `Failed(error 或 "Scan failed")` |
//! | 条码 | 含 `error`（任意状态码） | `NotFound(error)`，不渲染 |
//! | 条码 | 2xx 无 `error` | `Results` |
//! | 条码 | 非 2xx 无 `error` | `Failed("Barcode lookup failed")` |
//! | 任意 | 传输 / 解析失败 | `Failed("A network error occurred.")` |

use std::future::Future;
use std::time::Instant;

use super::{ImageUpload, ScanError, ScanRequest, ScanResult};

pub const NETWORK_ERROR: &str = "A network error occurred.";
pub const SCAN_FAILED_FALLBACK: &str = "Scan failed";
pub const BARCODE_LOOKUP_FAILED: &str = "Barcode lookup failed";

/// 一次 HTTP 往返的结果：状态码 + 已解析的响应体。
#[derive(Debug, Clone)]
pub struct ScanReply {
    pub status: u16,
    pub body: ScanResult,
}

impl ScanReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 扫描后端抽象。
///
/// 生产实现为 [`HttpScanClient`](super::HttpScanClient)，测试中可替换为内存实现。
pub trait ScanBackend {
    fn post_image(&self, upload: &ImageUpload) -> impl Future<Output = Result<ScanReply, ScanError>>;

    fn post_barcode(&self, code: &str) -> impl Future<Output = Result<ScanReply, ScanError>>;
}

/// 提交结果，视图层据此做唯一一次替换。
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// 需要渲染的扫描结果。
    Results(ScanResult),
    /// 失败消息，原样展示。
    Failed(String),
    /// 条码未收录，提示改用图片扫描。
    NotFound(String),
}

#[derive(Debug, Clone)]
pub struct ScanDispatcher<B> {
    backend: B,
}

impl<B: ScanBackend> ScanDispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn submit(&self, request: ScanRequest) -> SubmitOutcome {
        let start = Instant::now();
        let description = request.describe();

        let outcome = match request {
            ScanRequest::Image(upload) => self.submit_image(upload).await,
            ScanRequest::Barcode(code) => self.submit_barcode(&code).await,
        };

        log::info!(
            "📨 扫描提交完成 - {} outcome={} elapsed={}ms",
            description,
            outcome.kind(),
            start.elapsed().as_millis()
        );
        outcome
    }

    pub async fn submit_image(&self, upload: ImageUpload) -> SubmitOutcome {
        match self.backend.post_image(&upload).await {
            Ok(reply) if reply.is_success() => SubmitOutcome::Results(reply.body),
            Ok(reply) => {
                let message = reply
                    .body
                    .error_message()
                    .unwrap_or(SCAN_FAILED_FALLBACK)
                    .to_string();
                log::warn!("⚠️ 图片扫描失败 - HTTP {}: {}", reply.status, message);
                SubmitOutcome::Failed(message)
            }
            Err(err) => {
                log::error!("❌ 图片扫描请求失败: {}", err);
                SubmitOutcome::Failed(NETWORK_ERROR.to_string())
            }
        }
    }

    pub async fn submit_barcode(&self, code: &str) -> SubmitOutcome {
        match self.backend.post_barcode(code).await {
            Ok(reply) => {
                if let Some(error) = reply.body.error_message() {
                    log::info!("🔎 条码未收录 - {} (HTTP {}): {}", code, reply.status, error);
                    return SubmitOutcome::NotFound(error.to_string());
                }
                if reply.is_success() {
                    SubmitOutcome::Results(reply.body)
                } else {
                    log::warn!("⚠️ 条码查询失败 - HTTP {}", reply.status);
                    SubmitOutcome::Failed(BARCODE_LOOKUP_FAILED.to_string())
                }
            }
            Err(err) => {
                log::error!("❌ 条码查询请求失败: {}", err);
                SubmitOutcome::Failed(NETWORK_ERROR.to_string())
            }
        }
    }
}

impl SubmitOutcome {
    fn kind(&self) -> &'static str {
        match self {
            Self::Results(_) => "results",
            Self::Failed(_) => "failed",
            Self::NotFound(_) => "not_found",
        }
    }
}
