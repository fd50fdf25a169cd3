//! # HTTP 扫描后端
//!
//! ## 设计思路
//!
//! 复用单个 `reqwest::Client`（内部为引用计数，克隆开销可忽略），
//! 图片走 multipart（字段名 `image`），条码走 JSON `{ "barcode": ... }`。
//!
//! ## 响应体解析策略
//!
//! - 2xx 且响应体不是合法 JSON：视为传输层失败（`ScanError::Decode`）。
//! - 非 2xx 且响应体不是合法 JSON（如网关错误页）：返回空结果体，
//!   由分发层使用兜底文案。

use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use serde::Serialize;

use super::{ImageUpload, ScanBackend, ScanError, ScanReply, ScanResult};
use crate::config::ClientConfig;

#[derive(Debug, Clone)]
pub struct HttpScanClient {
    http: reqwest::Client,
    image_url: reqwest::Url,
    barcode_url: reqwest::Url,
    request_timeout: u64,
}

#[derive(Serialize)]
struct BarcodeBody<'a> {
    barcode: &'a str,
}

impl HttpScanClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ScanError> {
        let image_url = Self::parse_endpoint(&config.endpoint_url(&config.image_endpoint))?;
        let barcode_url = Self::parse_endpoint(&config.endpoint_url(&config.barcode_endpoint))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| ScanError::InvalidRequest(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            http,
            image_url,
            barcode_url,
            request_timeout: config.request_timeout,
        })
    }

    pub fn image_url(&self) -> &reqwest::Url {
        &self.image_url
    }

    pub fn barcode_url(&self) -> &reqwest::Url {
        &self.barcode_url
    }

    fn parse_endpoint(url: &str) -> Result<reqwest::Url, ScanError> {
        reqwest::Url::parse(url)
            .map_err(|e| ScanError::InvalidRequest(format!("端点 URL 格式错误：{} ({})", url, e)))
    }

    async fn read_reply(
        &self,
        response: reqwest::Response,
        started: Instant,
        label: &str,
    ) -> Result<ScanReply, ScanError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ScanError::from_reqwest(e, self.request_timeout))?;

        log::debug!(
            "📡 {} 响应 - HTTP {} body={}B elapsed={}ms",
            label,
            status,
            body.len(),
            started.elapsed().as_millis()
        );

        let parsed = match serde_json::from_slice::<ScanResult>(&body) {
            Ok(parsed) => parsed,
            Err(err) if (200..300).contains(&status) => {
                return Err(ScanError::Decode(format!("响应不是合法的扫描结果：{}", err)));
            }
            Err(err) => {
                log::warn!("⚠️ {} 错误响应体无法解析（HTTP {}）：{}", label, status, err);
                ScanResult::default()
            }
        };

        Ok(ScanReply {
            status,
            body: parsed,
        })
    }
}

impl ScanBackend for HttpScanClient {
    async fn post_image(&self, upload: &ImageUpload) -> Result<ScanReply, ScanError> {
        let started = Instant::now();
        log::info!(
            "📤 上传图片 - {} {} {:.1}KB",
            upload.file_name,
            upload.mime_type,
            upload.bytes.len() as f64 / 1024.0
        );

        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| ScanError::InvalidRequest(format!("MIME 类型无效：{}", e)))?;
        let form = Form::new().part("image", part);

        let response = self
            .http
            .post(self.image_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ScanError::from_reqwest(e, self.request_timeout))?;

        self.read_reply(response, started, "图片扫描").await
    }

    async fn post_barcode(&self, code: &str) -> Result<ScanReply, ScanError> {
        let started = Instant::now();
        log::info!("📤 查询条码 - {}", code);

        let response = self
            .http
            .post(self.barcode_url.clone())
            .json(&BarcodeBody { barcode: code })
            .send()
            .await
            .map_err(|e| ScanError::from_reqwest(e, self.request_timeout))?;

        self.read_reply(response, started, "条码查询").await
    }
}
