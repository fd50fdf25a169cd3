//! # 请求数据模型
//!
//! - `ScanRequest` 表示一次扫描提交，图片与条码互斥
//! - `ImageUpload` 表示已加载、已校验、可直接放入 multipart 的图片

use bytes::Bytes;

/// 一次扫描提交。
#[derive(Debug, Clone)]
pub enum ScanRequest {
    /// 上传或抓帧得到的已编码图片。
    Image(ImageUpload),
    /// 条码识别得到的条码字符串。
    Barcode(String),
}

impl ScanRequest {
    /// 日志用的简短描述。
    pub fn describe(&self) -> String {
        match self {
            Self::Image(upload) => format!(
                "image {} ({}, {:.1} KB)",
                upload.file_name,
                upload.mime_type,
                upload.bytes.len() as f64 / 1024.0
            ),
            Self::Barcode(code) => format!("barcode {}", code),
        }
    }
}

/// 已编码的上传图片。
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// 编码后的图片字节，克隆为引用计数。
    pub bytes: Bytes,
    /// multipart 中的文件名。
    pub file_name: String,
    /// MIME 类型，例如 `image/jpeg`。
    pub mime_type: String,
}

impl ImageUpload {
    pub fn new(bytes: impl Into<Bytes>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }
}
