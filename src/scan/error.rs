//! # 错误模型模块
//!
//! 使用单一错误枚举承载扫描请求链路中的所有错误来源，调用侧可按分支匹配。

/// 扫描请求统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("响应解析错误：{0}")]
    Decode(String),

    #[error("请求构造错误：{0}")]
    InvalidRequest(String),
}

impl ScanError {
    pub(crate) fn from_reqwest(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            Self::Timeout(format!("请求超时（{}秒）", timeout_secs))
        } else if error.is_connect() {
            Self::Network(format!("无法连接：{}", error))
        } else if error.is_decode() {
            Self::Decode(format!("响应体读取失败：{}", error))
        } else {
            Self::Network(format!("请求失败：{}", error))
        }
    }
}
