//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，汇总各子系统（扫描请求、媒体采集、条码循环）
//! 的错误，替代分散的 `.map_err(|e| e.to_string())` 与 `expect()` 模式。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ScanError` / `MediaError` / `BarcodeError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于视图层或 JSON 输出直接展示。

use serde::Serialize;

use crate::barcode::BarcodeError;
use crate::media::MediaError;
use crate::scan::ScanError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 扫描请求链路错误（网络 / 解码 / 服务端）
    #[error("{0}")]
    Scan(#[from] ScanError),

    /// 摄像头或图片加载错误
    #[error("{0}")]
    Media(#[from] MediaError),

    /// 条码识别引擎错误
    #[error("{0}")]
    Barcode(#[from] BarcodeError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置无效或设置文件无法解析
    #[error("配置错误: {0}")]
    Config(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
