//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ClientConfig`：服务端地址、请求超时、上传体积上限、
//! 抓帧编码参数以及页面形态。保证运行时行为可观测、可调整、可测试。
//! 其中抓帧档位（quality / balanced / speed）作为高层语义，映射到底层参数组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置（JPEG 质量 95，对应页面上的 0.95）。
//! - `CaptureProfile` 负责档位字符串解析与反向输出。
//! - `apply_capture_profile` 将档位转换为具体阈值。
//! - `validate` 在加载设置文件后统一做范围校验。

use image::imageops::FilterType;

use crate::error::AppError;

/// 客户端配置。
///
/// 字段覆盖了请求分发、上传加载与抓帧编码三个阶段。
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 扫描服务根地址，例如 `http://127.0.0.1:5000`。
    pub base_url: String,
    /// 图片扫描端点（multipart，字段名 `image`）。
    pub image_endpoint: String,
    /// 条码查询端点（JSON `{ "barcode": ... }`）。
    pub barcode_endpoint: String,
    /// 单次请求总超时（秒）。
    pub request_timeout: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
    /// 上传图片允许的最大体积（字节）。
    pub max_upload_size: u64,
    /// 抓帧 JPEG 编码质量（1~100）。
    pub jpeg_quality: u8,
    /// 抓帧后宽/高单边最大值，超过则降采样。
    pub max_capture_dimension: u32,
    /// 降采样滤镜策略。
    pub resize_filter: FilterType,
    /// 抓帧后是否需要单独的“扫描已抓取图片”确认步骤。
    pub confirm_capture: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            image_endpoint: "/scan".to_string(),
            barcode_endpoint: "/scan_barcode".to_string(),
            request_timeout: 30,
            connect_timeout: 8,
            max_upload_size: 20 * 1024 * 1024,
            jpeg_quality: 95,
            max_capture_dimension: 2560,
            resize_filter: FilterType::Triangle,
            confirm_capture: true,
        }
    }
}

/// 抓帧档位（面向用户语义）。
///
/// - `Quality`：原尺寸、高质量编码
/// - `Balanced`：质量与上传体积平衡
/// - `Speed`：优先上传速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureProfile {
    Quality,
    Balanced,
    Speed,
}

impl CaptureProfile {
    /// 从外部字符串解析档位。
    pub fn parse(profile: &str) -> Result<Self, AppError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(AppError::Config(format!(
                "未知抓帧档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl ClientConfig {
    /// 应用指定抓帧档位到实际参数。
    pub fn apply_capture_profile(&mut self, profile: CaptureProfile) {
        match profile {
            CaptureProfile::Quality => {
                self.jpeg_quality = 95;
                self.max_capture_dimension = 8192;
                self.resize_filter = FilterType::CatmullRom;
            }
            CaptureProfile::Balanced => {
                self.jpeg_quality = 95;
                self.max_capture_dimension = 2560;
                self.resize_filter = FilterType::Triangle;
            }
            CaptureProfile::Speed => {
                self.jpeg_quality = 85;
                self.max_capture_dimension = 1280;
                self.resize_filter = FilterType::Nearest;
            }
        }

        log::info!(
            "⚙️ 已切换抓帧档位：{}（jpeg_quality={}, max_dim={}, filter={:?}）",
            profile.as_str(),
            self.jpeg_quality,
            self.max_capture_dimension,
            self.resize_filter
        );
    }

    /// 拼接端点完整地址。
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// 校验配置取值范围。
    pub fn validate(&self) -> Result<(), AppError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AppError::Config(format!("base_url 格式错误：{}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "base_url 仅支持 http/https：{}",
                self.base_url
            )));
        }
        if !(1..=300).contains(&self.request_timeout) {
            return Err(AppError::Config("request_timeout 必须在 1~300 秒之间".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(AppError::Config("connect_timeout 必须在 1~120 秒之间".to_string()));
        }
        if self.connect_timeout > self.request_timeout {
            return Err(AppError::Config(
                "connect_timeout 不能大于 request_timeout".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AppError::Config("jpeg_quality 必须在 1~100 之间".to_string()));
        }
        if self.max_capture_dimension < 64 {
            return Err(AppError::Config("max_capture_dimension 不能小于 64".to_string()));
        }
        if self.max_upload_size < 1024 {
            return Err(AppError::Config("max_upload_size 不能小于 1KB".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        config.validate().expect("default config should be valid");
        assert_eq!(config.jpeg_quality, 95);
        assert!(config.confirm_capture);
    }

    #[test]
    fn endpoint_url_joins_without_double_slash() {
        let mut config = ClientConfig::default();
        config.base_url = "http://scanner.local:5000/".to_string();

        assert_eq!(
            config.endpoint_url("/scan_barcode"),
            "http://scanner.local:5000/scan_barcode"
        );
        assert_eq!(config.endpoint_url("scan"), "http://scanner.local:5000/scan");
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let mut config = ClientConfig::default();
        config.base_url = "ftp://scanner.local".to_string();

        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_quality() {
        let mut config = ClientConfig::default();
        config.jpeg_quality = 0;

        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn speed_profile_lowers_capture_cost() {
        let mut config = ClientConfig::default();
        config.apply_capture_profile(CaptureProfile::parse(" Speed ").expect("parse profile"));

        assert_eq!(config.jpeg_quality, 85);
        assert_eq!(config.max_capture_dimension, 1280);
        assert!(matches!(config.resize_filter, FilterType::Nearest));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(matches!(CaptureProfile::parse("turbo"), Err(AppError::Config(_))));
    }
}
