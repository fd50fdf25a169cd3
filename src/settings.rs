//! 设置文件加载
//!
//! 设置文件为 camelCase JSON，所有字段可选，未出现的字段保留默认值。
//! 读取后统一走 `ClientConfig::validate`。

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::{CaptureProfile, ClientConfig};
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SettingsFile {
    base_url: Option<String>,
    image_endpoint: Option<String>,
    barcode_endpoint: Option<String>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    max_upload_size: Option<u64>,
    capture_profile: Option<String>,
    jpeg_quality: Option<u8>,
    max_capture_dimension: Option<u32>,
    confirm_capture: Option<bool>,
}

impl SettingsFile {
    fn apply_to(self, config: &mut ClientConfig) -> Result<(), AppError> {
        // 档位先生效，显式字段再覆盖
        if let Some(profile) = self.capture_profile {
            config.apply_capture_profile(CaptureProfile::parse(&profile)?);
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(endpoint) = self.image_endpoint {
            config.image_endpoint = endpoint;
        }
        if let Some(endpoint) = self.barcode_endpoint {
            config.barcode_endpoint = endpoint;
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.request_timeout = timeout;
        }
        if let Some(timeout) = self.connect_timeout_secs {
            config.connect_timeout = timeout;
        }
        if let Some(size) = self.max_upload_size {
            config.max_upload_size = size;
        }
        if let Some(quality) = self.jpeg_quality {
            config.jpeg_quality = quality;
        }
        if let Some(dimension) = self.max_capture_dimension {
            config.max_capture_dimension = dimension;
        }
        if let Some(confirm) = self.confirm_capture {
            config.confirm_capture = confirm;
        }
        Ok(())
    }
}

/// 从 JSON 文本解析设置并合并到默认配置。
pub fn parse_settings(content: &str) -> Result<ClientConfig, AppError> {
    let settings = serde_json::from_str::<SettingsFile>(content)
        .map_err(|e| AppError::Config(format!("解析设置文件失败: {}", e)))?;

    let mut config = ClientConfig::default();
    settings.apply_to(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// 读取设置文件；文件不存在时返回默认配置。
pub fn load_settings(path: &Path) -> Result<ClientConfig, AppError> {
    if !path.exists() {
        log::info!("⚙️ 设置文件不存在，使用默认配置: {}", path.display());
        return Ok(ClientConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config = parse_settings(&content)?;
    log::info!("⚙️ 已加载设置文件: {}", path.display());
    Ok(config)
}
