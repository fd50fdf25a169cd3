//! # 上传文件加载与校验
//!
//! ## 设计思路
//!
//! 在“尽可能早”的阶段执行输入校验，尽快失败：
//! - 文件：存在性 + metadata 体积限制 + 读取 + 签名识别
//! - Data URL / 纯 Base64：解码前估算体积 + 解码 + 签名识别
//!
//! MIME 类型以文件签名为准（`infer`），不信任扩展名。

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};

use super::MediaError;
use crate::config::ClientConfig;
use crate::scan::ImageUpload;

/// 用户在页面上选择的上传来源。
#[derive(Debug, Clone)]
pub enum UploadSelection {
    FilePath(PathBuf),
    DataUrl(String),
}

impl UploadSelection {
    /// 终端参数：`data:` 开头视为 Data URL，否则为文件路径。
    pub fn from_arg(arg: &str) -> Self {
        if arg.trim_start().starts_with("data:") {
            Self::DataUrl(arg.to_string())
        } else {
            Self::FilePath(PathBuf::from(arg))
        }
    }

    pub fn load(&self, config: &ClientConfig) -> Result<ImageUpload, MediaError> {
        match self {
            Self::FilePath(path) => load_upload(path, config),
            Self::DataUrl(data) => upload_from_data_url(data, config),
        }
    }
}

/// 从本地路径加载上传图片。
pub fn load_upload(path: &Path, config: &ClientConfig) -> Result<ImageUpload, MediaError> {
    log::info!("📁 开始读取上传图片 - 路径: {}", path.display());

    if !path.exists() {
        return Err(MediaError::FileSystem(format!("文件不存在：{}", path.display())));
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| MediaError::FileSystem(format!("无法读取文件信息：{}", e)))?;
    if metadata.len() > config.max_upload_size {
        return Err(size_limit_error(metadata.len(), config.max_upload_size));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| MediaError::FileSystem(format!("无法读取图片文件：{}", e)))?;
    let mime_type = sniff_image_mime(&bytes)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    Ok(ImageUpload::new(bytes, file_name, mime_type))
}

/// 从 Data URL（或纯 Base64）加载上传图片。
pub fn upload_from_data_url(data: &str, config: &ClientConfig) -> Result<ImageUpload, MediaError> {
    log::info!("📝 开始处理 base64 图片");

    let payload = match data.trim().split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => {
            if !header.ends_with(";base64") {
                return Err(MediaError::InvalidFormat("仅支持 base64 编码的 Data URL".to_string()));
            }
            payload
        }
        _ => data.trim(),
    };

    let estimated = (payload.len() as u64 / 4 + 1) * 3;
    if estimated > config.max_upload_size.saturating_add(3) {
        return Err(size_limit_error(estimated, config.max_upload_size));
    }

    let bytes = general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| MediaError::InvalidFormat(format!("Base64 解码失败：{}", e)))?;
    if bytes.len() as u64 > config.max_upload_size {
        return Err(size_limit_error(bytes.len() as u64, config.max_upload_size));
    }

    let mime_type = sniff_image_mime(&bytes)?;
    let extension = infer::get(&bytes).map(|kind| kind.extension()).unwrap_or("img");

    Ok(ImageUpload::new(bytes, format!("upload.{}", extension), mime_type))
}

fn sniff_image_mime(bytes: &[u8]) -> Result<String, MediaError> {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(kind.mime_type().to_string()),
        Some(kind) => Err(MediaError::InvalidFormat(format!("不是图片类型：{}", kind.mime_type()))),
        None => Err(MediaError::InvalidFormat("无法识别文件格式".to_string())),
    }
}

fn size_limit_error(actual: u64, limit: u64) -> MediaError {
    MediaError::ResourceLimit(format!(
        "文件过大：{:.2} MB（限制：{:.2} MB）",
        actual as f64 / 1024.0 / 1024.0,
        limit as f64 / 1024.0 / 1024.0
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn png_bytes() -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::new_rgba8(8, 8)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn temp_path(name: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("allergen_upload_{}_{}", unique, name))
    }

    #[test]
    fn load_upload_detects_mime_from_signature() {
        let path = temp_path("label.bin");
        std::fs::write(&path, png_bytes()).expect("write fixture");

        let upload = load_upload(&path, &ClientConfig::default()).expect("upload should load");
        let _ = std::fs::remove_file(&path);

        assert_eq!(upload.mime_type, "image/png");
        assert!(upload.file_name.ends_with("label.bin"));
    }

    #[test]
    fn load_upload_rejects_non_image() {
        let path = temp_path("notes.txt");
        std::fs::write(&path, b"just some ingredients text").expect("write fixture");

        let result = load_upload(&path, &ClientConfig::default());
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(MediaError::InvalidFormat(_))));
    }

    #[test]
    fn load_upload_enforces_size_limit() {
        let path = temp_path("big.png");
        std::fs::write(&path, png_bytes()).expect("write fixture");
        let mut config = ClientConfig::default();
        config.max_upload_size = 16;

        let result = load_upload(&path, &config);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(MediaError::ResourceLimit(_))));
    }

    #[test]
    fn missing_file_is_file_system_error() {
        let result = load_upload(Path::new("/definitely/not/here.png"), &ClientConfig::default());
        assert!(matches!(result, Err(MediaError::FileSystem(_))));
    }

    #[test]
    fn data_url_is_decoded() {
        let data_url = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png_bytes()));

        let upload = UploadSelection::from_arg(&data_url)
            .load(&ClientConfig::default())
            .expect("data url should load");

        assert_eq!(upload.mime_type, "image/png");
        assert_eq!(upload.file_name, "upload.png");
    }

    #[test]
    fn data_url_rejects_non_image_payload() {
        let result = upload_from_data_url("SGVsbG8=", &ClientConfig::default());
        assert!(matches!(result, Err(MediaError::InvalidFormat(_))));
    }
}
