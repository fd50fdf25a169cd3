//! # 抓帧与编码流水线
//!
//! ## 设计思路
//!
//! 将“视频流 → 单帧 → JPEG”集中管理：
//! 1. 检查视频流尺寸，未就绪直接失败（上一张抓帧保持不变由调用侧保证）
//! 2. 抓取当前帧
//! 3. 超过单边上限时降采样（`fast_image_resize`，失败回退 `image::resize_exact`）
//! 4. 转 RGB 后按配置质量编码 JPEG

use std::io::Cursor;

use bytes::Bytes;
use chrono::{DateTime, Local};
use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};

use super::{MediaError, VideoStream};
use crate::config::ClientConfig;
use crate::scan::ImageUpload;

pub const CAPTURE_FILE_NAME: &str = "capture.jpg";
pub const CAPTURE_MIME_TYPE: &str = "image/jpeg";

/// 一次抓帧的编码结果。
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Local>,
}

impl CapturedImage {
    /// 转为上传数据；字节缓冲共享，不复制。
    pub fn to_upload(&self) -> ImageUpload {
        ImageUpload::new(self.bytes.clone(), CAPTURE_FILE_NAME, CAPTURE_MIME_TYPE)
    }

    /// 日志用摘要：尺寸、字节数、抓帧时刻。
    pub fn describe(&self) -> String {
        format!(
            "{}x{} {}B @ {}",
            self.width,
            self.height,
            self.bytes.len(),
            self.captured_at.format("%H:%M:%S")
        )
    }
}

/// 抓取视频流当前帧并编码为 JPEG。
pub fn capture_frame(
    stream: &mut dyn VideoStream,
    config: &ClientConfig,
) -> Result<CapturedImage, MediaError> {
    if !stream.is_ready() {
        log::error!("📷 视频流尚未就绪，放弃抓帧");
        return Err(MediaError::NotReady);
    }

    let frame = stream.grab_frame()?;
    let (raw_width, raw_height) = frame.dimensions();

    let prepared = maybe_downscale(DynamicImage::ImageRgba8(frame), config)?;
    let (width, height) = prepared.dimensions();

    let rgb = prepared.to_rgb8();
    let mut cursor = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut cursor, config.jpeg_quality)
        .encode_image(&rgb)
        .map_err(|e| MediaError::Encode(format!("JPEG 编码失败：{}", e)))?;
    let bytes = Bytes::from(cursor.into_inner());

    log::info!(
        "✅ 抓帧完成 - 原始尺寸: {}x{} 输出尺寸: {}x{} 质量: {} 大小: {:.1}KB",
        raw_width,
        raw_height,
        width,
        height,
        config.jpeg_quality,
        bytes.len() as f64 / 1024.0
    );

    Ok(CapturedImage {
        bytes,
        width,
        height,
        captured_at: Local::now(),
    })
}

fn maybe_downscale(image: DynamicImage, config: &ClientConfig) -> Result<DynamicImage, MediaError> {
    let (width, height) = image.dimensions();
    let max_dimension = config.max_capture_dimension;

    if width <= max_dimension && height <= max_dimension {
        return Ok(image);
    }

    let scale = (max_dimension as f64 / width as f64).min(max_dimension as f64 / height as f64);
    if scale <= 0.0 {
        return Err(MediaError::ResourceLimit("缩放比例计算异常".to_string()));
    }

    let target_width = ((width as f64 * scale).floor() as u32).max(1);
    let target_height = ((height as f64 * scale).floor() as u32).max(1);

    log::info!(
        "🧩 抓帧降采样：{}x{} -> {}x{}（filter={:?}）",
        width,
        height,
        target_width,
        target_height,
        config.resize_filter
    );

    match resize_with_fast_image_resize(&image, target_width, target_height, config.resize_filter) {
        Ok(resized) => Ok(resized),
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
            Ok(image.resize_exact(target_width, target_height, config.resize_filter))
        }
    }
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<DynamicImage, MediaError> {
    let src = image.to_rgba8();
    let (src_width, src_height) = src.dimensions();

    let src_image = fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
        .map_err(|e| MediaError::Encode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| MediaError::Encode(format!("fast_image_resize 执行失败：{}", e)))?;

    let rgba: RgbaImage = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| MediaError::Encode("fast_image_resize 输出缓冲长度异常".to_string()))?;

    Ok(DynamicImage::ImageRgba8(rgba))
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::StillFrameStream;
    use chrono::TimeZone;

    /// 尚未拿到尺寸的视频流。
    struct WarmingUpStream;

    impl VideoStream for WarmingUpStream {
        fn dimensions(&self) -> (u32, u32) {
            (0, 0)
        }

        fn grab_frame(&mut self) -> Result<RgbaImage, MediaError> {
            panic!("grab_frame must not be called before the stream is ready")
        }
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
        }))
    }

    #[test]
    fn capture_rejects_stream_without_dimensions() {
        let result = capture_frame(&mut WarmingUpStream, &ClientConfig::default());

        assert!(matches!(result, Err(MediaError::NotReady)));
    }

    #[test]
    fn capture_encodes_jpeg_at_source_size() {
        let mut stream = StillFrameStream::new(gradient(640, 480));

        let captured = capture_frame(&mut stream, &ClientConfig::default()).expect("capture should succeed");

        assert_eq!((captured.width, captured.height), (640, 480));
        assert_eq!(&captured.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&captured.bytes).expect("guess format"),
            image::ImageFormat::Jpeg
        );

        let upload = captured.to_upload();
        assert_eq!(upload.file_name, "capture.jpg");
        assert_eq!(upload.mime_type, "image/jpeg");
        assert_eq!(upload.bytes, captured.bytes);
    }

    #[test]
    fn capture_downscales_oversized_frames() {
        let mut config = ClientConfig::default();
        config.max_capture_dimension = 256;
        let mut stream = StillFrameStream::new(gradient(1024, 512));

        let captured = capture_frame(&mut stream, &config).expect("capture should succeed");

        assert_eq!((captured.width, captured.height), (256, 128));
        let decoded = image::load_from_memory(&captured.bytes).expect("decode captured jpeg");
        assert_eq!(decoded.dimensions(), (256, 128));
    }

    #[test]
    fn lower_quality_produces_smaller_buffer() {
        let mut high = ClientConfig::default();
        high.jpeg_quality = 95;
        let mut low = ClientConfig::default();
        low.jpeg_quality = 20;

        let frame = gradient(320, 240);
        let high_capture = capture_frame(&mut StillFrameStream::new(frame.clone()), &high).expect("high");
        let low_capture = capture_frame(&mut StillFrameStream::new(frame), &low).expect("low");

        assert!(low_capture.bytes.len() < high_capture.bytes.len());
    }

    #[test]
    fn describe_reports_size_and_capture_time() {
        let captured = CapturedImage {
            bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]),
            width: 320,
            height: 240,
            captured_at: Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).single().expect("valid time"),
        };

        assert_eq!(captured.describe(), "320x240 4B @ 09:26:53");
    }

    #[test]
    fn capture_is_stamped_at_capture_time() {
        let before = Local::now();
        let captured = capture_frame(&mut StillFrameStream::new(gradient(32, 32)), &ClientConfig::default())
            .expect("capture should succeed");

        assert!(captured.captured_at >= before);
        assert!(captured.describe().starts_with("32x32 "));
    }
}
