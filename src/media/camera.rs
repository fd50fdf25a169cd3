//! # 摄像头来源
//!
//! ## 设计思路
//!
//! 平台摄像头 API 属于外部协作方，这里只定义最小抽象：
//! - `CameraSource::open` 按朝向申请视频流（优先后置摄像头）
//! - `VideoStream` 提供当前尺寸与当前帧
//!
//! `acquire_camera` 吞掉申请失败并记录日志，返回 `None` 让页面降级为仅上传模式，
//! 永远不会阻塞页面。

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, RgbaImage};

use super::MediaError;

/// 摄像头朝向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// 后置摄像头（扫描配料表时优先）。
    #[default]
    Environment,
    /// 前置摄像头。
    User,
}

impl FacingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::User => "user",
        }
    }
}

/// 已打开的视频流。
pub trait VideoStream {
    /// 当前帧尺寸；流尚未就绪时为 `(0, 0)`。
    fn dimensions(&self) -> (u32, u32);

    fn grab_frame(&mut self) -> Result<RgbaImage, MediaError>;

    fn is_ready(&self) -> bool {
        let (width, height) = self.dimensions();
        width > 0 && height > 0
    }
}

/// 摄像头来源。
pub trait CameraSource {
    fn open(&mut self, facing: FacingMode) -> Result<Box<dyn VideoStream>, MediaError>;
}

/// 申请摄像头；失败时返回 `None`（降级为仅上传模式）。
pub fn acquire_camera(source: &mut dyn CameraSource, facing: FacingMode) -> Option<Box<dyn VideoStream>> {
    match source.open(facing) {
        Ok(stream) => {
            let (width, height) = stream.dimensions();
            log::info!("📷 摄像头已启动 - facing={} {}x{}", facing.as_str(), width, height);
            Some(stream)
        }
        Err(err) => {
            log::error!("📷 摄像头启动失败，降级为仅上传模式: {}", err);
            None
        }
    }
}

/// 不支持摄像头的平台。
#[derive(Debug, Default)]
pub struct Unsupported;

impl CameraSource for Unsupported {
    fn open(&mut self, _facing: FacingMode) -> Result<Box<dyn VideoStream>, MediaError> {
        Err(MediaError::Unavailable("当前环境不支持摄像头访问".to_string()))
    }
}

/// 以一张静态图片充当摄像头画面（终端环境 / 回放）。
#[derive(Debug, Clone)]
pub struct StillFrameCamera {
    path: PathBuf,
}

impl StillFrameCamera {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CameraSource for StillFrameCamera {
    fn open(&mut self, _facing: FacingMode) -> Result<Box<dyn VideoStream>, MediaError> {
        if !self.path.exists() {
            return Err(MediaError::Unavailable(format!(
                "画面文件不存在：{}",
                self.path.display()
            )));
        }
        let frame = image::open(&self.path)
            .map_err(|e| MediaError::Decode(format!("画面文件解码失败：{}", e)))?;
        Ok(Box::new(StillFrameStream::new(frame)))
    }
}

/// 每次抓帧都返回同一画面的视频流。
#[derive(Debug, Clone)]
pub struct StillFrameStream {
    frame: DynamicImage,
}

impl StillFrameStream {
    pub fn new(frame: DynamicImage) -> Self {
        Self { frame }
    }
}

impl VideoStream for StillFrameStream {
    fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn grab_frame(&mut self) -> Result<RgbaImage, MediaError> {
        Ok(self.frame.to_rgba8())
    }
}
