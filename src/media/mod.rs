//! # 媒体采集模块（media）
//!
//! ## 设计思路
//!
//! - `camera`：摄像头来源与视频流抽象；申请失败时降级为“仅上传”模式
//! - `capture`：抓取当前帧 → 可选降采样 → JPEG 编码
//! - `upload`：用户选择的本地文件 / Data URL 加载与图片签名校验
//!
//! 媒体层不关心视图，只返回 `Result`；降级与提示文案由页面层决定。

mod camera;
mod capture;
mod error;
mod upload;

pub use camera::{acquire_camera, CameraSource, FacingMode, StillFrameCamera, StillFrameStream, Unsupported, VideoStream};
pub use capture::{capture_frame, CapturedImage, CAPTURE_FILE_NAME, CAPTURE_MIME_TYPE};
pub use error::MediaError;
pub use upload::{load_upload, upload_from_data_url, UploadSelection};
