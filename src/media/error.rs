//! 媒体采集错误类型。

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("摄像头不可用：{0}")]
    Unavailable(String),

    #[error("视频流尚未就绪")]
    NotReady,

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}
