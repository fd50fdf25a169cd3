//! 条码识别错误类型。

#[derive(Debug, thiserror::Error)]
pub enum BarcodeError {
    #[error("条码引擎初始化失败：{0}")]
    EngineInit(String),

    #[error("无效条码：{0}")]
    InvalidCode(String),
}
