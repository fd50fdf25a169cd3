//! # 条码识别引擎抽象
//!
//! ## 设计思路
//!
//! 符号解码属于外部协作方，这里只约定引擎的生命周期：
//! - `init` 按解码配置启动引擎，返回一个“识别事件订阅”（`DetectionStream`）
//! - `stop` 停止引擎；订阅随之结束（`next()` 返回 `None`）
//!
//! 订阅基于 tokio 无界 mpsc：引擎持有 `DetectionSink`，丢弃即结束订阅。
//!
//! ## 键盘楔形引擎
//!
//! 硬件扫码枪以“键入条码 + 回车”的方式工作。`KeyboardWedgeEngine` 在首次 `init`
//! 时启动一个后台逐行读取任务，之后每一行都转发到当前活跃的订阅；
//! 未扫描期间读到的行直接丢弃。输入结束（EOF）后引擎不可再次启动。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::BarcodeError;
use crate::media::FacingMode;

/// 支持的条码符号体系。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    Ean,
    Code128,
}

impl Symbology {
    /// 解码引擎中的读取器名称。
    pub fn reader_name(self) -> &'static str {
        match self {
            Self::Ean => "ean_reader",
            Self::Code128 => "code_128_reader",
        }
    }
}

/// 固定的解码配置：EAN + Code 128，后置摄像头，目标区域与容器同尺寸。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    pub readers: Vec<Symbology>,
    pub facing: FacingMode,
    pub target_width: u32,
    pub target_height: u32,
}

impl DecoderConfig {
    pub fn for_container((target_width, target_height): (u32, u32)) -> Self {
        Self {
            target_width,
            target_height,
            ..Self::default()
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            readers: vec![Symbology::Ean, Symbology::Code128],
            facing: FacingMode::Environment,
            target_width: 640,
            target_height: 480,
        }
    }
}

/// 引擎上报的一次解码结果（未校验）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBarcode {
    pub code: String,
    pub symbology: Option<Symbology>,
}

impl DecodedBarcode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            symbology: None,
        }
    }
}

/// 引擎侧的事件发送端。
#[derive(Debug, Clone)]
pub struct DetectionSink {
    tx: mpsc::UnboundedSender<DecodedBarcode>,
}

impl DetectionSink {
    /// 发送失败（订阅方已丢弃）时返回 `false`。
    pub fn send(&self, detection: DecodedBarcode) -> bool {
        self.tx.send(detection).is_ok()
    }
}

/// 页面侧的识别事件订阅。
#[derive(Debug)]
pub struct DetectionStream {
    rx: mpsc::UnboundedReceiver<DecodedBarcode>,
}

impl DetectionStream {
    /// 下一次识别；引擎停止后返回 `None`。
    pub async fn next(&mut self) -> Option<DecodedBarcode> {
        self.rx.recv().await
    }
}

pub fn detection_channel() -> (DetectionSink, DetectionStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DetectionSink { tx }, DetectionStream { rx })
}

/// 条码识别引擎。
pub trait DetectionEngine {
    fn init(&mut self, config: &DecoderConfig) -> Result<DetectionStream, BarcodeError>;

    fn stop(&mut self);
}

/// 没有可用识别引擎的环境。
#[derive(Debug, Default)]
pub struct UnavailableEngine;

impl DetectionEngine for UnavailableEngine {
    fn init(&mut self, _config: &DecoderConfig) -> Result<DetectionStream, BarcodeError> {
        Err(BarcodeError::EngineInit("当前环境没有可用的条码识别引擎".to_string()))
    }

    fn stop(&mut self) {}
}

type SharedSink = Arc<Mutex<Option<DetectionSink>>>;

/// 从逐行输入读取条码的引擎（扫码枪 / 标准输入）。
pub struct KeyboardWedgeEngine<R> {
    reader: Option<R>,
    active: SharedSink,
    exhausted: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl<R> KeyboardWedgeEngine<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            active: Arc::new(Mutex::new(None)),
            exhausted: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    fn spawn_reader(&mut self) -> Result<(), BarcodeError> {
        if self.task.is_some() {
            return Ok(());
        }

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| BarcodeError::EngineInit(format!("缺少 tokio 运行时：{}", e)))?;
        let reader = self
            .reader
            .take()
            .ok_or_else(|| BarcodeError::EngineInit("输入源已被占用".to_string()))?;

        let active = Arc::clone(&self.active);
        let exhausted = Arc::clone(&self.exhausted);

        self.task = Some(handle.spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let guard = lock_sink(&active);
                        match guard.as_ref() {
                            Some(sink) => {
                                sink.send(DecodedBarcode::new(line));
                            }
                            None => log::debug!("⌨️ 未在扫描状态，丢弃输入行"),
                        }
                    }
                    Ok(None) => {
                        log::info!("⌨️ 条码输入已结束");
                        break;
                    }
                    Err(err) => {
                        log::error!("⌨️ 读取条码输入失败: {}", err);
                        break;
                    }
                }
            }
            exhausted.store(true, Ordering::SeqCst);
            lock_sink(&active).take();
        }));

        Ok(())
    }
}

impl<R> DetectionEngine for KeyboardWedgeEngine<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    fn init(&mut self, config: &DecoderConfig) -> Result<DetectionStream, BarcodeError> {
        if self.exhausted.load(Ordering::SeqCst) {
            return Err(BarcodeError::EngineInit("条码输入已结束".to_string()));
        }
        self.spawn_reader()?;

        let (sink, stream) = detection_channel();
        *lock_sink(&self.active) = Some(sink);

        let readers: Vec<&str> = config.readers.iter().map(|r| r.reader_name()).collect();
        log::info!(
            "⌨️ 键盘楔形引擎已启动 - readers={:?} target={}x{}",
            readers,
            config.target_width,
            config.target_height
        );
        Ok(stream)
    }

    fn stop(&mut self) {
        if lock_sink(&self.active).take().is_some() {
            log::info!("⌨️ 键盘楔形引擎已停止");
        }
    }
}

impl<R> Drop for KeyboardWedgeEngine<R> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn lock_sink(active: &SharedSink) -> MutexGuard<'_, Option<DetectionSink>> {
    match active.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("⚠️ 条码订阅锁已中毒，继续使用内部数据");
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn default_decoder_config_reads_ean_and_code128_from_rear_camera() {
        let config = DecoderConfig::for_container((800, 600));

        assert_eq!(config.readers, vec![Symbology::Ean, Symbology::Code128]);
        assert_eq!(config.facing, FacingMode::Environment);
        assert_eq!((config.target_width, config.target_height), (800, 600));
        assert_eq!(
            config.readers.iter().map(|r| r.reader_name()).collect::<Vec<_>>(),
            vec!["ean_reader", "code_128_reader"]
        );
    }

    #[test]
    fn wedge_engine_requires_runtime() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut engine = KeyboardWedgeEngine::new(reader);

        assert!(matches!(
            engine.init(&DecoderConfig::default()),
            Err(BarcodeError::EngineInit(_))
        ));
    }

    #[tokio::test]
    async fn wedge_engine_forwards_lines_until_stopped() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut engine = KeyboardWedgeEngine::new(reader);
        let mut stream = engine.init(&DecoderConfig::default()).expect("init");

        writer.write_all(b"4006381333931\n").await.expect("write");
        assert_eq!(stream.next().await, Some(DecodedBarcode::new("4006381333931")));

        engine.stop();
        assert_eq!(stream.next().await, None);

        let mut restarted = engine.init(&DecoderConfig::default()).expect("re-init");
        writer.write_all(b"96385074\n").await.expect("write");
        assert_eq!(restarted.next().await, Some(DecodedBarcode::new("96385074")));
    }

    #[tokio::test]
    async fn wedge_engine_cannot_restart_after_eof() {
        let (writer, reader) = tokio::io::duplex(64);
        let mut engine = KeyboardWedgeEngine::new(reader);
        let mut stream = engine.init(&DecoderConfig::default()).expect("init");

        drop(writer);
        assert_eq!(stream.next().await, None);
        assert!(matches!(
            engine.init(&DecoderConfig::default()),
            Err(BarcodeError::EngineInit(_))
        ));
    }

    #[test]
    fn unavailable_engine_never_starts() {
        assert!(UnavailableEngine.init(&DecoderConfig::default()).is_err());
    }
}
