//! Audio Output Port - 音频输出抽象
//!
//! 定义播放后端的抽象接口，具体实现在 infrastructure/playback 层。
//! 输出设备是独占资源：stream 存活期间持有设备，drop 即释放。

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::narration::NarrationResult;

/// 播放错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("No audio loaded")]
    NotLoaded,

    #[error("Output device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Seek failed: {0}")]
    Seek(String),
}

/// 一段已打开的输出流
///
/// drop 时停止播放并释放输出设备
pub trait AudioOutputStream: Send {
    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError>;

    /// 当前播放位置（不要求采样级精确）
    fn position(&self) -> Duration;

    fn is_playing(&self) -> bool;

    /// 音频是否已播放到末尾
    fn is_finished(&self) -> bool;
}

/// Audio Output Port
#[async_trait]
pub trait AudioOutputPort: Send + Sync {
    /// 解码音频并打开输出流（初始为暂停状态）
    async fn open(
        &self,
        result: &NarrationResult,
    ) -> Result<Box<dyn AudioOutputStream>, PlaybackError>;
}
