//! Audio Capture Port - 麦克风采集抽象
//!
//! 定义声音样本采集的抽象接口，具体实现在 infrastructure/capture 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::narration::VoiceSample;

/// 采集错误
///
/// 全部为本地错误，直接返回给调用方，不经过任务状态机
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No usable input device: {0}")]
    DeviceUnavailable(String),

    #[error("A capture is already in progress")]
    CaptureInProgress,

    #[error("Captured {got:.1}s, minimum is {min:.1}s")]
    TooShort { got: f32, min: f32 },

    #[error("No capture in progress")]
    NotRecording,
}

/// Audio Capture Port
///
/// 麦克风是独占资源：同一时间至多一个活跃采集，
/// 且在 stop / cancel / error 的每条退出路径上都必须释放设备。
#[async_trait]
pub trait AudioCapturePort: Send + Sync {
    /// 开始录音
    ///
    /// 失败:
    /// - `PermissionDenied` - 麦克风权限被拒绝
    /// - `DeviceUnavailable` - 没有可用输入设备
    /// - `CaptureInProgress` - 已有采集在进行中
    async fn start_recording(&self) -> Result<(), CaptureError>;

    /// 结束录音并返回样本
    ///
    /// 时长低于配置下限时返回 `TooShort`（在上传之前拒绝），
    /// 超过上限的部分被截断。两种情况下设备都已释放。
    async fn stop_recording(&self) -> Result<VoiceSample, CaptureError>;

    /// 丢弃进行中的采集，无副作用
    async fn cancel(&self);
}
