//! Cloning Engine Port - 声音克隆服务抽象
//!
//! 定义外部克隆服务的抽象接口，具体实现在 infrastructure/cloning 层。
//! 服务端可能是异步任务模型，也可能是同步一答模型；适配器负责把两者
//! 都映射到 submit / poll_status / fetch_result / cancel 的任务接口上。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::narration::VoiceSample;

/// 克隆服务错误
#[derive(Debug, Clone, Error)]
pub enum CloneError {
    /// payload 非法或超限，不可自动重试
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    /// 服务端限流，不可自动重试
    #[error("Rate limited by cloning service")]
    RateLimited,

    /// 网络或服务端瞬时故障，可重试
    #[error("Cloning service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 结果已超出服务端保留期
    #[error("Result expired")]
    ResultExpired,
}

impl CloneError {
    /// 是否为可自动重试的瞬时错误
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}

/// 服务端任务句柄
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 克隆请求
#[derive(Debug, Clone)]
pub struct CloneRequest {
    /// 要朗读的完整故事文本
    pub text: String,
    /// 用户的声音样本
    pub sample: VoiceSample,
    /// 语言代码（en, he, es, fr, ar, ru, pt, zh）
    pub language: String,
    /// 情感强度 (0.0 - 1.0)
    pub exaggeration: f32,
}

/// 服务端任务状态
#[derive(Debug, Clone)]
pub enum CloneStatus {
    /// 已接收，排队中
    Queued,
    /// 正在合成
    Processing,
    /// 合成完成，可以 fetch_result
    Succeeded,
    /// 服务端报告合成失败
    Failed(String),
}

/// 合成得到的音频
#[derive(Debug, Clone)]
pub struct CloneAudio {
    /// WAV 音频数据
    pub audio: Vec<u8>,
    /// 音频时长（秒），服务端未报告时为 None
    pub duration_secs: Option<f32>,
    /// 采样率
    pub sample_rate: Option<u32>,
}

/// Cloning Engine Port
#[async_trait]
pub trait CloningEnginePort: Send + Sync {
    /// 提交样本与故事文本，返回任务句柄
    ///
    /// 失败:
    /// - `UploadRejected` - payload 非法或超限
    /// - `RateLimited` - 服务端限流
    /// - `ServiceUnavailable` - 网络或服务端故障（调用方可重试）
    async fn submit(&self, request: CloneRequest) -> Result<JobHandle, CloneError>;

    /// 查询任务状态
    async fn poll_status(&self, handle: &JobHandle) -> Result<CloneStatus, CloneError>;

    /// 取回合成结果
    ///
    /// 超出服务端保留期时返回 `ResultExpired`
    async fn fetch_result(&self, handle: &JobHandle) -> Result<CloneAudio, CloneError>;

    /// 尽力通知服务端放弃任务
    ///
    /// 无论服务端是否确认，本地都视为成功：本地状态不依赖服务端确认
    async fn cancel(&self, handle: &JobHandle);

    /// 检查服务是否可用（也可用于预热容器）
    async fn health_check(&self) -> bool {
        true
    }
}
