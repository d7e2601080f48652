//! Narration Context - Value Objects

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// 朗读任务唯一标识（本地生成）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 音频编码格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Wav,
    Webm,
}

impl AudioCodec {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Webm => "audio/webm",
        }
    }
}

/// 声音样本
///
/// 不变量:
/// - 创建后不可变；重新录音或会话结束时整体丢弃
/// - duration 由采集端保证落在配置区间内
/// - codec 是克隆服务可接受的格式
#[derive(Debug, Clone)]
pub struct VoiceSample {
    data: Arc<Vec<u8>>,
    duration_secs: f32,
    sample_rate: u32,
    codec: AudioCodec,
}

impl VoiceSample {
    pub fn new(data: Vec<u8>, duration_secs: f32, sample_rate: u32, codec: AudioCodec) -> Self {
        Self {
            data: Arc::new(data),
            duration_secs,
            sample_rate,
            codec,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn codec(&self) -> AudioCodec {
        self.codec
    }
}

/// 合成完成的朗读音频
#[derive(Debug, Clone)]
pub struct NarrationResult {
    job_id: JobId,
    audio: Arc<Vec<u8>>,
    duration_secs: f32,
    sample_rate: Option<u32>,
}

impl NarrationResult {
    pub fn new(job_id: JobId, audio: Vec<u8>, duration_secs: f32, sample_rate: Option<u32>) -> Self {
        Self {
            job_id,
            audio: Arc::new(audio),
            duration_secs,
            sample_rate,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn audio(&self) -> &[u8] {
        &self.audio
    }

    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }
}

/// 任务失败原因
///
/// 不变量: Failed 终态必须携带非空原因，该枚举按构造保证这一点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// 上传被服务端拒绝（payload 非法或超限）
    UploadRejected(String),
    /// 服务端限流
    RateLimited,
    /// 网络或服务端暂时不可用（重试耗尽后）
    ServiceUnavailable(String),
    /// 结果超出服务端保留期
    ResultExpired,
    /// Processing 超过配置上限
    Timeout,
    /// 服务端报告的合成失败
    SynthesisFailed(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UploadRejected(detail) => write!(f, "upload rejected: {}", detail),
            Self::RateLimited => write!(f, "rate limited by cloning service"),
            Self::ServiceUnavailable(detail) => write!(f, "service unavailable: {}", detail),
            Self::ResultExpired => write!(f, "result expired before fetch"),
            Self::Timeout => write!(f, "processing exceeded the configured ceiling"),
            Self::SynthesisFailed(detail) => write!(f, "synthesis failed: {}", detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_sample_accessors() {
        let sample = VoiceSample::new(vec![1, 2, 3], 8.0, 24000, AudioCodec::Wav);
        assert_eq!(sample.len(), 3);
        assert_eq!(sample.duration_secs(), 8.0);
        assert_eq!(sample.codec().mime_type(), "audio/wav");
    }

    #[test]
    fn test_failure_reason_display_is_non_empty() {
        let reasons = [
            FailureReason::UploadRejected("too large".to_string()),
            FailureReason::RateLimited,
            FailureReason::ServiceUnavailable("connect refused".to_string()),
            FailureReason::ResultExpired,
            FailureReason::Timeout,
            FailureReason::SynthesisFailed("oom".to_string()),
        ];
        for reason in reasons {
            assert!(!reason.to_string().is_empty());
        }
    }
}
