//! HTTP Cloning Client - 调用外部声音克隆 HTTP 服务
//!
//! 实现 CloningEnginePort trait，通过 HTTP 调用部署在 Modal 上的
//! Chatterbox TTS 端点。
//!
//! 外部克隆 API:
//! POST {base_url}/generate
//! Request: {"text": "...", "voice_b64": "...", "language": "en", "exaggeration": 0.5}  (JSON)
//! Response: audio/wav binary
//!
//! 服务端是同步一答模型：submit 内联完成整个请求并把结果登记到本地
//! 任务表，poll_status 随后立即报告 Succeeded。网络失败在 submit 处
//! 以 ServiceUnavailable 返回，调用方可按退避重试。结果在配置的保留
//! 期后过期。

use async_trait::async_trait;
use base64::Engine as _;
use dashmap::DashMap;
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::application::ports::{
    CloneAudio, CloneError, CloneRequest, CloneStatus, CloningEnginePort, JobHandle,
};
use crate::config::CloningConfig;

use super::wav_info;

/// 克隆请求体 (JSON)
#[derive(Debug, Serialize)]
struct GenerateHttpRequest {
    /// 要合成的故事全文
    text: String,
    /// base64 编码的参考声音样本
    voice_b64: String,
    /// 语言代码
    language: String,
    /// 情感强度 0.0 - 1.0
    exaggeration: f32,
}

/// HTTP 克隆客户端配置
#[derive(Debug, Clone)]
pub struct HttpCloningClientConfig {
    /// 克隆服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒），需覆盖整段合成耗时
    pub timeout_secs: u64,
    /// 上传 payload 最大大小（字节）
    pub max_upload_size: u64,
    /// 结果保留时间（秒）
    pub result_retention_secs: u64,
}

impl Default for HttpCloningClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            max_upload_size: 10 * 1024 * 1024,
            result_retention_secs: 300,
        }
    }
}

impl HttpCloningClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl From<&CloningConfig> for HttpCloningClientConfig {
    fn from(config: &CloningConfig) -> Self {
        Self {
            base_url: config.url.clone(),
            timeout_secs: config.timeout_secs,
            max_upload_size: config.max_upload_size,
            result_retention_secs: config.result_retention_secs,
        }
    }
}

/// 已完成任务的本地登记项
struct StoredJob {
    audio: CloneAudio,
    completed_at: Instant,
    cancelled: bool,
}

/// HTTP 克隆客户端
pub struct HttpCloningClient {
    client: Client,
    config: HttpCloningClientConfig,
    /// handle -> 已完成任务
    jobs: DashMap<String, StoredJob>,
}

impl HttpCloningClient {
    /// 创建新的 HTTP 克隆客户端
    pub fn new(config: HttpCloningClientConfig) -> Result<Self, CloneError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CloneError::ServiceUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            config,
            jobs: DashMap::new(),
        })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, CloneError> {
        Self::new(HttpCloningClientConfig::default())
    }

    /// 获取合成 URL
    fn generate_url(&self) -> String {
        format!("{}/generate", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    fn retention(&self) -> Duration {
        Duration::from_secs(self.config.result_retention_secs)
    }

    /// 清理超出保留期的登记项
    fn prune_expired(&self) {
        let retention = self.retention();
        self.jobs
            .retain(|_, job| job.completed_at.elapsed() <= retention);
    }

    /// 校验 payload，不合法的请求在发起网络调用前拒绝
    fn validate(&self, request: &CloneRequest) -> Result<(), CloneError> {
        if request.text.is_empty() {
            return Err(CloneError::UploadRejected("empty story text".to_string()));
        }
        if request.sample.is_empty() {
            return Err(CloneError::UploadRejected("empty voice sample".to_string()));
        }
        if request.sample.len() as u64 > self.config.max_upload_size {
            return Err(CloneError::UploadRejected(format!(
                "voice sample is {} bytes, limit is {}",
                request.sample.len(),
                self.config.max_upload_size
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CloningEnginePort for HttpCloningClient {
    async fn submit(&self, request: CloneRequest) -> Result<JobHandle, CloneError> {
        self.validate(&request)?;
        self.prune_expired();

        let body = GenerateHttpRequest {
            text: request.text,
            voice_b64: base64::engine::general_purpose::STANDARD.encode(request.sample.data()),
            language: request.language,
            exaggeration: request.exaggeration,
        };

        tracing::debug!(
            url = %self.generate_url(),
            text_len = body.text.len(),
            sample_bytes = request.sample.len(),
            language = %body.language,
            "Sending clone request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CloneError::ServiceUnavailable("request timed out".to_string())
                } else if e.is_connect() {
                    CloneError::ServiceUnavailable(format!(
                        "cannot connect to cloning service: {}",
                        e
                    ))
                } else {
                    CloneError::ServiceUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(if status.as_u16() == 429 {
                CloneError::RateLimited
            } else if status.is_client_error() {
                CloneError::UploadRejected(format!("HTTP {}: {}", status, error_text))
            } else {
                CloneError::ServiceUnavailable(format!("HTTP {}: {}", status, error_text))
            });
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| CloneError::ServiceUnavailable(format!("failed to read audio: {}", e)))?
            .to_vec();

        // 服务端不报告元数据，从 WAV 头解析
        let info = wav_info(&audio_data);
        let audio = CloneAudio {
            audio: audio_data,
            duration_secs: info.map(|i| i.duration_secs),
            sample_rate: info.map(|i| i.sample_rate),
        };

        let handle = JobHandle::new(Uuid::new_v4().to_string());
        tracing::info!(
            handle = %handle,
            audio_size = audio.audio.len(),
            duration_secs = ?audio.duration_secs,
            "Clone synthesis completed"
        );
        self.jobs.insert(
            handle.as_str().to_string(),
            StoredJob {
                audio,
                completed_at: Instant::now(),
                cancelled: false,
            },
        );
        Ok(handle)
    }

    async fn poll_status(&self, handle: &JobHandle) -> Result<CloneStatus, CloneError> {
        let job = self
            .jobs
            .get(handle.as_str())
            .ok_or(CloneError::ResultExpired)?;
        if job.cancelled || job.completed_at.elapsed() > self.retention() {
            return Err(CloneError::ResultExpired);
        }
        Ok(CloneStatus::Succeeded)
    }

    async fn fetch_result(&self, handle: &JobHandle) -> Result<CloneAudio, CloneError> {
        let job = self
            .jobs
            .get(handle.as_str())
            .ok_or(CloneError::ResultExpired)?;
        if job.cancelled || job.completed_at.elapsed() > self.retention() {
            return Err(CloneError::ResultExpired);
        }
        Ok(job.audio.clone())
    }

    async fn cancel(&self, handle: &JobHandle) {
        // 同步后端没有服务端任务可取消，只作本地标记；本地总是成功
        if let Some(mut job) = self.jobs.get_mut(handle.as_str()) {
            job.cancelled = true;
        }
        tracing::debug!(handle = %handle, "Clone job cancelled locally");
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::narration::{AudioCodec, VoiceSample};

    #[test]
    fn test_config_default() {
        let config = HttpCloningClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpCloningClientConfig::new("https://example.modal.run").with_timeout(60);
        assert_eq!(config.base_url, "https://example.modal.run");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_generate_request_wire_shape() {
        // 服务端契约: {"text", "voice_b64", "language", "exaggeration"}
        let body = GenerateHttpRequest {
            text: "Once upon a time.".to_string(),
            voice_b64: "c2FtcGxl".to_string(),
            language: "en".to_string(),
            exaggeration: 0.5,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["text"], "Once upon a time.");
        assert_eq!(value["voice_b64"], "c2FtcGxl");
        assert_eq!(value["language"], "en");
        assert_eq!(value["exaggeration"], 0.5);
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_url_building_trims_trailing_slash() {
        let client =
            HttpCloningClient::new(HttpCloningClientConfig::new("http://host:8000/")).unwrap();
        assert_eq!(client.generate_url(), "http://host:8000/generate");
        assert_eq!(client.health_url(), "http://host:8000/health");
    }

    fn request_with_sample(sample: VoiceSample) -> CloneRequest {
        CloneRequest {
            text: "Once upon a time.".to_string(),
            sample,
            language: "en".to_string(),
            exaggeration: 0.5,
        }
    }

    #[tokio::test]
    async fn test_oversized_sample_rejected_before_upload() {
        let mut config = HttpCloningClientConfig::default();
        config.max_upload_size = 16;
        let client = HttpCloningClient::new(config).unwrap();
        let sample = VoiceSample::new(vec![0u8; 64], 8.0, 16000, AudioCodec::Wav);

        let result = client.submit(request_with_sample(sample)).await;
        assert!(matches!(result, Err(CloneError::UploadRejected(_))));
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_upload() {
        let client = HttpCloningClient::with_default_config().unwrap();
        let sample = VoiceSample::new(vec![0u8; 64], 8.0, 16000, AudioCodec::Wav);
        let mut request = request_with_sample(sample);
        request.text = String::new();

        let result = client.submit(request).await;
        assert!(matches!(result, Err(CloneError::UploadRejected(_))));
    }

    #[tokio::test]
    async fn test_unknown_handle_is_expired() {
        let client = HttpCloningClient::with_default_config().unwrap();
        let handle = JobHandle::new("never-submitted");
        assert!(matches!(
            client.poll_status(&handle).await,
            Err(CloneError::ResultExpired)
        ));
        assert!(matches!(
            client.fetch_result(&handle).await,
            Err(CloneError::ResultExpired)
        ));
        // cancel 对未知句柄也本地成功
        client.cancel(&handle).await;
    }
}
