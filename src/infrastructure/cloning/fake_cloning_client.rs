//! Fake Cloning Client - 用于测试与离线演示的克隆客户端
//!
//! 不调用真实服务；按脚本返回状态序列，可在测试里精确控制
//! 提交失败、卡在 Processing、服务端合成失败等路径。

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::{
    CloneAudio, CloneError, CloneRequest, CloneStatus, CloningEnginePort, JobHandle,
};

/// 单个假任务的脚本
#[derive(Debug, Clone)]
enum JobPlan {
    /// Queued → Processing → Succeeded
    Auto,
    /// Queued → Processing...（保持，直到 release_held_jobs）→ Succeeded
    Hold,
    /// 立即报告合成失败
    FailWith(String),
}

struct FakeJob {
    plan: JobPlan,
    polls: u32,
    released: bool,
    cancelled: bool,
}

/// Fake Cloning Client
pub struct FakeCloningClient {
    jobs: DashMap<String, FakeJob>,
    /// 接下来的 submit 调用依次消费的错误
    submit_errors: Mutex<VecDeque<CloneError>>,
    /// 接下来成功提交的任务依次使用的脚本
    pending_plans: Mutex<VecDeque<JobPlan>>,
    audio: Vec<u8>,
    duration_secs: f32,
    sample_rate: u32,
    submit_calls: AtomicU32,
    cancel_calls: AtomicU32,
}

impl FakeCloningClient {
    /// 默认返回 2 秒静音 WAV
    pub fn new() -> Self {
        Self::with_audio(Self::silent_wav(2.0, 16000), 2.0, 16000)
    }

    /// 指定返回的音频
    pub fn with_audio(audio: Vec<u8>, duration_secs: f32, sample_rate: u32) -> Self {
        Self {
            jobs: DashMap::new(),
            submit_errors: Mutex::new(VecDeque::new()),
            pending_plans: Mutex::new(VecDeque::new()),
            audio,
            duration_secs,
            sample_rate,
            submit_calls: AtomicU32::new(0),
            cancel_calls: AtomicU32::new(0),
        }
    }

    /// 生成一段静音 WAV（单声道 16-bit PCM）
    pub fn silent_wav(duration_secs: f32, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).expect("in-memory wav writer");
            let frames = (duration_secs * sample_rate as f32) as usize;
            for _ in 0..frames {
                writer.write_sample(0i16).expect("write silence");
            }
            writer.finalize().expect("finalize wav");
        }
        cursor.into_inner()
    }

    /// 下一次 submit 返回指定错误
    pub fn enqueue_submit_error(&self, error: CloneError) {
        self.submit_errors
            .lock()
            .expect("submit_errors lock")
            .push_back(error);
    }

    /// 下一个提交的任务停在 Processing，直到 release_held_jobs()
    pub fn hold_next_job(&self) {
        self.pending_plans
            .lock()
            .expect("pending_plans lock")
            .push_back(JobPlan::Hold);
    }

    /// 下一个提交的任务报告合成失败
    pub fn fail_next_job(&self, reason: &str) {
        self.pending_plans
            .lock()
            .expect("pending_plans lock")
            .push_back(JobPlan::FailWith(reason.to_string()));
    }

    /// 放行所有被 hold 的任务
    pub fn release_held_jobs(&self) {
        for mut job in self.jobs.iter_mut() {
            job.released = true;
        }
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> u32 {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    /// 指定句柄的任务是否收到过取消通知
    pub fn is_cancelled(&self, handle: &JobHandle) -> bool {
        self.jobs
            .get(handle.as_str())
            .map(|j| j.cancelled)
            .unwrap_or(false)
    }
}

impl Default for FakeCloningClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloningEnginePort for FakeCloningClient {
    async fn submit(&self, request: CloneRequest) -> Result<JobHandle, CloneError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self
            .submit_errors
            .lock()
            .expect("submit_errors lock")
            .pop_front()
        {
            return Err(error);
        }

        if request.sample.is_empty() {
            return Err(CloneError::UploadRejected("empty voice sample".to_string()));
        }
        if request.text.is_empty() {
            return Err(CloneError::UploadRejected("empty story text".to_string()));
        }

        let plan = self
            .pending_plans
            .lock()
            .expect("pending_plans lock")
            .pop_front()
            .unwrap_or(JobPlan::Auto);

        let handle = JobHandle::new(format!("fake-{}", Uuid::new_v4()));
        self.jobs.insert(
            handle.as_str().to_string(),
            FakeJob {
                plan,
                polls: 0,
                released: false,
                cancelled: false,
            },
        );
        tracing::debug!(handle = %handle, "FakeCloningClient: job submitted");
        Ok(handle)
    }

    async fn poll_status(&self, handle: &JobHandle) -> Result<CloneStatus, CloneError> {
        let mut job = self
            .jobs
            .get_mut(handle.as_str())
            .ok_or(CloneError::ResultExpired)?;
        job.polls += 1;

        let status = match &job.plan {
            JobPlan::Auto => match job.polls {
                1 => CloneStatus::Queued,
                2 => CloneStatus::Processing,
                _ => CloneStatus::Succeeded,
            },
            JobPlan::Hold => {
                if job.polls == 1 {
                    CloneStatus::Queued
                } else if job.released {
                    CloneStatus::Succeeded
                } else {
                    CloneStatus::Processing
                }
            }
            JobPlan::FailWith(reason) => CloneStatus::Failed(reason.clone()),
        };
        Ok(status)
    }

    async fn fetch_result(&self, handle: &JobHandle) -> Result<CloneAudio, CloneError> {
        let job = self
            .jobs
            .get(handle.as_str())
            .ok_or(CloneError::ResultExpired)?;
        if job.cancelled {
            return Err(CloneError::ResultExpired);
        }
        Ok(CloneAudio {
            audio: self.audio.clone(),
            duration_secs: Some(self.duration_secs),
            sample_rate: Some(self.sample_rate),
        })
    }

    async fn cancel(&self, handle: &JobHandle) {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(mut job) = self.jobs.get_mut(handle.as_str()) {
            job.cancelled = true;
        }
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::narration::{AudioCodec, VoiceSample};

    fn request() -> CloneRequest {
        CloneRequest {
            text: "Once upon a time.".to_string(),
            sample: VoiceSample::new(vec![0u8; 32], 8.0, 16000, AudioCodec::Wav),
            language: "en".to_string(),
            exaggeration: 0.5,
        }
    }

    #[tokio::test]
    async fn test_auto_plan_reaches_succeeded() {
        let client = FakeCloningClient::new();
        let handle = client.submit(request()).await.unwrap();

        assert!(matches!(
            client.poll_status(&handle).await.unwrap(),
            CloneStatus::Queued
        ));
        assert!(matches!(
            client.poll_status(&handle).await.unwrap(),
            CloneStatus::Processing
        ));
        assert!(matches!(
            client.poll_status(&handle).await.unwrap(),
            CloneStatus::Succeeded
        ));

        let audio = client.fetch_result(&handle).await.unwrap();
        assert!(!audio.audio.is_empty());
        assert_eq!(audio.duration_secs, Some(2.0));
    }

    #[tokio::test]
    async fn test_empty_sample_is_rejected() {
        let client = FakeCloningClient::new();
        let mut req = request();
        req.sample = VoiceSample::new(vec![], 0.0, 16000, AudioCodec::Wav);
        assert!(matches!(
            client.submit(req).await,
            Err(CloneError::UploadRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_marks_job_and_expires_result() {
        let client = FakeCloningClient::new();
        let handle = client.submit(request()).await.unwrap();
        client.cancel(&handle).await;
        assert!(client.is_cancelled(&handle));
        assert!(matches!(
            client.fetch_result(&handle).await,
            Err(CloneError::ResultExpired)
        ));
    }
}
