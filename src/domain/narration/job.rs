//! Narration Context - NarrationJob 聚合根与状态机

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::story::StoryId;

use super::{FailureReason, JobId, NarrationError, NarrationResult, VoiceSample};

/// 任务状态
///
/// 状态机:
/// `Idle → Submitting → Queued → Processing → Succeeded | Failed`
/// `Submitting/Queued/Processing → Cancelled`
///
/// 终态（Succeeded / Failed / Cancelled）不可再转出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// 尚未开始提交
    Idle,
    /// 正在提交样本与文本
    Submitting,
    /// 服务端已接收，排队中
    Queued,
    /// 服务端正在合成
    Processing,
    /// 合成完成（终态）
    Succeeded,
    /// 合成失败（终态，必须携带原因）
    Failed,
    /// 已取消（终态）
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    /// 状态机合法转换表
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Idle, Submitting) => true,
            (Submitting, Queued) => true,
            (Queued, Processing) => true,
            // 同步后端可能跳过 Processing 直接完成
            (Queued, Succeeded) | (Queued, Failed) => true,
            (Processing, Succeeded) | (Processing, Failed) => true,
            // 提交或轮询阶段的失败
            (Submitting, Failed) => true,
            (Submitting, Cancelled) | (Queued, Cancelled) | (Processing, Cancelled) => true,
            // 尚未提交就被新任务替换
            (Idle, Cancelled) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// 朗读任务聚合根
///
/// 不变量:
/// - 由 NarrationController 独占持有，同一会话至多一个非终态任务
/// - 终态不可转出；Failed 必须有非空 failure
/// - result 仅在 Succeeded 时存在，且 result.job_id == self.id
#[derive(Debug, Clone)]
pub struct NarrationJob {
    id: JobId,
    story_id: StoryId,
    sample: VoiceSample,
    state: JobState,
    submitted_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    result: Option<Arc<NarrationResult>>,
    failure: Option<FailureReason>,
}

impl NarrationJob {
    pub fn new(story_id: StoryId, sample: VoiceSample) -> Self {
        Self {
            id: JobId::new(),
            story_id,
            sample,
            state: JobState::Idle,
            submitted_at: Utc::now(),
            completed_at: None,
            result: None,
            failure: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn story_id(&self) -> &StoryId {
        &self.story_id
    }

    pub fn sample(&self) -> &VoiceSample {
        &self.sample
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn result(&self) -> Option<&Arc<NarrationResult>> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    /// 执行一次状态转换
    ///
    /// 终态拒绝任何转出请求
    pub fn transition(&mut self, next: JobState) -> Result<(), NarrationError> {
        if !self.state.can_transition_to(next) {
            return Err(NarrationError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// 进入 Succeeded 终态并记录结果
    pub fn succeed(&mut self, result: NarrationResult) -> Result<(), NarrationError> {
        debug_assert_eq!(result.job_id(), self.id);
        self.transition(JobState::Succeeded)?;
        self.result = Some(Arc::new(result));
        Ok(())
    }

    /// 进入 Failed 终态并记录原因
    pub fn fail(&mut self, reason: FailureReason) -> Result<(), NarrationError> {
        self.transition(JobState::Failed)?;
        self.failure = Some(reason);
        Ok(())
    }

    /// 进入 Cancelled 终态
    pub fn cancel(&mut self) -> Result<(), NarrationError> {
        self.transition(JobState::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::narration::AudioCodec;

    fn sample() -> VoiceSample {
        VoiceSample::new(vec![0u8; 64], 8.0, 24000, AudioCodec::Wav)
    }

    fn job() -> NarrationJob {
        NarrationJob::new(StoryId::new("snow-white"), sample())
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = job();
        assert_eq!(job.state(), JobState::Idle);
        job.transition(JobState::Submitting).unwrap();
        job.transition(JobState::Queued).unwrap();
        job.transition(JobState::Processing).unwrap();
        let result = NarrationResult::new(job.id(), vec![1, 2, 3], 90.0, Some(24000));
        job.succeed(result).unwrap();
        assert_eq!(job.state(), JobState::Succeeded);
        assert!(job.completed_at().is_some());
        assert_eq!(job.result().unwrap().job_id(), job.id());
    }

    #[test]
    fn test_no_transition_out_of_terminal_state() {
        let mut job = job();
        job.transition(JobState::Submitting).unwrap();
        job.cancel().unwrap();
        assert!(job.transition(JobState::Queued).is_err());
        assert!(job.fail(FailureReason::Timeout).is_err());
        assert_eq!(job.state(), JobState::Cancelled);
    }

    #[test]
    fn test_failed_carries_reason() {
        let mut job = job();
        job.transition(JobState::Submitting).unwrap();
        job.fail(FailureReason::ServiceUnavailable("down".to_string()))
            .unwrap();
        assert_eq!(job.state(), JobState::Failed);
        assert!(job.failure().is_some());
    }

    #[test]
    fn test_cannot_skip_submitting() {
        let mut job = job();
        assert!(job.transition(JobState::Processing).is_err());
        assert!(job.transition(JobState::Succeeded).is_err());
        assert_eq!(job.state(), JobState::Idle);
    }

    #[test]
    fn test_cancel_from_every_non_terminal_state() {
        for target in [
            JobState::Idle,
            JobState::Submitting,
            JobState::Queued,
            JobState::Processing,
        ] {
            let mut job = job();
            for step in [JobState::Submitting, JobState::Queued, JobState::Processing] {
                if job.state() == target {
                    break;
                }
                job.transition(step).unwrap();
            }
            assert!(job.cancel().is_ok(), "cancel from {:?}", target);
        }
    }
}
