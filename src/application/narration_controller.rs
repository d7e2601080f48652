//! Narration Controller - 朗读流水线编排
//!
//! 持有唯一权威的任务状态机，驱动 采样 → 选故事 → 提交 → 轮询 → 取结果
//! 全流程。状态通过 watch 通道发布给表现层；所有克隆侧失败被吸收为
//! Failed(原因)，绝不跨异步边界抛出。
//!
//! 单活跃任务不变量: 新的 begin() 会先把未到终态的旧任务置为 Cancelled，
//! 再进入新任务的 Submitting。迟到的旧任务回调只按任务身份（JobId）比对
//! 后丢弃，不看状态字段，避免两个任务交错覆盖。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use crate::config::CloningConfig;
use crate::domain::narration::{
    FailureReason, JobId, JobState, NarrationJob, NarrationResult, VoiceSample,
};
use crate::domain::story::{StoryCatalog, StoryId};

use crate::application::ports::{
    CloneError, CloneRequest, CloneStatus, CloningEnginePort, JobHandle,
};

/// 控制器错误（本地、同步返回）
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// 流水线运行参数
#[derive(Debug, Clone)]
pub struct NarrationConfig {
    /// ServiceUnavailable 的最大重试次数（submit 与 poll 各自计数）
    pub max_retries: u32,
    /// 重试退避基准，按尝试次数指数增长
    pub retry_base: Duration,
    /// 重试退避上限
    pub retry_max: Duration,
    /// 状态轮询间隔
    pub poll_interval: Duration,
    /// Processing 超时上限
    pub processing_timeout: Duration,
    /// 情感强度，透传给克隆服务
    pub exaggeration: f32,
}

impl From<&CloningConfig> for NarrationConfig {
    fn from(config: &CloningConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_base: Duration::from_millis(config.retry_base_ms),
            retry_max: Duration::from_millis(config.retry_max_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            processing_timeout: Duration::from_secs(config.processing_timeout_secs),
            exaggeration: config.exaggeration,
        }
    }
}

/// 当前任务状态快照（watch 通道的载荷）
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub job_id: Option<JobId>,
    pub story_id: Option<StoryId>,
    pub state: JobState,
    pub failure: Option<FailureReason>,
    pub result: Option<Arc<NarrationResult>>,
}

impl Default for JobSnapshot {
    fn default() -> Self {
        Self {
            job_id: None,
            story_id: None,
            state: JobState::Idle,
            failure: None,
            result: None,
        }
    }
}

impl JobSnapshot {
    fn of(job: &NarrationJob) -> Self {
        Self {
            job_id: Some(job.id()),
            story_id: Some(job.story_id().clone()),
            state: job.state(),
            failure: job.failure().cloned(),
            result: job.result().cloned(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

struct ControllerInner {
    /// 所有任务（含历史终态任务，reset 时清空）
    jobs: HashMap<JobId, NarrationJob>,
    /// 当前任务；单会话至多一个非终态任务
    current: Option<JobId>,
    /// 已提交任务的服务端句柄
    handles: HashMap<JobId, JobHandle>,
}

struct ControllerShared {
    inner: Mutex<ControllerInner>,
    snapshot_tx: watch::Sender<JobSnapshot>,
}

impl ControllerShared {
    /// 仅当 job_id 仍是当前任务时应用变更并发布快照
    ///
    /// 以任务身份比对，不看状态字段：迟到的旧任务回调在这里被丢弃
    async fn apply_if_current<F>(&self, job_id: JobId, mutate: F) -> bool
    where
        F: FnOnce(&mut NarrationJob),
    {
        let mut inner = self.inner.lock().await;
        if inner.current != Some(job_id) {
            tracing::debug!(job_id = %job_id, "Stale job update discarded");
            return false;
        }
        let Some(job) = inner.jobs.get_mut(&job_id) else {
            return false;
        };
        if job.state().is_terminal() {
            tracing::debug!(job_id = %job_id, state = job.state().as_str(), "Job already terminal");
            return false;
        }
        mutate(job);
        let snapshot = JobSnapshot::of(job);
        let _ = self.snapshot_tx.send(snapshot);
        true
    }

    async fn is_current(&self, job_id: JobId) -> bool {
        let inner = self.inner.lock().await;
        inner.current == Some(job_id)
            && inner
                .jobs
                .get(&job_id)
                .map(|j| !j.state().is_terminal())
                .unwrap_or(false)
    }

    async fn register_handle(&self, job_id: JobId, handle: JobHandle) -> bool {
        let mut inner = self.inner.lock().await;
        let active = inner.current == Some(job_id)
            && inner
                .jobs
                .get(&job_id)
                .map(|j| !j.state().is_terminal())
                .unwrap_or(false);
        if active {
            inner.handles.insert(job_id, handle);
        }
        active
    }
}

/// 朗读流水线控制器
///
/// 独占持有 NarrationJob；表现层只通过 subscribe() 观察状态
pub struct NarrationController {
    catalog: Arc<StoryCatalog>,
    engine: Arc<dyn CloningEnginePort>,
    config: NarrationConfig,
    shared: Arc<ControllerShared>,
}

impl NarrationController {
    pub fn new(
        catalog: Arc<StoryCatalog>,
        engine: Arc<dyn CloningEnginePort>,
        config: NarrationConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(JobSnapshot::default());
        Self {
            catalog,
            engine,
            config,
            shared: Arc::new(ControllerShared {
                inner: Mutex::new(ControllerInner {
                    jobs: HashMap::new(),
                    current: None,
                    handles: HashMap::new(),
                }),
                snapshot_tx,
            }),
        }
    }

    /// 订阅任务状态变更
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// 当前快照
    pub fn snapshot(&self) -> JobSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// 查询任意任务（含已被替换的历史任务）的状态
    pub async fn job_state(&self, job_id: JobId) -> Option<JobState> {
        let inner = self.shared.inner.lock().await;
        inner.jobs.get(&job_id).map(|j| j.state())
    }

    /// 当前任务的合成结果（仅 Succeeded 后存在）
    pub fn current_result(&self) -> Option<Arc<NarrationResult>> {
        self.shared.snapshot_tx.borrow().result.clone()
    }

    /// 启动一次朗读任务
    ///
    /// - 样本缺失或故事不存在时返回 `InvalidInput`
    /// - 未到终态的旧任务先被置为 Cancelled，再进入新任务的 Submitting
    pub async fn begin(
        &self,
        sample: Option<VoiceSample>,
        story_id: &StoryId,
    ) -> Result<JobId, ControllerError> {
        let sample = sample.ok_or_else(|| {
            ControllerError::InvalidInput("no voice sample recorded".to_string())
        })?;
        let story = self.catalog.get(story_id).map_err(|e| {
            ControllerError::InvalidInput(e.to_string())
        })?;
        let text = story.full_text();
        let language = story.language().to_string();

        let job_id = {
            let mut inner = self.shared.inner.lock().await;

            // 先取消旧任务：Cancelled 必须先于新任务的 Submitting 被观察到
            if let Some(prev_id) = inner.current {
                let prev_handle = inner.handles.get(&prev_id).cloned();
                if let Some(prev) = inner.jobs.get_mut(&prev_id) {
                    if !prev.state().is_terminal() {
                        let _ = prev.cancel();
                        let _ = self.shared.snapshot_tx.send(JobSnapshot::of(prev));
                        tracing::info!(job_id = %prev_id, "Prior job cancelled by new begin()");
                        if let Some(handle) = prev_handle {
                            let engine = self.engine.clone();
                            tokio::spawn(async move {
                                engine.cancel(&handle).await;
                            });
                        }
                    }
                }
            }

            let mut job = NarrationJob::new(story_id.clone(), sample.clone());
            let job_id = job.id();
            // Idle -> Submitting 总是合法
            let _ = job.transition(JobState::Submitting);
            let _ = self.shared.snapshot_tx.send(JobSnapshot::of(&job));
            inner.jobs.insert(job_id, job);
            inner.current = Some(job_id);
            job_id
        };

        tracing::info!(job_id = %job_id, story_id = %story_id, "Narration job started");

        let shared = self.shared.clone();
        let engine = self.engine.clone();
        let config = self.config.clone();
        let request = CloneRequest {
            text,
            sample,
            language,
            exaggeration: config.exaggeration,
        };
        tokio::spawn(async move {
            drive_job(shared, engine, config, job_id, request).await;
        });

        Ok(job_id)
    }

    /// 显式取消当前任务
    pub async fn cancel(&self) {
        let mut inner = self.shared.inner.lock().await;
        let Some(job_id) = inner.current else {
            return;
        };
        let handle = inner.handles.get(&job_id).cloned();
        if let Some(job) = inner.jobs.get_mut(&job_id) {
            if !job.state().is_terminal() {
                let _ = job.cancel();
                let _ = self.shared.snapshot_tx.send(JobSnapshot::of(job));
                tracing::info!(job_id = %job_id, "Narration job cancelled");
                if let Some(handle) = handle {
                    let engine = self.engine.clone();
                    tokio::spawn(async move {
                        engine.cancel(&handle).await;
                    });
                }
            }
        }
    }

    /// 回到 Idle，丢弃任务与结果引用
    pub async fn reset(&self) {
        self.cancel().await;
        let mut inner = self.shared.inner.lock().await;
        inner.jobs.clear();
        inner.handles.clear();
        inner.current = None;
        let _ = self.shared.snapshot_tx.send(JobSnapshot::default());
        tracing::debug!("Controller reset to idle");
    }
}

/// 驱动单个任务的 submit / poll / fetch 序列
///
/// 每一步都先做任务身份检查；任务不再是当前任务时尽力通知服务端后退出
async fn drive_job(
    shared: Arc<ControllerShared>,
    engine: Arc<dyn CloningEnginePort>,
    config: NarrationConfig,
    job_id: JobId,
    request: CloneRequest,
) {
    // 提交（ServiceUnavailable 按退避重试）
    let handle = match retry_transient(&config, "submit", || engine.submit(request.clone())).await
    {
        Ok(handle) => handle,
        Err(e) => {
            fail_job(&shared, job_id, e.into()).await;
            return;
        }
    };

    if !shared.register_handle(job_id, handle.clone()).await {
        // 提交期间任务已被取消或替换，结果作废
        engine.cancel(&handle).await;
        return;
    }
    shared
        .apply_if_current(job_id, |job| {
            let _ = job.transition(JobState::Queued);
        })
        .await;

    let mut processing_since: Option<Instant> = None;
    loop {
        tokio::time::sleep(config.poll_interval).await;

        if !shared.is_current(job_id).await {
            engine.cancel(&handle).await;
            return;
        }

        let status = match retry_transient(&config, "poll", || engine.poll_status(&handle)).await {
            Ok(status) => status,
            Err(e) => {
                engine.cancel(&handle).await;
                fail_job(&shared, job_id, e.into()).await;
                return;
            }
        };

        match status {
            CloneStatus::Queued => {}
            CloneStatus::Processing => {
                match processing_since {
                    None => {
                        processing_since = Some(Instant::now());
                        shared
                            .apply_if_current(job_id, |job| {
                                let _ = job.transition(JobState::Processing);
                            })
                            .await;
                    }
                    Some(since) if since.elapsed() > config.processing_timeout => {
                        tracing::warn!(job_id = %job_id, "Processing exceeded ceiling");
                        engine.cancel(&handle).await;
                        fail_job(&shared, job_id, FailureReason::Timeout).await;
                        return;
                    }
                    Some(_) => {}
                }
            }
            CloneStatus::Succeeded => {
                let audio =
                    match retry_transient(&config, "fetch", || engine.fetch_result(&handle)).await
                    {
                        Ok(audio) => audio,
                        Err(e) => {
                            fail_job(&shared, job_id, e.into()).await;
                            return;
                        }
                    };
                let duration = audio.duration_secs.unwrap_or(0.0);
                let sample_rate = audio.sample_rate;
                let result = NarrationResult::new(job_id, audio.audio, duration, sample_rate);
                let applied = shared
                    .apply_if_current(job_id, |job| {
                        let _ = job.succeed(result);
                    })
                    .await;
                if applied {
                    tracing::info!(
                        job_id = %job_id,
                        duration_secs = duration,
                        "Narration synthesis completed"
                    );
                }
                return;
            }
            CloneStatus::Failed(reason) => {
                fail_job(&shared, job_id, FailureReason::SynthesisFailed(reason)).await;
                return;
            }
        }
    }
}

async fn fail_job(shared: &ControllerShared, job_id: JobId, reason: FailureReason) {
    let applied = shared
        .apply_if_current(job_id, |job| {
            let _ = job.fail(reason.clone());
        })
        .await;
    if applied {
        tracing::warn!(job_id = %job_id, reason = %reason, "Narration job failed");
    }
}

impl From<CloneError> for FailureReason {
    fn from(err: CloneError) -> Self {
        match err {
            CloneError::UploadRejected(detail) => Self::UploadRejected(detail),
            CloneError::RateLimited => Self::RateLimited,
            CloneError::ServiceUnavailable(detail) => Self::ServiceUnavailable(detail),
            CloneError::ResultExpired => Self::ResultExpired,
        }
    }
}

/// 对瞬时错误（ServiceUnavailable）做有界的指数退避重试
///
/// UploadRejected / RateLimited / ResultExpired 立即返回，不自动重试
async fn retry_transient<T, F, Fut>(
    config: &NarrationConfig,
    op: &'static str,
    mut call: F,
) -> Result<T, CloneError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, CloneError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                let backoff = config
                    .retry_base
                    .saturating_mul(1u32 << attempt.min(10))
                    .min(config.retry_max);
                attempt += 1;
                tracing::warn!(
                    op = op,
                    attempt = attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Transient cloning error, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}
