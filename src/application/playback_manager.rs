//! Playback Manager - 播放控制
//!
//! 接管合成完成的 NarrationResult 并驱动播放，与音频的生产方式无关。
//! 输出设备只在 load 到 stop（或换载）之间被持有；进度通过 watch
//! 通道周期性发布，不要求采样级精确。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::PlaybackConfig;
use crate::domain::narration::{JobId, NarrationResult};

use crate::application::ports::{AudioOutputPort, AudioOutputStream, PlaybackError};

/// 播放进度快照（watch 通道的载荷）
#[derive(Debug, Clone, Default)]
pub struct PlaybackPosition {
    pub position_secs: f32,
    pub duration_secs: f32,
    pub playing: bool,
    pub finished: bool,
}

struct LoadedPlayback {
    stream: Box<dyn AudioOutputStream>,
    job_id: JobId,
    duration_secs: f32,
    ticker: JoinHandle<()>,
}

impl LoadedPlayback {
    fn position(&self) -> PlaybackPosition {
        PlaybackPosition {
            position_secs: self.stream.position().as_secs_f32(),
            duration_secs: self.duration_secs,
            playing: self.stream.is_playing(),
            finished: self.stream.is_finished(),
        }
    }
}

/// 播放管理器
///
/// load 之前的任何传输控制都返回 NotLoaded；play 对已在播放的音频
/// 是幂等的
pub struct PlaybackManager {
    output: Arc<dyn AudioOutputPort>,
    loaded: Arc<Mutex<Option<LoadedPlayback>>>,
    position_tx: watch::Sender<PlaybackPosition>,
    tick: Duration,
}

impl PlaybackManager {
    pub fn new(output: Arc<dyn AudioOutputPort>, config: &PlaybackConfig) -> Self {
        let (position_tx, _) = watch::channel(PlaybackPosition::default());
        Self {
            output,
            loaded: Arc::new(Mutex::new(None)),
            position_tx,
            tick: Duration::from_millis(config.position_interval_ms),
        }
    }

    /// 订阅播放进度
    pub fn subscribe_position(&self) -> watch::Receiver<PlaybackPosition> {
        self.position_tx.subscribe()
    }

    /// 准备播放一段合成结果
    ///
    /// 已有载入的音频时先停止并释放，再打开新的输出流（初始为暂停）
    pub async fn load(&self, result: &NarrationResult) -> Result<(), PlaybackError> {
        let stream = self.output.open(result).await?;

        let mut loaded = self.loaded.lock().await;
        if let Some(prev) = loaded.take() {
            prev.ticker.abort();
            drop(prev.stream);
            tracing::debug!(job_id = %prev.job_id, "Previous playback released");
        }

        let ticker = self.spawn_ticker();
        let playback = LoadedPlayback {
            stream,
            job_id: result.job_id(),
            duration_secs: result.duration_secs(),
            ticker,
        };
        let _ = self.position_tx.send(playback.position());
        *loaded = Some(playback);

        tracing::info!(
            job_id = %result.job_id(),
            duration_secs = result.duration_secs(),
            "Narration loaded for playback"
        );
        Ok(())
    }

    /// 开始或继续播放
    ///
    /// 已在播放时为 no-op，绝不回到位置零
    pub async fn play(&self) -> Result<(), PlaybackError> {
        let mut loaded = self.loaded.lock().await;
        let playback = loaded.as_mut().ok_or(PlaybackError::NotLoaded)?;
        if !playback.stream.is_playing() {
            playback.stream.play();
        }
        let _ = self.position_tx.send(playback.position());
        Ok(())
    }

    /// 暂停播放
    pub async fn pause(&self) -> Result<(), PlaybackError> {
        let mut loaded = self.loaded.lock().await;
        let playback = loaded.as_mut().ok_or(PlaybackError::NotLoaded)?;
        playback.stream.pause();
        let _ = self.position_tx.send(playback.position());
        Ok(())
    }

    /// 跳转到指定位置（秒）
    ///
    /// 非有限输入被拒绝；越界位置被钳制到 [0, duration]
    pub async fn seek(&self, position_secs: f32) -> Result<(), PlaybackError> {
        if !position_secs.is_finite() {
            return Err(PlaybackError::Seek(format!(
                "invalid seek position: {}",
                position_secs
            )));
        }
        let mut loaded = self.loaded.lock().await;
        let playback = loaded.as_mut().ok_or(PlaybackError::NotLoaded)?;
        let clamped = position_secs.clamp(0.0, playback.duration_secs.max(0.0));
        playback.stream.seek(Duration::from_secs_f32(clamped))?;
        let _ = self.position_tx.send(playback.position());
        Ok(())
    }

    /// 停止播放并释放输出设备
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        let mut loaded = self.loaded.lock().await;
        let playback = loaded.take().ok_or(PlaybackError::NotLoaded)?;
        playback.ticker.abort();
        drop(playback.stream);
        let _ = self.position_tx.send(PlaybackPosition::default());
        tracing::info!("Playback stopped");
        Ok(())
    }

    /// 当前进度
    pub async fn position(&self) -> Result<PlaybackPosition, PlaybackError> {
        let loaded = self.loaded.lock().await;
        let playback = loaded.as_ref().ok_or(PlaybackError::NotLoaded)?;
        Ok(playback.position())
    }

    /// 是否有已载入的音频
    pub async fn is_loaded(&self) -> bool {
        self.loaded.lock().await.is_some()
    }

    /// 周期性发布进度的后台任务
    fn spawn_ticker(&self) -> JoinHandle<()> {
        let loaded = self.loaded.clone();
        let position_tx = self.position_tx.clone();
        let tick = self.tick;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(tick).await;
                let guard = loaded.lock().await;
                match guard.as_ref() {
                    Some(playback) => {
                        let _ = position_tx.send(playback.position());
                    }
                    None => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    /// 测试用输出后端：纯内存状态，无设备依赖
    struct FakeOutput {
        open_calls: AtomicU32,
        fail_open: bool,
    }

    impl FakeOutput {
        fn new() -> Self {
            Self {
                open_calls: AtomicU32::new(0),
                fail_open: false,
            }
        }

        fn failing() -> Self {
            Self {
                open_calls: AtomicU32::new(0),
                fail_open: true,
            }
        }
    }

    #[async_trait]
    impl AudioOutputPort for FakeOutput {
        async fn open(
            &self,
            _result: &NarrationResult,
        ) -> Result<Box<dyn AudioOutputStream>, PlaybackError> {
            self.open_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_open {
                return Err(PlaybackError::DeviceUnavailable("no device".to_string()));
            }
            Ok(Box::new(FakeStream {
                playing: false,
                position: StdMutex::new(Duration::ZERO),
            }))
        }
    }

    struct FakeStream {
        playing: bool,
        position: StdMutex<Duration>,
    }

    impl AudioOutputStream for FakeStream {
        fn play(&mut self) {
            self.playing = true;
        }

        fn pause(&mut self) {
            self.playing = false;
        }

        fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
            *self.position.lock().unwrap() = position;
            Ok(())
        }

        fn position(&self) -> Duration {
            *self.position.lock().unwrap()
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn is_finished(&self) -> bool {
            false
        }
    }

    fn result_90s() -> NarrationResult {
        NarrationResult::new(JobId::new(), vec![0u8; 256], 90.0, Some(8000))
    }

    fn manager() -> PlaybackManager {
        PlaybackManager::new(
            Arc::new(FakeOutput::new()),
            &PlaybackConfig {
                position_interval_ms: 5,
            },
        )
    }

    #[tokio::test]
    async fn test_controls_before_load_fail_with_not_loaded() {
        let manager = manager();
        assert!(matches!(manager.play().await, Err(PlaybackError::NotLoaded)));
        assert!(matches!(
            manager.pause().await,
            Err(PlaybackError::NotLoaded)
        ));
        assert!(matches!(
            manager.seek(1.0).await,
            Err(PlaybackError::NotLoaded)
        ));
        assert!(matches!(manager.stop().await, Err(PlaybackError::NotLoaded)));
        assert!(matches!(
            manager.position().await,
            Err(PlaybackError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn test_load_then_play_transitions_to_playing() {
        let manager = manager();
        manager.load(&result_90s()).await.unwrap();

        let position = manager.position().await.unwrap();
        assert!(!position.playing);
        assert_eq!(position.duration_secs, 90.0);

        manager.play().await.unwrap();
        let position = manager.position().await.unwrap();
        assert!(position.playing);
        assert_eq!(position.position_secs, 0.0);
    }

    #[tokio::test]
    async fn test_repeated_play_never_rewinds() {
        let manager = manager();
        manager.load(&result_90s()).await.unwrap();

        manager.play().await.unwrap();
        manager.seek(5.0).await.unwrap();
        manager.play().await.unwrap();
        manager.play().await.unwrap();

        let position = manager.position().await.unwrap();
        assert!(position.playing);
        assert_eq!(position.position_secs, 5.0);
    }

    #[tokio::test]
    async fn test_seek_rejects_non_finite_positions() {
        let manager = manager();
        manager.load(&result_90s()).await.unwrap();
        manager.play().await.unwrap();
        manager.seek(5.0).await.unwrap();

        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(matches!(
                manager.seek(bad).await,
                Err(PlaybackError::Seek(_))
            ));
        }
        // 被拒绝的 seek 不改变位置
        let position = manager.position().await.unwrap();
        assert_eq!(position.position_secs, 5.0);
    }

    #[tokio::test]
    async fn test_seek_clamps_to_duration_bounds() {
        let manager = manager();
        manager.load(&result_90s()).await.unwrap();

        manager.seek(1000.0).await.unwrap();
        let position = manager.position().await.unwrap();
        assert_eq!(position.position_secs, 90.0);

        manager.seek(-10.0).await.unwrap();
        let position = manager.position().await.unwrap();
        assert_eq!(position.position_secs, 0.0);
    }

    #[tokio::test]
    async fn test_stop_releases_and_requires_reload() {
        let manager = manager();
        manager.load(&result_90s()).await.unwrap();
        manager.play().await.unwrap();
        manager.stop().await.unwrap();

        assert!(!manager.is_loaded().await);
        assert!(matches!(manager.play().await, Err(PlaybackError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_loading_new_result_replaces_previous() {
        let output = Arc::new(FakeOutput::new());
        let manager = PlaybackManager::new(
            output.clone(),
            &PlaybackConfig {
                position_interval_ms: 5,
            },
        );

        manager.load(&result_90s()).await.unwrap();
        manager.play().await.unwrap();
        manager.seek(30.0).await.unwrap();

        manager.load(&result_90s()).await.unwrap();
        assert_eq!(output.open_calls.load(Ordering::SeqCst), 2);
        // 新载入的音频回到暂停、位置零
        let position = manager.position().await.unwrap();
        assert!(!position.playing);
        assert_eq!(position.position_secs, 0.0);
    }

    #[tokio::test]
    async fn test_failed_open_leaves_nothing_loaded() {
        let manager = PlaybackManager::new(
            Arc::new(FakeOutput::failing()),
            &PlaybackConfig {
                position_interval_ms: 5,
            },
        );
        assert!(matches!(
            manager.load(&result_90s()).await,
            Err(PlaybackError::DeviceUnavailable(_))
        ));
        assert!(!manager.is_loaded().await);
    }

    #[tokio::test]
    async fn test_position_updates_are_published() {
        let manager = manager();
        let mut rx = manager.subscribe_position();
        manager.load(&result_90s()).await.unwrap();
        manager.play().await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                rx.changed().await.unwrap();
                let position = rx.borrow().clone();
                if position.playing {
                    return;
                }
            }
        })
        .await
        .expect("no position update arrived");
    }

    /// 端到端场景: 8 秒样本 + snow-white + 90 秒合成结果 →
    /// 任务 Succeeded，load 成功，play 进入播放
    #[tokio::test]
    async fn test_full_pipeline_scenario() {
        use crate::application::{NarrationConfig, NarrationController};
        use crate::domain::narration::{AudioCodec, JobState, VoiceSample};
        use crate::domain::story::{StoryCatalog, StoryId};
        use crate::infrastructure::cloning::FakeCloningClient;

        let audio = FakeCloningClient::silent_wav(90.0, 8000);
        let engine = Arc::new(FakeCloningClient::with_audio(audio, 90.0, 8000));
        let controller = NarrationController::new(
            Arc::new(StoryCatalog::builtin()),
            engine,
            NarrationConfig {
                max_retries: 3,
                retry_base: Duration::from_millis(1),
                retry_max: Duration::from_millis(4),
                poll_interval: Duration::from_millis(2),
                processing_timeout: Duration::from_secs(30),
                exaggeration: 0.5,
            },
        );
        let mut rx = controller.subscribe();

        let sample = VoiceSample::new(vec![0u8; 2048], 8.0, 24000, AudioCodec::Wav);
        let job_id = controller
            .begin(Some(sample), &StoryId::new("snow-white"))
            .await
            .unwrap();

        let snapshot = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                {
                    let snapshot = rx.borrow_and_update().clone();
                    if snapshot.is_terminal() {
                        return snapshot;
                    }
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        assert_eq!(snapshot.state, JobState::Succeeded);
        let result = snapshot.result.unwrap();
        assert_eq!(result.job_id(), job_id);
        assert_eq!(result.duration_secs(), 90.0);

        let manager = manager();
        manager.load(&result).await.unwrap();
        manager.play().await.unwrap();
        let position = manager.position().await.unwrap();
        assert!(position.playing);
        assert_eq!(position.duration_secs, 90.0);
    }
}
