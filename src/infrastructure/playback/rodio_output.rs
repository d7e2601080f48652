//! Rodio Output - 基于 rodio 的音频输出
//!
//! 实现 AudioOutputPort trait。rodio 的 OutputStream 不是 Send，因此
//! 由一条专用播放线程独占持有 stream + sink；异步侧通过命令通道控制
//! 播放，通过共享原子量读取进度。线程退出即释放输出设备。

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::application::ports::{AudioOutputPort, AudioOutputStream, PlaybackError};
use crate::domain::narration::NarrationResult;

enum Command {
    Play,
    Pause,
    Seek(Duration, mpsc::Sender<Result<(), PlaybackError>>),
    Stop,
}

/// 播放线程与异步侧共享的状态
struct SharedState {
    playing: AtomicBool,
    finished: AtomicBool,
    position_ms: AtomicU64,
}

/// rodio 输出后端
pub struct RodioOutput;

impl RodioOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioOutputPort for RodioOutput {
    async fn open(
        &self,
        result: &NarrationResult,
    ) -> Result<Box<dyn AudioOutputStream>, PlaybackError> {
        let audio = result.audio().to_vec();
        let state = Arc::new(SharedState {
            playing: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            position_ms: AtomicU64::new(0),
        });

        let (ready_tx, ready_rx) = oneshot::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let thread_state = state.clone();
        std::thread::Builder::new()
            .name("tailtale-playback".to_string())
            .spawn(move || playback_thread(audio, ready_tx, cmd_rx, thread_state))
            .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => {
                tracing::debug!("Playback stream opened");
                Ok(Box::new(RodioStream { cmd_tx, state }))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PlaybackError::DeviceUnavailable(
                "playback thread exited unexpectedly".to_string(),
            )),
        }
    }
}

/// 播放线程主体：独占持有 OutputStream 与 Sink
fn playback_thread(
    audio: Vec<u8>,
    ready_tx: oneshot::Sender<Result<(), PlaybackError>>,
    cmd_rx: mpsc::Receiver<Command>,
    state: Arc<SharedState>,
) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready_tx.send(Err(PlaybackError::DeviceUnavailable(e.to_string())));
            return;
        }
    };
    let sink = match Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = ready_tx.send(Err(PlaybackError::DeviceUnavailable(e.to_string())));
            return;
        }
    };
    let source = match Decoder::new(Cursor::new(audio)) {
        Ok(source) => source,
        Err(e) => {
            let _ = ready_tx.send(Err(PlaybackError::Decode(e.to_string())));
            return;
        }
    };
    sink.append(source);
    // 初始为暂停状态，等待显式 play()
    sink.pause();

    if ready_tx.send(Ok(())).is_err() {
        return;
    }

    loop {
        match cmd_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(Command::Play) => {
                sink.play();
                state.playing.store(true, Ordering::SeqCst);
            }
            Ok(Command::Pause) => {
                sink.pause();
                state.playing.store(false, Ordering::SeqCst);
            }
            Ok(Command::Seek(position, reply)) => {
                let outcome = sink
                    .try_seek(position)
                    .map_err(|e| PlaybackError::Seek(e.to_string()));
                let _ = reply.send(outcome);
            }
            Ok(Command::Stop) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        state
            .position_ms
            .store(sink.get_pos().as_millis() as u64, Ordering::SeqCst);
        if sink.empty() {
            state.finished.store(true, Ordering::SeqCst);
            state.playing.store(false, Ordering::SeqCst);
        }
    }
    // sink 与 stream 随线程退出 drop，输出设备随之释放
}

/// 一段打开的 rodio 播放流
struct RodioStream {
    cmd_tx: mpsc::Sender<Command>,
    state: Arc<SharedState>,
}

impl AudioOutputStream for RodioStream {
    fn play(&mut self) {
        self.state.playing.store(true, Ordering::SeqCst);
        let _ = self.cmd_tx.send(Command::Play);
    }

    fn pause(&mut self) {
        self.state.playing.store(false, Ordering::SeqCst);
        let _ = self.cmd_tx.send(Command::Pause);
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(Command::Seek(position, reply_tx))
            .map_err(|_| PlaybackError::Seek("playback thread stopped".to_string()))?;
        reply_rx
            .recv_timeout(Duration::from_secs(1))
            .map_err(|_| PlaybackError::Seek("playback thread unresponsive".to_string()))?
    }

    fn position(&self) -> Duration {
        Duration::from_millis(self.state.position_ms.load(Ordering::SeqCst))
    }

    fn is_playing(&self) -> bool {
        self.state.playing.load(Ordering::SeqCst)
    }

    fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::SeqCst)
    }
}

impl Drop for RodioStream {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Stop);
    }
}
