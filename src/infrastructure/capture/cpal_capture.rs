//! Cpal Audio Capture - 基于 cpal 的麦克风采集
//!
//! 实现 AudioCapturePort trait。cpal 的输入流不是 Send，因此由一条
//! 专用音频线程独占持有：回调把各声道下混为单声道 f32 样本，线程在
//! 收到停止信号后先 drop 流（释放麦克风），再把样本交回异步侧。
//! stop / cancel / error 的每条退出路径都会让该线程退出，设备的释放
//! 因此是确定性的。

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{oneshot, Mutex};

use crate::application::ports::{AudioCapturePort, CaptureError};
use crate::config::CaptureConfig;
use crate::domain::narration::{AudioCodec, VoiceSample};

/// 音频线程交回的原始采样
struct CapturedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// 进行中的采集
struct ActiveCapture {
    stop_tx: mpsc::Sender<()>,
    done_rx: oneshot::Receiver<CapturedAudio>,
}

/// 基于 cpal 的麦克风采集器
pub struct CpalAudioCapture {
    config: CaptureConfig,
    /// 同一时间至多一个活跃采集
    active: Mutex<Option<ActiveCapture>>,
}

impl CpalAudioCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            active: Mutex::new(None),
        }
    }
}

#[async_trait]
impl AudioCapturePort for CpalAudioCapture {
    async fn start_recording(&self) -> Result<(), CaptureError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(CaptureError::CaptureInProgress);
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("tailtale-capture".to_string())
            .spawn(move || capture_thread(ready_tx, stop_rx, done_tx))
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        // 等待音频线程的开流结果；失败时线程已自行退出，设备未被持有
        match ready_rx.await {
            Ok(Ok(sample_rate)) => {
                tracing::info!(sample_rate = sample_rate, "Recording started");
                *active = Some(ActiveCapture { stop_tx, done_rx });
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::DeviceUnavailable(
                "capture thread exited unexpectedly".to_string(),
            )),
        }
    }

    async fn stop_recording(&self) -> Result<VoiceSample, CaptureError> {
        let capture = self
            .active
            .lock()
            .await
            .take()
            .ok_or(CaptureError::NotRecording)?;

        let _ = capture.stop_tx.send(());
        let captured = capture.done_rx.await.map_err(|_| {
            CaptureError::DeviceUnavailable("capture thread exited unexpectedly".to_string())
        })?;

        let sample = finalize_capture(captured.samples, captured.sample_rate, &self.config)?;
        tracing::info!(
            duration_secs = sample.duration_secs(),
            sample_rate = sample.sample_rate(),
            bytes = sample.len(),
            "Recording finished"
        );
        Ok(sample)
    }

    async fn cancel(&self) {
        if let Some(capture) = self.active.lock().await.take() {
            // 线程收到信号后 drop 流并退出；样本被丢弃
            let _ = capture.stop_tx.send(());
            tracing::debug!("Recording cancelled");
        }
    }
}

/// 音频线程主体：独占持有 cpal 输入流
fn capture_thread(
    ready_tx: oneshot::Sender<Result<u32, CaptureError>>,
    stop_rx: mpsc::Receiver<()>,
    done_tx: oneshot::Sender<CapturedAudio>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(
            "no default input device".to_string(),
        )));
        return;
    };

    let supported = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(map_backend_error(&e.to_string())));
            return;
        }
    };
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.into();

    let samples: Arc<StdMutex<Vec<f32>>> = Arc::new(StdMutex::new(Vec::new()));
    let sink = samples.clone();
    let on_error = |e: cpal::StreamError| {
        tracing::warn!(error = %e, "Input stream error");
    };

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _| downmix_into(&sink, data, channels),
            on_error,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _| {
                let converted: Vec<f32> =
                    data.iter().map(|s| *s as f32 / i16::MAX as f32).collect();
                downmix_into(&sink, &converted, channels)
            },
            on_error,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            &stream_config,
            move |data: &[u16], _| {
                let converted: Vec<f32> = data
                    .iter()
                    .map(|s| (*s as f32 - 32768.0) / 32768.0)
                    .collect();
                downmix_into(&sink, &converted, channels)
            },
            on_error,
            None,
        ),
        other => {
            let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(format!(
                "unsupported sample format: {:?}",
                other
            ))));
            return;
        }
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(map_build_stream_error(&e)));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(map_backend_error(&e.to_string())));
        return;
    }

    if ready_tx.send(Ok(sample_rate)).is_err() {
        // 异步侧已放弃本次采集
        return;
    }

    // 阻塞等待停止信号；发送端被 drop（cancel 路径）同样解除阻塞
    let _ = stop_rx.recv();

    // 先释放麦克风，再交回样本
    drop(stream);

    let collected = samples
        .lock()
        .map(|mut guard| std::mem::take(&mut *guard))
        .unwrap_or_default();
    let _ = done_tx.send(CapturedAudio {
        samples: collected,
        sample_rate,
    });
}

/// 把 interleaved 多声道数据下混为单声道后追加到缓冲
fn downmix_into(sink: &Arc<StdMutex<Vec<f32>>>, data: &[f32], channels: usize) {
    let Ok(mut buffer) = sink.lock() else {
        return;
    };
    if channels <= 1 {
        buffer.extend_from_slice(data);
        return;
    }
    for frame in data.chunks_exact(channels) {
        let sum: f32 = frame.iter().sum();
        buffer.push(sum / channels as f32);
    }
}

fn map_build_stream_error(e: &cpal::BuildStreamError) -> CaptureError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("input device disappeared".to_string())
        }
        other => map_backend_error(&other.to_string()),
    }
}

/// 后端错误文本里带权限字样的归类为 PermissionDenied
fn map_backend_error(message: &str) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not allowed") {
        CaptureError::PermissionDenied
    } else {
        CaptureError::DeviceUnavailable(message.to_string())
    }
}

/// 把原始采样整理为 VoiceSample
///
/// - 超出上限的部分截断
/// - 低于下限返回 TooShort，不产生样本
/// - 编码为单声道 16-bit PCM WAV
fn finalize_capture(
    mut samples: Vec<f32>,
    sample_rate: u32,
    config: &CaptureConfig,
) -> Result<VoiceSample, CaptureError> {
    let max_frames = (config.max_duration_secs * sample_rate as f32) as usize;
    if samples.len() > max_frames {
        samples.truncate(max_frames);
    }

    let duration = samples.len() as f32 / sample_rate as f32;
    if duration < config.min_duration_secs {
        return Err(CaptureError::TooShort {
            got: duration,
            min: config.min_duration_secs,
        });
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
        for sample in &samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
    }

    Ok(VoiceSample::new(
        cursor.into_inner(),
        duration,
        sample_rate,
        AudioCodec::Wav,
    ))
}
