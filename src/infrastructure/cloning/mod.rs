//! Cloning Adapters - 克隆服务客户端实现

mod fake_cloning_client;
mod http_cloning_client;

pub use fake_cloning_client::FakeCloningClient;
pub use http_cloning_client::{HttpCloningClient, HttpCloningClientConfig};

/// 从 WAV 头解析出的音频信息
#[derive(Debug, Clone, Copy)]
pub(crate) struct WavInfo {
    pub duration_secs: f32,
    pub sample_rate: u32,
}

/// 解析 WAV 数据的时长与采样率
///
/// 服务端不报告元数据时的兜底
pub(crate) fn wav_info(data: &[u8]) -> Option<WavInfo> {
    let reader = hound::WavReader::new(std::io::Cursor::new(data)).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 || spec.channels == 0 {
        return None;
    }
    let frames = reader.duration();
    Some(WavInfo {
        duration_secs: frames as f32 / spec.sample_rate as f32,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_info_of_generated_audio() {
        let audio = FakeCloningClient::silent_wav(2.0, 16000);
        let info = wav_info(&audio).unwrap();
        assert!((info.duration_secs - 2.0).abs() < 0.01);
        assert_eq!(info.sample_rate, 16000);
    }

    #[test]
    fn test_wav_info_rejects_garbage() {
        assert!(wav_info(b"not a wav file").is_none());
        assert!(wav_info(&[]).is_none());
    }
}
