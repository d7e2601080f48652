//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_capture;
mod audio_output;
mod cloning_engine;

pub use audio_capture::{AudioCapturePort, CaptureError};
pub use audio_output::{AudioOutputPort, AudioOutputStream, PlaybackError};
pub use cloning_engine::{
    CloneAudio, CloneError, CloneRequest, CloneStatus, CloningEnginePort, JobHandle,
};
