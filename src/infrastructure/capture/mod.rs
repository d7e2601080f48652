//! Capture Adapters - 麦克风采集实现

mod cpal_capture;

pub use cpal_capture::CpalAudioCapture;
