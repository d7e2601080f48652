//! Playback Adapters - 音频输出实现

mod rodio_output;

pub use rodio_output::RodioOutput;
