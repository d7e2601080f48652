//! Tail a Tale - 声音克隆晚安故事朗读系统
//!
//! 架构设计: Hexagonal Architecture (Ports & Adapters)
//!
//! 领域层 (domain/):
//! - Story Context: 故事目录上下文
//! - Narration Context: 声音样本与朗读任务上下文
//!
//! 应用层 (application/):
//! - Ports: 端口定义（AudioCapturePort, CloningEnginePort, AudioOutputPort）
//! - NarrationController: 朗读流水线编排（采样 → 选故事 → 提交 → 轮询 → 取结果）
//! - PlaybackManager: 播放控制（load / play / pause / seek / stop）
//!
//! 基础设施层 (infrastructure/):
//! - Capture: cpal 麦克风采集 + hound WAV 编码
//! - Cloning: HTTP 克隆服务客户端 + Fake 客户端
//! - Playback: rodio 音频输出

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
