//! Application Layer - 应用层
//!
//! - Ports: 应用层与基础设施层之间的抽象接口
//! - NarrationController: 朗读流水线编排服务
//! - PlaybackManager: 播放控制服务

mod narration_controller;
mod playback_manager;
pub mod ports;

pub use narration_controller::{
    ControllerError, JobSnapshot, NarrationConfig, NarrationController,
};
pub use playback_manager::{PlaybackManager, PlaybackPosition};
