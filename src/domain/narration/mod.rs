//! Narration Context - 声音样本与朗读任务上下文
//!
//! 核心聚合是 NarrationJob：单会话内唯一的朗读任务，
//! 状态机约束所有生命周期转换。

mod errors;
mod job;
mod value_objects;

pub use errors::NarrationError;
pub use job::{JobState, NarrationJob};
pub use value_objects::{AudioCodec, FailureReason, JobId, NarrationResult, VoiceSample};
