//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Story Context: 故事目录（只读静态数据）
//! - Narration Context: 声音样本与朗读任务

pub mod narration;
pub mod story;
