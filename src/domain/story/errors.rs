//! Story Context - Errors

use thiserror::Error;

use super::StoryId;

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("故事不存在: {0}")]
    NotFound(StoryId),
}
