//! Narration Context - Errors

use thiserror::Error;

use super::JobState;

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("非法状态转换: {from:?} -> {to:?}")]
    InvalidTransition { from: JobState, to: JobState },
}
