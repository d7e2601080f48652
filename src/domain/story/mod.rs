//! Story Context - 故事目录上下文
//!
//! 内置晚安故事的只读目录：启动时构建一次，之后永不变更。
//! 无副作用，可被任意数量的调用方并发访问。

mod builtin;
mod catalog;
mod entities;
mod errors;
mod value_objects;

pub use catalog::StoryCatalog;
pub use entities::{Story, StorySummary};
pub use errors::StoryError;
pub use value_objects::StoryId;
