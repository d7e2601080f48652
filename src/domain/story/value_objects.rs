//! Story Context - Value Objects

use serde::{Deserialize, Serialize};

/// 故事唯一标识（slug 形式，如 "snow-white"）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryId(String);

impl StoryId {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StoryId {
    fn from(slug: &str) -> Self {
        Self(slug.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_id_display() {
        let id = StoryId::new("snow-white");
        assert_eq!(id.to_string(), "snow-white");
        assert_eq!(id.as_str(), "snow-white");
    }
}
