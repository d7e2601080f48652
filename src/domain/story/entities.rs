//! Story Context - Entities

use serde::{Deserialize, Serialize};

use super::StoryId;

/// 故事
///
/// 不变量:
/// - 加载后不可变，目录不提供任何修改入口
/// - paragraphs 保持原始顺序，full_text 可无损还原全文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    id: StoryId,
    title: String,
    /// 语言代码（en, he, es, fr, ar, ru, pt, zh），透传给克隆服务
    language: String,
    paragraphs: Vec<String>,
}

impl Story {
    pub fn new(
        id: StoryId,
        title: impl Into<String>,
        language: impl Into<String>,
        paragraphs: Vec<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            language: language.into(),
            paragraphs,
        }
    }

    pub fn id(&self) -> &StoryId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// 全文（段落之间以空行分隔）
    pub fn full_text(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    pub fn summary(&self) -> StorySummary {
        StorySummary {
            id: self.id.clone(),
            title: self.title.clone(),
            paragraph_count: self.paragraphs.len(),
        }
    }
}

/// 故事摘要（用于列表展示）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySummary {
    pub id: StoryId,
    pub title: String,
    pub paragraph_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_text_preserves_paragraph_order() {
        let story = Story::new(
            StoryId::new("test"),
            "Test",
            "en",
            vec!["First.".to_string(), "Second.".to_string()],
        );
        assert_eq!(story.full_text(), "First.\n\nSecond.");
    }

    #[test]
    fn test_summary_carries_paragraph_count() {
        let story = Story::new(
            StoryId::new("test"),
            "Test",
            "en",
            vec!["One.".to_string(), "Two.".to_string(), "Three.".to_string()],
        );
        let summary = story.summary();
        assert_eq!(summary.paragraph_count, 3);
        assert_eq!(summary.title, "Test");
    }
}
