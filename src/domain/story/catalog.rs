//! Story Catalog - 故事目录
//!
//! 启动时从内置数据表构建一次，之后只读。

use super::builtin::BUILTIN_STORIES;
use super::{Story, StoryError, StoryId, StorySummary};

/// 故事目录
///
/// 不变量:
/// - 构建后不可变（无内部可变性），Send + Sync，可并发只读访问
/// - list() 的顺序与内置数据表一致且稳定
pub struct StoryCatalog {
    stories: Vec<Story>,
}

impl StoryCatalog {
    /// 从内置故事集构建目录
    pub fn builtin() -> Self {
        let stories = BUILTIN_STORIES
            .iter()
            .map(|s| {
                Story::new(
                    StoryId::new(s.slug),
                    s.title,
                    s.language,
                    s.paragraphs.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect();
        Self { stories }
    }

    /// 从任意故事集合构建目录（测试与扩展用）
    pub fn from_stories(stories: Vec<Story>) -> Self {
        Self { stories }
    }

    /// 返回有序的故事摘要列表
    ///
    /// 确定性操作，无失败模式
    pub fn list(&self) -> Vec<StorySummary> {
        self.stories.iter().map(|s| s.summary()).collect()
    }

    /// 按 ID 查找完整故事
    pub fn get(&self, id: &StoryId) -> Result<&Story, StoryError> {
        self.stories
            .iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| StoryError::NotFound(id.clone()))
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_not_empty() {
        let catalog = StoryCatalog::builtin();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.list().len(), catalog.len());
    }

    #[test]
    fn test_list_order_is_stable() {
        let catalog = StoryCatalog::builtin();
        let first = catalog.list();
        let second = catalog.list();
        let ids_a: Vec<_> = first.iter().map(|s| s.id.clone()).collect();
        let ids_b: Vec<_> = second.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_get_round_trips_full_text() {
        let catalog = StoryCatalog::builtin();
        for summary in catalog.list() {
            let story = catalog.get(&summary.id).unwrap();
            assert_eq!(story.id(), &summary.id);
            assert_eq!(story.paragraphs().len(), summary.paragraph_count);
            assert!(!story.full_text().is_empty());
        }
    }

    #[test]
    fn test_get_unknown_id_returns_not_found() {
        let catalog = StoryCatalog::builtin();
        let result = catalog.get(&StoryId::new("no-such-story"));
        assert!(matches!(result, Err(StoryError::NotFound(_))));
    }

    #[test]
    fn test_snow_white_is_builtin() {
        let catalog = StoryCatalog::builtin();
        let story = catalog.get(&StoryId::new("snow-white")).unwrap();
        assert_eq!(story.title(), "Snow White");
        assert_eq!(story.language(), "en");
    }
}
