use std::fs::Metadata;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::domain::matcher::{self, MatchOptions};
use crate::domain::transliteration::TransliterationCache;
use crate::domain::query::Query;

/// 没有关键词时，所有通过过滤的条目使用的中性分数
pub const BASELINE_SCORE: u32 = 100;

/// 候选条目（文件系统条目或内存中的文档）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub modified: SystemTime,
    /// 创建时间，平台不支持时与修改时间相同
    pub created: SystemTime,
    pub size: u64,
}

impl Candidate {
    /// 根据文件元数据创建候选条目
    pub fn from_metadata(path: PathBuf, name: String, metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created = metadata.created().unwrap_or(modified);

        Self {
            path,
            name,
            is_dir: metadata.is_dir(),
            modified,
            created,
            size: if metadata.is_dir() { 0 } else { metadata.len() },
        }
    }
}

/// 带分数的搜索结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredResult {
    pub candidate: Candidate,
    pub score: u32,
}

impl ScoredResult {
    pub fn new(candidate: Candidate, score: u32) -> Self {
        Self { candidate, score }
    }
}

/// 对单个条目求分
///
/// 返回每个命中的关键词变体的分数（均大于 0），条目未通过类型过滤或
/// 没有任何变体命中时返回空列表。没有关键词时返回中性分数。
pub fn evaluate(
    query: &Query,
    name: &str,
    is_dir: bool,
    cache: &TransliterationCache,
    options: MatchOptions,
) -> Vec<u32> {
    if !query.type_filter.matches(name, is_dir) {
        return Vec::new();
    }

    if query.is_empty() {
        return vec![BASELINE_SCORE];
    }

    query
        .keyword_variants()
        .into_iter()
        .map(|keywords| matcher::score_with(keywords, name, cache, options))
        .filter(|score| *score > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transliteration::PolyphonicDictionary;
    use crate::domain::query::TypeFilter;
    use std::sync::Arc;

    fn cache() -> TransliterationCache {
        TransliterationCache::new(Arc::new(PolyphonicDictionary::builtin()))
    }

    #[test]
    fn test_empty_query_uses_baseline() {
        let cache = cache();
        let query = Query::new("", TypeFilter::Directory);
        assert_eq!(evaluate(&query, "docs", true, &cache, MatchOptions::default()), vec![BASELINE_SCORE]);
        assert!(evaluate(&query, "a.txt", false, &cache, MatchOptions::default()).is_empty());
    }

    #[test]
    fn test_type_filter_applies_before_scoring() {
        let cache = cache();
        let query = Query::parse("bjt .png");
        assert_eq!(evaluate(&query, "背景图.png", false, &cache, MatchOptions::default()).len(), 1);
        assert!(evaluate(&query, "背景图.jpg", false, &cache, MatchOptions::default()).is_empty());
    }

    #[test]
    fn test_each_matching_variant_is_scored() {
        let cache = cache();
        let query = Query::parse("report.");
        let scores = evaluate(&query, "report.txt", false, &cache, MatchOptions::default());
        assert_eq!(scores, vec![matcher::SCORE_RAW_PREFIX, matcher::SCORE_RAW_PREFIX]);

        let scores = evaluate(&query, "report", false, &cache, MatchOptions::default());
        assert_eq!(scores, vec![matcher::SCORE_RAW_EXACT]);
    }

    #[test]
    fn test_options_reach_scorer() {
        let cache = cache();
        let query = Query::parse("hangdongjihia");
        assert_eq!(evaluate(&query, "行动计划", false, &cache, MatchOptions::default()), vec![matcher::SCORE_FUZZY]);
        assert!(evaluate(&query, "行动计划", false, &cache, MatchOptions { fuzzy: false }).is_empty());
    }

    #[test]
    fn test_candidate_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();
        let metadata = std::fs::metadata(&path).unwrap();

        let candidate = Candidate::from_metadata(path.clone(), "a.txt".to_string(), &metadata);
        assert_eq!(candidate.size, 5);
        assert!(!candidate.is_dir);
        assert_eq!(candidate.path, path);
    }
}
