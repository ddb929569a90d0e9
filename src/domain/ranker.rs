use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use crate::domain::search::ScoredResult;

/// 同分结果的次级排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortMode {
    /// 修改时间，新的在前
    #[default]
    ModTimeDesc,
    /// 修改时间，旧的在前
    ModTimeAsc,
    /// 创建时间，新的在前
    AddTimeDesc,
    /// 创建时间，旧的在前
    AddTimeAsc,
    /// 文件名升序（不区分大小写）
    FilenameAsc,
    /// 文件名降序（不区分大小写）
    FilenameDesc,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::ModTimeDesc => "mod_time_desc",
            SortMode::ModTimeAsc => "mod_time_asc",
            SortMode::AddTimeDesc => "add_time_desc",
            SortMode::AddTimeAsc => "add_time_asc",
            SortMode::FilenameAsc => "filename_asc",
            SortMode::FilenameDesc => "filename_desc",
        }
    }

    /// 是否按创建时间排序
    pub fn uses_created_time(&self) -> bool {
        matches!(self, SortMode::AddTimeDesc | SortMode::AddTimeAsc)
    }
}

/// 比较两个结果：分数降序，其次按排序方式，最后按路径保证结果稳定
pub fn compare(a: &ScoredResult, b: &ScoredResult, mode: SortMode) -> Ordering {
    let (ca, cb) = (&a.candidate, &b.candidate);

    let secondary = match mode {
        SortMode::ModTimeDesc => cb.modified.cmp(&ca.modified),
        SortMode::ModTimeAsc => ca.modified.cmp(&cb.modified),
        SortMode::AddTimeDesc => cb.created.cmp(&ca.created),
        SortMode::AddTimeAsc => ca.created.cmp(&cb.created),
        SortMode::FilenameAsc => ca.name.to_lowercase().cmp(&cb.name.to_lowercase()),
        SortMode::FilenameDesc => cb.name.to_lowercase().cmp(&ca.name.to_lowercase()),
    };

    b.score
        .cmp(&a.score)
        .then(secondary)
        .then_with(|| ca.path.cmp(&cb.path))
}

/// 结果聚合器：按路径去重并保留最高分，结束时排序并截断
pub struct Ranker {
    sort_mode: SortMode,
    max_results: usize,
    best: HashMap<PathBuf, ScoredResult>,
    received: u64,
}

impl Ranker {
    pub fn new(sort_mode: SortMode, max_results: usize) -> Self {
        Self {
            sort_mode,
            max_results,
            best: HashMap::new(),
            received: 0,
        }
    }

    /// 加入一个结果，同一路径只保留分数最高的一次
    pub fn push(&mut self, result: ScoredResult) {
        self.received += 1;

        match self.best.get_mut(&result.candidate.path) {
            Some(existing) if existing.score >= result.score => {}
            Some(existing) => *existing = result,
            None => {
                self.best.insert(result.candidate.path.clone(), result);
            }
        }
    }

    /// 持续接收结果，直到所有发送端都已关闭
    pub fn consume(&mut self, rx: &Receiver<ScoredResult>) {
        while let Ok(result) = rx.recv() {
            self.push(result);
        }
    }

    /// 收到的结果总数（含重复路径）
    pub fn received(&self) -> u64 {
        self.received
    }

    /// 去重后的结果数
    pub fn unique(&self) -> usize {
        self.best.len()
    }

    /// 排序后截断，截断必须在排序之后
    pub fn finish(self) -> Vec<ScoredResult> {
        let mode = self.sort_mode;
        let mut results: Vec<ScoredResult> = self.best.into_values().collect();
        results.sort_by(|a, b| compare(a, b, mode));
        results.truncate(self.max_results);
        results
    }
}

/// 对一组结果去重、排序并截断
pub fn rank<I>(results: I, sort_mode: SortMode, max_results: usize) -> Vec<ScoredResult>
where
    I: IntoIterator<Item = ScoredResult>,
{
    let mut ranker = Ranker::new(sort_mode, max_results);
    for result in results {
        ranker.push(result);
    }
    ranker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::Candidate;
    use std::time::{Duration, SystemTime};

    fn result(path: &str, score: u32, age_secs: u64) -> ScoredResult {
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 - age_secs);
        ScoredResult::new(
            Candidate {
                path: PathBuf::from(path),
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                is_dir: false,
                modified,
                created: modified,
                size: 0,
            },
            score,
        )
    }

    #[test]
    fn test_dedup_keeps_highest_score() {
        let ranked = rank(
            vec![result("/a/x", 200, 0), result("/a/x", 350, 0), result("/a/x", 100, 0)],
            SortMode::default(),
            10,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 350);
    }

    #[test]
    fn test_truncate_after_sort() {
        let ranked = rank(
            vec![
                result("/a/1", 100, 0),
                result("/a/2", 300, 0),
                result("/a/3", 200, 0),
                result("/a/4", 500, 0),
                result("/a/5", 400, 0),
            ],
            SortMode::default(),
            2,
        );
        let scores: Vec<u32> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![500, 400]);
    }

    #[test]
    fn test_secondary_sort_modes() {
        let results = vec![result("/a/Beta", 100, 10), result("/a/alpha", 100, 20), result("/a/gamma", 100, 5)];

        let names = |mode| -> Vec<String> {
            rank(results.clone(), mode, 10)
                .into_iter()
                .map(|r| r.candidate.name)
                .collect()
        };

        assert_eq!(names(SortMode::ModTimeDesc), vec!["gamma", "Beta", "alpha"]);
        assert_eq!(names(SortMode::ModTimeAsc), vec!["alpha", "Beta", "gamma"]);
        assert_eq!(names(SortMode::FilenameAsc), vec!["alpha", "Beta", "gamma"]);
        assert_eq!(names(SortMode::FilenameDesc), vec!["gamma", "Beta", "alpha"]);
        assert_eq!(names(SortMode::AddTimeDesc), vec!["gamma", "Beta", "alpha"]);
    }

    #[test]
    fn test_add_time_uses_created_not_modified() {
        // 创建时间与修改时间顺序相反
        let with_times = |path: &str, created: u64, modified: u64| {
            let mut r = result(path, 100, 0);
            r.candidate.created = SystemTime::UNIX_EPOCH + Duration::from_secs(created);
            r.candidate.modified = SystemTime::UNIX_EPOCH + Duration::from_secs(modified);
            r
        };
        let results = vec![
            with_times("/a/first", 100, 900),
            with_times("/a/second", 200, 800),
            with_times("/a/third", 300, 700),
        ];

        let names = |mode| -> Vec<String> {
            rank(results.clone(), mode, 10)
                .into_iter()
                .map(|r| r.candidate.name)
                .collect()
        };

        assert_eq!(names(SortMode::AddTimeAsc), vec!["first", "second", "third"]);
        assert_eq!(names(SortMode::AddTimeDesc), vec!["third", "second", "first"]);
        assert_eq!(names(SortMode::ModTimeDesc), vec!["first", "second", "third"]);
        assert_eq!(names(SortMode::ModTimeAsc), vec!["third", "second", "first"]);
    }

    #[test]
    fn test_score_dominates_secondary_key() {
        let ranked = rank(
            vec![result("/a/new", 100, 0), result("/a/old", 400, 1000)],
            SortMode::ModTimeDesc,
            10,
        );
        assert_eq!(ranked[0].candidate.name, "old");
    }

    #[test]
    fn test_consume_channel() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let producer = std::thread::spawn(move || {
            for i in 0..10 {
                tx.send(result(&format!("/a/{}", i % 5), 100 + i, 0)).unwrap();
            }
        });

        let mut ranker = Ranker::new(SortMode::default(), 3);
        ranker.consume(&rx);
        producer.join().unwrap();

        assert_eq!(ranker.received(), 10);
        assert_eq!(ranker.unique(), 5);
        assert_eq!(ranker.finish().len(), 3);
    }

    #[test]
    fn test_sort_mode_names() {
        assert_eq!(SortMode::default().as_str(), "mod_time_desc");
        assert!(SortMode::AddTimeAsc.uses_created_time());
        let mode: SortMode = serde_json::from_str("\"filename_desc\"").unwrap();
        assert_eq!(mode, SortMode::FilenameDesc);
    }
}
