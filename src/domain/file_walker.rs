use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use ignore::{DirEntry, WalkBuilder, WalkState};
use indicatif::ProgressBar;

use crate::infrastructure::{ErrorLogger, ErrorType, LoggerTrait};

/// 条目筛选条件
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub exclude_names: HashSet<String>,
    /// 相对于根目录的最大深度，`None` 表示不限制
    pub max_depth: Option<usize>,
}

impl EntryFilter {
    /// 创建新的条目过滤器，`max_depth` 为负数表示不限制深度
    pub fn new(exclude_names: Vec<String>, max_depth: i64) -> Self {
        Self {
            exclude_names: exclude_names.into_iter().collect(),
            max_depth: usize::try_from(max_depth).ok(),
        }
    }

    /// 名称以 `.` 开头或在排除列表中的条目会被跳过，目录则整棵子树都不进入
    pub fn is_excluded_name(&self, name: &str) -> bool {
        name.starts_with('.') || self.exclude_names.contains(name)
    }

    /// 检查深度是否在限制之内
    pub fn allows_depth(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth <= max)
    }
}

/// 遍历统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// 交给回调处理的条目数
    pub visited: u64,
    /// 因隐藏或排除规则被跳过的条目数
    pub skipped: u64,
    /// 遍历或回调出错的条目数
    pub errors: u64,
}

/// 并行遍历所有根目录，并对每个通过筛选的条目执行回调
///
/// 所有工作线程共享同一个目录任务队列；函数返回时所有线程都已结束。
/// 单个条目的错误只会被记录，不会中断遍历。
pub fn scan_roots<F>(
    roots: &[PathBuf],
    filter: EntryFilter,
    workers: usize,
    logger: Arc<dyn LoggerTrait>,
    error_logger: Arc<ErrorLogger>,
    progress: ProgressBar,
    callback: F,
) -> WalkStats
where
    F: Fn(&DirEntry) -> Result<()> + Send + Sync + 'static,
{
    let Some((first, rest)) = roots.split_first() else {
        return WalkStats::default();
    };

    let callback = Arc::new(callback);
    let filter = Arc::new(filter);
    let visited = Arc::new(AtomicU64::new(0));
    let skipped = Arc::new(AtomicU64::new(0));
    let errors = Arc::new(AtomicU64::new(0));

    progress.set_message("已扫描 0 个条目");

    // 创建遍历器，隐藏文件和排除规则由 filter_entry 处理
    let mut walker = WalkBuilder::new(first);
    for root in rest {
        walker.add(root);
    }
    walker
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(false)
        .max_depth(filter.max_depth)
        .threads(workers.max(1));

    {
        let filter = Arc::clone(&filter);
        let skipped = Arc::clone(&skipped);
        let logger = Arc::clone(&logger);
        walker.filter_entry(move |entry| {
            // 根目录本身总是保留
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if filter.is_excluded_name(&name) {
                skipped.fetch_add(1, Ordering::Relaxed);
                if logger.is_enabled() {
                    let _ = logger.log_entry(entry.path(), "已跳过(隐藏或排除)");
                }
                return false;
            }
            true
        });
    }

    walker.build_parallel().run(|| {
        let callback = Arc::clone(&callback);
        let filter = Arc::clone(&filter);
        let visited = Arc::clone(&visited);
        let errors = Arc::clone(&errors);
        let logger = Arc::clone(&logger);
        let error_logger = Arc::clone(&error_logger);
        let progress = progress.clone();

        Box::new(move |result| {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    // 权限不足等错误只跳过当前条目
                    errors.fetch_add(1, Ordering::Relaxed);
                    let _ = error_logger.log_error(ErrorType::EntryAccess, None, "遍历错误", Some(&err.to_string()));
                    return WalkState::Continue;
                }
            };

            if entry.depth() == 0 || !filter.allows_depth(entry.depth()) {
                return WalkState::Continue;
            }

            let current = visited.fetch_add(1, Ordering::Relaxed) + 1;
            if current % 256 == 0 {
                progress.set_message(format!("已扫描 {} 个条目", current));
            }
            progress.tick();

            if let Err(err) = callback(&entry) {
                errors.fetch_add(1, Ordering::Relaxed);
                let path = entry.path().display().to_string();
                let _ = error_logger.log_error(
                    ErrorType::Metadata,
                    Some(&path),
                    "处理条目失败",
                    Some(&format!("{:#}", err)),
                );
                if logger.is_enabled() {
                    let _ = logger.log_entry(entry.path(), &format!("错误: {}", err));
                }
            }

            WalkState::Continue
        })
    });

    let stats = WalkStats {
        visited: visited.load(Ordering::Relaxed),
        skipped: skipped.load(Ordering::Relaxed),
        errors: errors.load(Ordering::Relaxed),
    };

    progress.finish_with_message(format!("完成! 已扫描 {} 个条目", stats.visited));

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::Logger;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join("top.txt"), "x").unwrap();
        fs::write(root.join("a/one.txt"), "x").unwrap();
        fs::write(root.join("a/b/two.txt"), "x").unwrap();
        fs::write(root.join("a/b/c/three.txt"), "x").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join(".hidden"), "x").unwrap();
    }

    fn collect(roots: &[PathBuf], filter: EntryFilter) -> (Vec<PathBuf>, WalkStats) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let stats = scan_roots(
            roots,
            filter,
            4,
            Arc::new(Logger::new(false).unwrap()),
            Arc::new(ErrorLogger::new(false).unwrap()),
            ProgressBar::hidden(),
            move |entry| {
                seen_clone.lock().unwrap().push(entry.path().to_path_buf());
                Ok(())
            },
        );
        let mut paths = seen.lock().unwrap().clone();
        paths.sort();
        (paths, stats)
    }

    #[test]
    fn test_entry_filter() {
        let filter = EntryFilter::new(vec!["target".to_string()], -1);
        assert!(filter.is_excluded_name("target"));
        assert!(filter.is_excluded_name(".git"));
        assert!(!filter.is_excluded_name("src"));
        assert!(filter.allows_depth(100));

        let filter = EntryFilter::new(vec![], 2);
        assert!(filter.allows_depth(2));
        assert!(!filter.allows_depth(3));
    }

    #[test]
    fn test_skips_hidden_and_excluded_subtrees() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let filter = EntryFilter::new(vec!["node_modules".to_string()], -1);
        let (paths, stats) = collect(&[dir.path().to_path_buf()], filter);

        assert!(paths.iter().all(|p| !p.to_string_lossy().contains("node_modules")));
        assert!(paths.iter().all(|p| !p.to_string_lossy().contains(".git")));
        assert!(paths.iter().all(|p| !p.ends_with(".hidden")));
        assert!(paths.contains(&dir.path().join("a/b/c/three.txt")));
        assert!(!paths.contains(&dir.path().to_path_buf()));
        assert_eq!(stats.visited as usize, paths.len());
        assert_eq!(stats.skipped, 3);
    }

    #[test]
    fn test_depth_pruning() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let (paths, _) = collect(&[dir.path().to_path_buf()], EntryFilter::new(vec![], 2));

        for path in &paths {
            let depth = path.strip_prefix(dir.path()).unwrap().components().count();
            assert!(depth <= 2, "{} is too deep", path.display());
        }
        assert!(paths.contains(&dir.path().join("a/b")));
        assert!(!paths.contains(&dir.path().join("a/b/two.txt")));
    }

    #[test]
    fn test_multiple_roots_and_missing_root() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::write(first.path().join("one.txt"), "x").unwrap();
        fs::write(second.path().join("two.txt"), "x").unwrap();

        let roots = vec![
            first.path().to_path_buf(),
            second.path().join("missing"),
            second.path().to_path_buf(),
        ];
        let (paths, stats) = collect(&roots, EntryFilter::default());

        assert_eq!(paths.len(), 2);
        assert!(stats.errors >= 1);
    }

    #[test]
    fn test_no_roots() {
        let (paths, stats) = collect(&[], EntryFilter::default());
        assert!(paths.is_empty());
        assert_eq!(stats, WalkStats::default());
    }
}
