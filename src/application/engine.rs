use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::bounded;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::config::SearchConfig;
use crate::domain::file_walker::{self, WalkStats};
use crate::domain::transliteration::{contains_cjk, DictionaryError};
use crate::domain::ranker::{self, Ranker};
use crate::domain::search::{self, Candidate, ScoredResult};
use crate::domain::{PolyphonicDictionary, Query, TransliterationCache};
use crate::infrastructure::{ErrorLogger, ErrorType, LoggerTrait};

/// 遍历线程到聚合线程的通道容量
pub const CHANNEL_CAPACITY: usize = 1000;

/// 一次搜索的结果与统计
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// 排序并截断后的结果
    pub results: Vec<ScoredResult>,
    pub walk: WalkStats,
    /// 聚合线程收到的结果数（含重复路径）
    pub matched: u64,
    /// 去重后的结果数
    pub unique: usize,
    pub duration: Duration,
}

/// 加载多音字字典，失败时退回内置表
pub fn load_dictionary(
    path: &Path,
    logger: &dyn LoggerTrait,
    error_logger: &ErrorLogger,
) -> PolyphonicDictionary {
    match PolyphonicDictionary::load(path) {
        Ok(dictionary) => {
            let _ = logger.log_message(&format!(
                "已加载多音字字典: {} ({} 个字符)",
                path.display(),
                dictionary.len()
            ));
            dictionary
        }
        Err(DictionaryError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            let _ = logger.log_message(&format!("未找到多音字字典 {}，使用内置表", path.display()));
            PolyphonicDictionary::builtin()
        }
        Err(err) => {
            let _ = error_logger.log_error(
                ErrorType::DictionaryLoad,
                Some(&path.display().to_string()),
                "多音字字典加载失败，使用内置表",
                Some(&err.to_string()),
            );
            PolyphonicDictionary::builtin()
        }
    }
}

/// 文件名搜索引擎
///
/// 遍历线程产出候选结果，经有界通道交给聚合线程去重排序。
/// 聚合线程只在所有遍历线程结束、全部发送端关闭之后才完成。
/// 日志写入失败不会中断搜索。
pub struct SearchEngine {
    config: SearchConfig,
    cache: Arc<TransliterationCache>,
    logger: Arc<dyn LoggerTrait>,
    error_logger: Arc<ErrorLogger>,
    show_progress: bool,
}

impl SearchEngine {
    pub fn new(
        config: SearchConfig,
        cache: Arc<TransliterationCache>,
        logger: Arc<dyn LoggerTrait>,
        error_logger: Arc<ErrorLogger>,
    ) -> Self {
        Self {
            config,
            cache,
            logger,
            error_logger,
            show_progress: false,
        }
    }

    /// 是否在标准错误输出显示进度
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn cache(&self) -> &TransliterationCache {
        &self.cache
    }

    /// 在配置的根目录下搜索
    pub fn search(&self, query: &Query) -> Result<SearchOutcome> {
        let roots = self.config.resolve_roots();
        self.search_roots(&roots, query)
    }

    /// 在指定的根目录下搜索
    pub fn search_roots(&self, roots: &[PathBuf], query: &Query) -> Result<SearchOutcome> {
        let start_time = Instant::now();

        if self.logger.is_enabled() {
            self.log(&format!("关键词: {:?}", query.keywords));
            self.log(&format!("类型过滤: {:?}", query.type_filter));
            for root in roots {
                self.log(&format!("搜索目录: {}", root.display()));
            }
            self.log(&format!(
                "最大深度: {} | 最大结果数: {} | 工作线程: {} | 排序: {} | 容错匹配: {}",
                self.config.max_depth,
                self.config.max_results,
                self.config.worker_count,
                self.config.sort_mode.as_str(),
                self.config.enable_fuzzy
            ));
        }

        // 创建结果通道
        let (tx, rx) = bounded::<ScoredResult>(CHANNEL_CAPACITY);

        // 聚合线程持续接收，直到所有发送端关闭
        let sort_mode = self.config.sort_mode;
        let max_results = self.config.max_results;
        let handle = thread::spawn(move || {
            let mut ranker = Ranker::new(sort_mode, max_results);
            ranker.consume(&rx);
            ranker
        });

        let tx_clone = tx.clone();
        let query_clone = query.clone();
        let cache = Arc::clone(&self.cache);
        let logger = Arc::clone(&self.logger);
        let options = self.config.match_options();

        let walk = file_walker::scan_roots(
            roots,
            self.config.entry_filter(),
            self.config.worker_count,
            Arc::clone(&self.logger),
            Arc::clone(&self.error_logger),
            self.progress_bar(),
            move |entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let is_dir = entry.file_type().map_or(false, |ft| ft.is_dir());

                let scores = search::evaluate(&query_clone, &name, is_dir, &cache, options);
                if scores.is_empty() {
                    return Ok(());
                }

                let metadata = entry
                    .metadata()
                    .with_context(|| format!("无法读取元数据: {}", entry.path().display()))?;
                let candidate = Candidate::from_metadata(entry.path().to_path_buf(), name, &metadata);

                if logger.is_enabled() {
                    // 不含中文的名称不做拼音转换
                    let status = if contains_cjk(&candidate.name) {
                        let forms = cache.get(&candidate.name);
                        format!("匹配 分数: {:?} 全拼: {} 首字母: {}", scores, forms.full, forms.initials)
                    } else {
                        format!("匹配 分数: {:?}", scores)
                    };
                    let _ = logger.log_entry(&candidate.path, &status);
                }

                for score in scores {
                    if tx_clone.send(ScoredResult::new(candidate.clone(), score)).is_err() {
                        break;
                    }
                }

                Ok(())
            },
        );

        // 关闭发送通道
        drop(tx);

        // 等待聚合线程完成
        let ranker = handle.join().map_err(|_| anyhow!("结果聚合线程异常退出"))?;
        let matched = ranker.received();
        let unique = ranker.unique();
        let results = ranker.finish();

        let duration = start_time.elapsed();
        if self.logger.is_enabled() {
            self.log(&format!(
                "遍历完成: 扫描 {} 个条目, 跳过 {} 个, 错误 {} 个, 命中 {} 次, 去重后 {} 个",
                walk.visited, walk.skipped, walk.errors, matched, unique
            ));
        }

        Ok(SearchOutcome {
            results,
            walk,
            matched,
            unique,
            duration,
        })
    }

    /// 对内存中的文档集合打分排序，不访问文件系统
    pub fn rank_documents(&self, documents: &[Candidate], query: &Query) -> Vec<ScoredResult> {
        let scored = documents.iter().flat_map(|doc| {
            search::evaluate(query, &doc.name, doc.is_dir, &self.cache, self.config.match_options())
                .into_iter()
                .map(move |score| ScoredResult::new(doc.clone(), score))
        });

        ranker::rank(scored, self.config.sort_mode, self.config.max_results)
    }

    /// 写入调试日志，失败时只计入错误统计
    fn log(&self, message: &str) {
        if let Err(err) = self.logger.log_message(message) {
            let _ = self.error_logger.log_error(ErrorType::LogWrite, None, "调试日志写入失败", Some(&err.to_string()));
        }
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            progress.set_style(style);
        }
        progress
    }
}
