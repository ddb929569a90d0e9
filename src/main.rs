use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use name_finder::application::{load_dictionary, Config, SearchEngine};
use name_finder::domain::{Query, SortMode, TransliterationCache};
use name_finder::infrastructure::{ErrorLogger, Logger, LoggerTrait, RunSummary};
use name_finder::presentation::{print_search_result, render_launcher_json, SearchSummary};

/// 支持拼音与多音字的文件名搜索工具
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// 搜索关键词，末尾可追加 dir / file / .扩展名 作为类型过滤
    query: Vec<String>,

    /// 配置文件路径 (默认为程序同级目录下的 config.toml)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// 搜索根目录，可重复指定，会替换配置文件中的目录
    #[clap(short, long = "root")]
    roots: Vec<String>,

    /// 额外排除的名称，可重复指定
    #[clap(short, long = "exclude")]
    excludes: Vec<String>,

    /// 最大遍历深度 (-1 表示不限制)
    #[clap(long, allow_hyphen_values = true)]
    max_depth: Option<i64>,

    /// 最多显示的结果数
    #[clap(short = 'n', long)]
    max_results: Option<usize>,

    /// 并行工作线程数
    #[clap(short = 'j', long)]
    workers: Option<usize>,

    /// 同分结果的排序方式
    #[clap(long, value_enum)]
    sort: Option<SortMode>,

    /// 关闭编辑距离容错匹配
    #[clap(long)]
    no_fuzzy: bool,

    /// 多音字字典 JSON 文件
    #[clap(long)]
    dict: Option<PathBuf>,

    /// 以启动器 JSON 格式输出
    #[clap(long)]
    json: bool,

    /// 启用日志记录，日志文件写入配置的日志目录
    #[clap(long)]
    log: bool,

    /// 在标准错误输出显示扫描进度
    #[clap(long)]
    progress: bool,

    /// 将当前配置写入配置文件后退出
    #[clap(long)]
    init_config: bool,
}

/// 命令行参数覆盖配置文件中的值
fn apply_overrides(config: &mut Config, args: &Args) {
    if !args.roots.is_empty() {
        config.search.roots = args.roots.clone();
    }
    config.search.exclude_names.extend(args.excludes.iter().cloned());
    if let Some(depth) = args.max_depth {
        config.search.max_depth = depth;
    }
    if let Some(max) = args.max_results {
        config.search.max_results = max;
    }
    if let Some(workers) = args.workers {
        config.search.worker_count = workers;
    }
    if let Some(sort) = args.sort {
        config.search.sort_mode = sort;
    }
    if args.no_fuzzy {
        config.search.enable_fuzzy = false;
    }
    if let Some(dict) = &args.dict {
        config.dictionary.path = dict.to_string_lossy().to_string();
    }
    if args.log {
        config.logging.enabled = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 加载配置
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };
    let mut config = Config::load_or_default(&config_path)?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    if args.init_config {
        config.save_to_file(&config_path)?;
        println!("已写入配置文件: {}", config_path.display());
        return Ok(());
    }

    // 初始化日志记录器
    let log_dir = PathBuf::from(&config.logging.dir);
    let logger = Arc::new(Logger::with_dir(config.logging.enabled, &log_dir)?);
    let error_logger = Arc::new(ErrorLogger::with_dir(config.logging.enabled, &log_dir)?);

    // 字典与拼音缓存在进程内只构建一次
    let dictionary = load_dictionary(
        &PathBuf::from(&config.dictionary.path),
        logger.as_ref(),
        error_logger.as_ref(),
    );
    let cache = Arc::new(TransliterationCache::new(Arc::new(dictionary)));

    let query = Query::parse(&args.query.join(" "));
    let sort_mode = config.search.sort_mode;

    let engine = SearchEngine::new(
        config.search.clone(),
        Arc::clone(&cache),
        logger.clone(),
        Arc::clone(&error_logger),
    )
    .with_progress(args.progress);

    let outcome = engine.search(&query)?;

    if args.json {
        println!("{}", render_launcher_json(&outcome.results, sort_mode)?);
    } else {
        if outcome.results.is_empty() {
            println!("没有找到匹配结果");
        }
        for result in &outcome.results {
            print_search_result(result, sort_mode)?;
        }

        let summary = SearchSummary {
            duration: outcome.duration,
            scanned_entries: outcome.walk.visited,
            matched_entries: outcome.unique,
            shown_results: outcome.results.len(),
            cached_names: cache.len(),
        };
        summary.print()?;
        error_logger.print_error_summary();
    }

    // 完成日志记录
    logger.finalize(&RunSummary {
        scanned_entries: outcome.walk.visited,
        matched_entries: outcome.unique as u64,
        shown_results: outcome.results.len(),
        duration: outcome.duration,
    })?;
    error_logger.finalize()?;

    Ok(())
}
