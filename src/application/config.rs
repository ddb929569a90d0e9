use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{EntryFilter, MatchOptions, SortMode};

/// 未显式配置时的最大工作线程数
const DEFAULT_MAX_WORKERS: usize = 4;
const MAX_WORKERS: usize = 64;

/// 应用程序配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 搜索相关配置
    pub search: SearchConfig,
    /// 多音字字典配置
    pub dictionary: DictionaryConfig,
    /// 日志相关配置
    pub logging: LoggingConfig,
}

/// 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 搜索根目录，支持 `~`，相对路径相对于用户主目录
    pub roots: Vec<String>,
    /// 按名称排除的条目（目录会整体跳过）
    pub exclude_names: Vec<String>,
    /// 最大遍历深度，-1 表示不限制
    pub max_depth: i64,
    /// 最多返回的结果数
    pub max_results: usize,
    /// 并行遍历的工作线程数
    pub worker_count: usize,
    /// 同分结果的排序方式
    pub sort_mode: SortMode,
    /// 是否启用编辑距离容错匹配
    pub enable_fuzzy: bool,
}

/// 多音字字典配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// 外部字典 JSON 文件路径
    pub path: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 是否写入调试日志和错误日志文件
    pub enabled: bool,
    /// 日志文件目录
    pub dir: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                "~/Documents".to_string(),
                "~/Desktop".to_string(),
                "~/Downloads".to_string(),
            ],
            exclude_names: vec![
                ".git".to_string(),
                "__pycache__".to_string(),
                "node_modules".to_string(),
                ".DS_Store".to_string(),
            ],
            max_depth: -1,
            max_results: 100,
            worker_count: num_cpus::get().clamp(1, DEFAULT_MAX_WORKERS),
            sort_mode: SortMode::default(),
            enable_fuzzy: true,
        }
    }
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            path: "polyphonic.json".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: ".".to_string(),
        }
    }
}

impl SearchConfig {
    /// 将配置的根目录解析为存在的绝对目录，不存在的目录被忽略
    pub fn resolve_roots(&self) -> Vec<PathBuf> {
        let home = dirs::home_dir();
        let mut resolved: Vec<PathBuf> = Vec::new();

        for root in &self.roots {
            let root = root.trim();
            if root.is_empty() {
                continue;
            }
            let path = expand_path(root, home.as_deref());
            if path.is_dir() && !resolved.contains(&path) {
                resolved.push(path);
            }
        }

        resolved
    }

    /// 由配置生成遍历过滤条件
    pub fn entry_filter(&self) -> EntryFilter {
        EntryFilter::new(self.exclude_names.clone(), self.max_depth)
    }

    /// 由配置生成打分选项
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            fuzzy: self.enable_fuzzy,
        }
    }
}

/// 展开 `~` 并把相对路径拼接到主目录下
pub fn expand_path(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };

    if path == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home.join(rest);
    }

    let candidate = PathBuf::from(path);
    if candidate.is_absolute() {
        candidate
    } else {
        home.join(candidate)
    }
}

impl Config {
    /// 从配置文件加载配置，文件不存在时使用默认配置
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load_from_file(config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// 从文件加载配置
    pub fn load_from_file(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("无法读取配置文件: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", config_path.display()))?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("无法序列化配置")?;

        fs::write(config_path, content)
            .with_context(|| format!("无法写入配置文件: {}", config_path.display()))?;

        Ok(())
    }

    /// 获取配置文件的默认路径（程序同级目录下的 config.toml）
    pub fn default_config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("无法获取程序路径")?;

        let exe_dir = exe_path.parent().context("无法获取程序目录")?;

        Ok(exe_dir.join("config.toml"))
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.search.max_results == 0 {
            anyhow::bail!("max_results 必须大于 0");
        }

        if self.search.worker_count == 0 || self.search.worker_count > MAX_WORKERS {
            anyhow::bail!("worker_count 必须在 1-{} 之间", MAX_WORKERS);
        }

        if self.search.max_depth < -1 {
            anyhow::bail!("max_depth 不能小于 -1");
        }

        Ok(())
    }
}
