// 三层架构模块
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

// 重新导出主要类型
pub use domain::{Candidate, PolyphonicDictionary, Query, ScoredResult, SortMode, TransliterationCache, TypeFilter};
pub use application::{Config, SearchConfig, SearchEngine, SearchOutcome};
pub use infrastructure::{ErrorLogger, ErrorType, Logger, LoggerTrait};
pub use presentation::{render_launcher_json, SearchSummary};
