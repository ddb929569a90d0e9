use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;

/// 日志记录器trait
pub trait LoggerTrait: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn log_message(&self, message: &str) -> Result<()>;
    fn log_entry(&self, path: &Path, status: &str) -> Result<()>;
    fn finalize(&self, summary: &RunSummary) -> Result<()>;
}

/// 一次搜索的统计信息，写入日志结尾
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub scanned_entries: u64,
    pub matched_entries: u64,
    pub shown_results: usize,
    pub duration: Duration,
}

/// 调试日志记录器
pub struct Logger {
    log_file: Arc<Mutex<Option<File>>>,
    log_path: Option<PathBuf>,
}

impl Logger {
    /// 创建新的日志记录器，日志文件写入当前目录
    pub fn new(enabled: bool) -> Result<Self> {
        Self::with_dir(enabled, Path::new("."))
    }

    /// 在指定目录下创建日志文件
    pub fn with_dir(enabled: bool, dir: &Path) -> Result<Self> {
        if !enabled {
            return Ok(Self {
                log_file: Arc::new(Mutex::new(None)),
                log_path: None,
            });
        }

        let now = Local::now();
        let log_path = dir.join(format!("debug_{}.log", now.format("%Y%m%d_%H%M%S")));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("无法创建日志文件: {}", log_path.display()))?;

        // 写入UTF-8 BOM以确保文件被正确识别为UTF-8
        file.write_all(&[0xEF, 0xBB, 0xBF])?;
        writeln!(file, "# NameFinder 调试日志")?;
        writeln!(file, "# 开始时间: {}", now.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "# --------------------------------------------")?;

        Ok(Self {
            log_file: Arc::new(Mutex::new(Some(file))),
            log_path: Some(log_path),
        })
    }

    /// 日志文件路径，未启用时为 `None`
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    fn write_line(&self, line: &str) -> Result<()> {
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(ref mut file) = *guard {
                writeln!(file, "{}", line)?;
                file.flush()?;
            }
        }
        Ok(())
    }
}

impl LoggerTrait for Logger {
    fn is_enabled(&self) -> bool {
        self.log_path.is_some()
    }

    fn log_message(&self, message: &str) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        self.write_line(&format!("[{}] {}", timestamp, message))
    }

    fn log_entry(&self, path: &Path, status: &str) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        self.write_line(&format!("[{}] 条目: {} | 状态: {}", timestamp, path.display(), status))
    }

    fn finalize(&self, summary: &RunSummary) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let now = Local::now();
        self.write_line("# --------------------------------------------")?;
        self.write_line(&format!("# 搜索完成时间: {}", now.format("%Y-%m-%d %H:%M:%S")))?;
        self.write_line(&format!("# 总用时: {:.3}秒", summary.duration.as_secs_f64()))?;
        self.write_line(&format!("# 扫描条目数: {}", summary.scanned_entries))?;
        self.write_line(&format!("# 匹配条目数: {}", summary.matched_entries))?;
        self.write_line(&format!("# 显示结果数: {}", summary.shown_results))?;
        self.write_line("# ============================================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_disabled_logger() {
        let logger = Logger::new(false).unwrap();
        assert!(!logger.is_enabled());
        assert!(logger.log_path().is_none());
        assert!(logger.log_message("ignored").is_ok());
    }

    #[test]
    fn test_logger_writes_file() {
        let dir = tempdir().unwrap();
        let logger = Logger::with_dir(true, dir.path()).unwrap();
        let logger_trait: &dyn LoggerTrait = &logger;

        assert!(logger_trait.is_enabled());
        logger_trait.log_message("test message").unwrap();
        logger_trait.log_entry(Path::new("/tmp/行动计划.txt"), "匹配").unwrap();
        logger_trait.finalize(&RunSummary::default()).unwrap();

        let content = std::fs::read_to_string(logger.log_path().unwrap()).unwrap();
        assert!(content.contains("test message"));
        assert!(content.contains("行动计划.txt"));
        assert!(content.contains("扫描条目数: 0"));
    }
}
