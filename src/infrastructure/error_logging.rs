use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Local;

/// 错误类型分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// 目录列举或条目访问失败（如权限不足）
    EntryAccess,
    /// 读取条目元数据失败
    Metadata,
    /// 多音字字典加载失败
    DictionaryLoad,
    /// 调试日志写入失败
    LogWrite,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::EntryAccess => "条目访问",
            ErrorType::Metadata => "元数据读取",
            ErrorType::DictionaryLoad => "字典加载",
            ErrorType::LogWrite => "日志写入",
        }
    }
}

/// 错误日志记录器
///
/// 错误计数总是保留；只有启用时才写入错误日志文件。
pub struct ErrorLogger {
    error_file: Arc<Mutex<Option<File>>>,
    error_path: Option<PathBuf>,
    error_counts: Arc<Mutex<HashMap<ErrorType, usize>>>,
}

impl ErrorLogger {
    /// 创建新的错误日志记录器，日志文件写入当前目录
    pub fn new(enabled: bool) -> Result<Self> {
        Self::with_dir(enabled, Path::new("."))
    }

    /// 在指定目录下创建错误日志文件
    pub fn with_dir(enabled: bool, dir: &Path) -> Result<Self> {
        let mut logger = Self {
            error_file: Arc::new(Mutex::new(None)),
            error_path: None,
            error_counts: Arc::new(Mutex::new(HashMap::new())),
        };
        if !enabled {
            return Ok(logger);
        }

        let now = Local::now();
        let error_path = dir.join(format!("error_{}.log", now.format("%Y%m%d_%H%M%S")));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&error_path)
            .with_context(|| format!("无法创建错误日志文件: {}", error_path.display()))?;

        file.write_all(&[0xEF, 0xBB, 0xBF])?; // UTF-8 BOM
        writeln!(file, "# NameFinder 错误日志")?;
        writeln!(file, "# 开始时间: {}", now.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "# ============================================")?;
        writeln!(file)?;

        logger.error_file = Arc::new(Mutex::new(Some(file)));
        logger.error_path = Some(error_path);
        Ok(logger)
    }

    /// 记录错误
    pub fn log_error(
        &self,
        error_type: ErrorType,
        path: Option<&str>,
        message: &str,
        details: Option<&str>,
    ) -> Result<()> {
        if let Ok(mut counts) = self.error_counts.lock() {
            *counts.entry(error_type).or_insert(0) += 1;
        }

        if let Ok(mut file_guard) = self.error_file.lock() {
            if let Some(ref mut file) = *file_guard {
                let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                writeln!(file, "[{}] {} - {}", timestamp, error_type.as_str(), message)?;

                if let Some(path) = path {
                    writeln!(file, "  路径: {}", path)?;
                }
                if let Some(detail) = details {
                    writeln!(file, "  详细信息: {}", detail)?;
                }

                writeln!(file)?;
                file.flush()?;
            }
        }

        Ok(())
    }

    /// 获取错误统计信息
    pub fn get_error_summary(&self) -> HashMap<ErrorType, usize> {
        match self.error_counts.lock() {
            Ok(counts) => counts.clone(),
            Err(_) => HashMap::new(),
        }
    }

    /// 获取总错误数
    pub fn get_total_errors(&self) -> usize {
        self.get_error_summary().values().sum()
    }

    pub fn has_errors(&self) -> bool {
        self.get_total_errors() > 0
    }

    /// 完成错误日志记录
    pub fn finalize(&self) -> Result<()> {
        if let Ok(mut file_guard) = self.error_file.lock() {
            if let Some(ref mut file) = *file_guard {
                writeln!(file, "# ============================================")?;
                writeln!(file, "# 结束时间: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;

                let summary = self.get_error_summary();
                if summary.is_empty() {
                    writeln!(file, "# 无错误记录")?;
                } else {
                    writeln!(file, "# 错误统计:")?;
                    for (error_type, count) in &summary {
                        writeln!(file, "#   {}: {} 次", error_type.as_str(), count)?;
                    }
                    writeln!(file, "#   总计: {} 个错误", summary.values().sum::<usize>())?;
                }

                file.flush()?;
            }
        }

        Ok(())
    }

    /// 打印错误摘要到标准错误输出
    pub fn print_error_summary(&self) {
        if !self.has_errors() {
            return;
        }

        eprintln!("\n⚠️  搜索过程中跳过了部分条目:");
        eprintln!("----------------------------");
        for (error_type, count) in &self.get_error_summary() {
            eprintln!("  {}: {} 次", error_type.as_str(), count);
        }
        eprintln!("  总计: {} 个错误", self.get_total_errors());
        if let Some(path) = &self.error_path {
            eprintln!("  详细错误信息请查看: {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_counts_without_file() {
        let logger = ErrorLogger::new(false).unwrap();
        assert!(!logger.has_errors());

        logger
            .log_error(ErrorType::EntryAccess, Some("/root/secret"), "权限不足", None)
            .unwrap();
        logger.log_error(ErrorType::EntryAccess, None, "遍历错误", None).unwrap();

        assert_eq!(logger.get_total_errors(), 2);
        assert_eq!(logger.get_error_summary().get(&ErrorType::EntryAccess), Some(&2));
    }

    #[test]
    fn test_error_file() {
        let dir = tempdir().unwrap();
        let logger = ErrorLogger::with_dir(true, dir.path()).unwrap();

        logger
            .log_error(ErrorType::DictionaryLoad, Some("polyphonic.json"), "测试错误", Some("详细信息"))
            .unwrap();
        logger.finalize().unwrap();

        let path = logger.error_path.clone().unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("字典加载 - 测试错误"));
        assert!(content.contains("总计: 1 个错误"));
    }

    #[test]
    fn test_error_types() {
        assert_eq!(ErrorType::EntryAccess.as_str(), "条目访问");
        assert_eq!(ErrorType::Metadata.as_str(), "元数据读取");
    }
}
