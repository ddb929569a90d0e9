use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use humansize::{format_size, BINARY};
use serde::Serialize;

use crate::domain::{ScoredResult, SortMode};

/// 格式化文件大小
pub fn format_file_size(size: u64) -> String {
    format_size(size, BINARY)
}

/// 格式化时间为本地时间
pub fn format_time(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}.{:03}s", secs, duration.subsec_millis())
    }
}

/// 按排序方式选择显示的时间标签
fn time_label(result: &ScoredResult, sort_mode: SortMode) -> String {
    let candidate = &result.candidate;
    if sort_mode.uses_created_time() {
        format!("添加时间: {}", format_time(candidate.created))
    } else {
        format!("修改时间: {}", format_time(candidate.modified))
    }
}

fn parent_display(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

/// 结果的描述行：目录只显示父目录，文件附带大小与时间
pub fn describe(result: &ScoredResult, sort_mode: SortMode) -> String {
    let candidate = &result.candidate;
    let parent = parent_display(&candidate.path);

    if candidate.is_dir {
        parent
    } else {
        format!(
            "{} | {} | {}",
            parent,
            format_file_size(candidate.size),
            time_label(result, sort_mode)
        )
    }
}

/// 输出单条搜索结果
pub fn print_search_result(result: &ScoredResult, sort_mode: SortMode) -> Result<()> {
    let mut stdout = io::stdout().lock();
    let candidate = &result.candidate;

    let color = if candidate.is_dir { "1;34" } else { "1;32" };
    writeln!(
        stdout,
        "\x1b[{}m{}\x1b[0m \x1b[2;37m[{}]\x1b[0m",
        color, candidate.name, result.score
    )?;
    writeln!(stdout, "  {}", describe(result, sort_mode))?;

    Ok(())
}

/// 启动器结果图标
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LauncherIcon {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
}

/// 启动器结果条目
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LauncherItem {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub arg: String,
    pub valid: bool,
    pub icon: LauncherIcon,
}

#[derive(Serialize)]
struct LauncherOutput<'a> {
    items: &'a [LauncherItem],
}

/// 将结果转换为启动器条目，没有结果时返回一个不可执行的提示条目
pub fn build_launcher_items(results: &[ScoredResult], sort_mode: SortMode) -> Vec<LauncherItem> {
    if results.is_empty() {
        return vec![LauncherItem {
            uid: String::new(),
            title: "没有找到匹配结果".to_string(),
            subtitle: "请尝试调整关键词或目录设置".to_string(),
            arg: String::new(),
            valid: false,
            icon: LauncherIcon {
                kind: "icon".to_string(),
                path: "icon.png".to_string(),
            },
        }];
    }

    results
        .iter()
        .map(|result| {
            let path = result.candidate.path.display().to_string();
            LauncherItem {
                uid: path.clone(),
                title: result.candidate.name.clone(),
                subtitle: describe(result, sort_mode),
                arg: path.clone(),
                valid: true,
                icon: LauncherIcon {
                    kind: "fileicon".to_string(),
                    path,
                },
            }
        })
        .collect()
}

/// 生成启动器使用的 JSON：`{"items": [...]}`
pub fn render_launcher_json(results: &[ScoredResult], sort_mode: SortMode) -> Result<String> {
    let items = build_launcher_items(results, sort_mode);
    serde_json::to_string(&LauncherOutput { items: &items }).context("无法序列化搜索结果")
}

/// 搜索摘要
pub struct SearchSummary {
    pub duration: Duration,
    pub scanned_entries: u64,
    pub matched_entries: usize,
    pub shown_results: usize,
    pub cached_names: usize,
}

impl SearchSummary {
    pub fn print(&self) -> Result<()> {
        let mut stdout = io::stdout().lock();

        writeln!(stdout, "\n搜索摘要:")?;
        writeln!(stdout, "----------------------------")?;
        writeln!(stdout, "总用时: {}", format_duration(self.duration))?;
        writeln!(stdout, "扫描条目: {}", self.scanned_entries)?;
        writeln!(stdout, "匹配条目: {}", self.matched_entries)?;
        writeln!(stdout, "显示结果: {}", self.shown_results)?;
        writeln!(stdout, "拼音缓存: {} 个名称", self.cached_names)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Candidate;
    use std::path::PathBuf;

    fn result(path: &str, is_dir: bool, size: u64) -> ScoredResult {
        let path = PathBuf::from(path);
        ScoredResult::new(
            Candidate {
                name: path.file_name().unwrap().to_string_lossy().to_string(),
                path,
                is_dir,
                modified: SystemTime::UNIX_EPOCH,
                created: SystemTime::UNIX_EPOCH,
                size,
            },
            400,
        )
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn test_describe() {
        let dir = result("/home/user/照片", true, 0);
        assert_eq!(describe(&dir, SortMode::ModTimeDesc), "/home/user");

        let file = result("/home/user/背景图.png", false, 2048);
        let line = describe(&file, SortMode::ModTimeDesc);
        assert!(line.starts_with("/home/user | 2 KiB | 修改时间: "));

        let line = describe(&file, SortMode::AddTimeAsc);
        assert!(line.contains("添加时间: "));
    }

    #[test]
    fn test_launcher_items() {
        let items = build_launcher_items(&[result("/tmp/a.txt", false, 1)], SortMode::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "a.txt");
        assert_eq!(items[0].arg, "/tmp/a.txt");
        assert_eq!(items[0].uid, "/tmp/a.txt");
        assert!(items[0].valid);
        assert_eq!(items[0].icon.kind, "fileicon");
    }

    #[test]
    fn test_empty_results_placeholder() {
        let json = render_launcher_json(&[], SortMode::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let items = value["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["valid"], false);
        assert_eq!(items[0]["title"], "没有找到匹配结果");
        assert_eq!(items[0]["icon"]["type"], "icon");
    }
}
