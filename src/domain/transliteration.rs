use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use pinyin::ToPinyin;
use thiserror::Error;

/// 内置的多音字表，外部字典缺失或损坏时使用
const BUILTIN_POLYPHONES: &[(char, &[&str])] = &[
    ('行', &["hang", "xing"]),
    ('长', &["chang", "zhang"]),
    ('重', &["chong", "zhong"]),
    ('乐', &["le", "yue"]),
    ('处', &["chu", "cu"]),
    ('还', &["hai", "huan"]),
    ('藏', &["cang", "zang"]),
    ('假', &["jia", "jie"]),
    ('召', &["zhao", "shao"]),
];

/// 字典加载错误
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("无法读取多音字字典 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("无法解析多音字字典 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("多音字字典中没有可用条目: {0}")]
    Empty(String),
}

/// 判断字符是否为中日韩统一表意文字
pub fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}')
}

/// 判断字符串是否包含中文字符
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// 多音字字典：字符 -> 有序读音列表，第一个读音为默认读音
#[derive(Debug, Clone, Default)]
pub struct PolyphonicDictionary {
    entries: HashMap<char, Vec<String>>,
}

impl PolyphonicDictionary {
    /// 内置的最小多音字表
    pub fn builtin() -> Self {
        let entries = BUILTIN_POLYPHONES
            .iter()
            .map(|(c, readings)| (*c, readings.iter().map(|r| r.to_string()).collect()))
            .collect();
        Self { entries }
    }

    /// 从 JSON 文件加载字典，格式为 `{"行": ["hang", "xing"], ...}`
    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: display.clone(),
            source,
        })?;
        let raw: HashMap<String, Vec<String>> =
            serde_json::from_str(&content).map_err(|source| DictionaryError::Parse {
                path: display.clone(),
                source,
            })?;

        let dictionary = Self::from_raw(raw);
        if dictionary.is_empty() {
            return Err(DictionaryError::Empty(display));
        }
        Ok(dictionary)
    }

    fn from_raw(raw: HashMap<String, Vec<String>>) -> Self {
        let mut entries = HashMap::with_capacity(raw.len());
        for (key, readings) in raw {
            // 只接受单个字符的键
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                continue;
            };
            let readings: Vec<String> = readings
                .iter()
                .map(|r| r.trim().to_lowercase())
                .filter(|r| !r.is_empty())
                .collect();
            if !readings.is_empty() {
                entries.insert(c, readings);
            }
        }
        Self { entries }
    }

    /// 字符的全部读音
    pub fn readings(&self, c: char) -> Option<&[String]> {
        self.entries.get(&c).map(|v| v.as_slice())
    }

    /// 字符的默认读音
    pub fn default_reading(&self, c: char) -> Option<&str> {
        self.readings(c).and_then(|v| v.first()).map(|s| s.as_str())
    }

    /// 除默认读音外的其他读音
    pub fn alternates(&self, c: char) -> &[String] {
        match self.entries.get(&c) {
            Some(readings) if readings.len() > 1 => &readings[1..],
            _ => &[],
        }
    }

    /// 字符是否有多个读音
    pub fn has_alternates(&self, c: char) -> bool {
        !self.alternates(c).is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 单个名称的拼音形式
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransliterationEntry {
    /// 全拼，如 `hangdongjihua`
    pub full: String,
    /// 首字母，如 `hdjh`
    pub initials: String,
    /// 每个中文字符及其采用的默认读音，供多音字重试使用
    pub syllables: Vec<(char, String)>,
}

/// 拼音缓存
///
/// 按名称懒加载，命中时只取共享锁，未命中时在锁外计算，再短暂持有独占锁写入。
/// 多音字字典在进程启动时加载一次，之后只读。
pub struct TransliterationCache {
    dictionary: Arc<PolyphonicDictionary>,
    entries: RwLock<HashMap<String, Arc<TransliterationEntry>>>,
    computations: AtomicU64,
}

impl TransliterationCache {
    pub fn new(dictionary: Arc<PolyphonicDictionary>) -> Self {
        Self {
            dictionary,
            entries: RwLock::new(HashMap::new()),
            computations: AtomicU64::new(0),
        }
    }

    pub fn dictionary(&self) -> &PolyphonicDictionary {
        &self.dictionary
    }

    /// 获取名称的全拼与首字母，未命中时计算并写入缓存
    pub fn get(&self, name: &str) -> Arc<TransliterationEntry> {
        if let Some(entry) = self.entries.read().get(name) {
            return Arc::clone(entry);
        }

        let entry = Arc::new(self.transliterate(name));
        self.computations.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.write();
        Arc::clone(entries.entry(name.to_string()).or_insert(entry))
    }

    /// 单个字符的默认读音：多音字字典优先，其次使用拼音库
    pub fn default_reading(&self, c: char) -> Option<String> {
        if let Some(reading) = self.dictionary.default_reading(c) {
            return Some(reading.to_string());
        }
        c.to_pinyin().map(|p| p.plain().to_string())
    }

    fn transliterate(&self, name: &str) -> TransliterationEntry {
        let mut entry = TransliterationEntry::default();

        // 非中文字符不参与转换
        for c in name.chars().filter(|c| is_cjk(*c)) {
            let Some(reading) = self.default_reading(c) else {
                continue;
            };
            if let Some(first) = reading.chars().next() {
                entry.initials.push(first);
            }
            entry.full.push_str(&reading);
            entry.syllables.push((c, reading));
        }

        entry
    }

    /// 已缓存的名称数量
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 实际执行转换的次数（缓存未命中次数）
    pub fn computed_count(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }
}
