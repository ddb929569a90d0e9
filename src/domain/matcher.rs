use crate::domain::transliteration::{contains_cjk, PolyphonicDictionary, TransliterationCache, TransliterationEntry};

pub const SCORE_RAW_EXACT: u32 = 500;
pub const SCORE_RAW_PREFIX: u32 = 450;
pub const SCORE_RAW_SUBSTRING: u32 = 420;
pub const SCORE_RAW_SUBSEQUENCE: u32 = 400;

pub const SCORE_INITIALS_EXACT: u32 = 380;
pub const SCORE_INITIALS_SUBSTRING: u32 = 260;
pub const SCORE_INITIALS_SUBSEQUENCE: u32 = 240;

pub const SCORE_FULL_EXACT: u32 = 350;
pub const SCORE_FULL_PREFIX: u32 = 300;
pub const SCORE_FULL_SUBSTRING: u32 = 280;

pub const SCORE_POLYPHONE_PREFIX: u32 = 200;
pub const SCORE_POLYPHONE_SUBSTRING: u32 = 180;
pub const SCORE_POLYPHONE_SUBSEQUENCE: u32 = 150;

pub const SCORE_FUZZY: u32 = 100;

/// 原文子序列匹配的最短查询长度
const MIN_SUBSEQUENCE_QUERY_LEN: usize = 2;
/// 编辑距离容错的最短查询长度
const MIN_FUZZY_QUERY_LEN: usize = 4;

/// 打分选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// 是否启用编辑距离容错
    pub fuzzy: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { fuzzy: true }
    }
}

/// 使用默认选项计算查询与名称的匹配分数
pub fn score(query: &str, name: &str, cache: &TransliterationCache) -> u32 {
    score_with(query, name, cache, MatchOptions::default())
}

/// 计算查询与名称的匹配分数
///
/// 分数越高匹配越强，0 表示不匹配。各层级独立计算后取最大值：
/// 原文匹配 > 首字母匹配 > 全拼匹配 > 多音字重试 > 编辑距离容错，
/// 后两层只在前面各层都未命中时才尝试。
/// 不含中文的名称只做原文匹配，不进行拼音相关的计算。
pub fn score_with(query: &str, name: &str, cache: &TransliterationCache, options: MatchOptions) -> u32 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0;
    }

    let raw = raw_score(&query, &name.to_lowercase());
    if !contains_cjk(name) {
        return raw;
    }

    let entry = cache.get(name);
    let best = raw
        .max(initials_score(&query, &entry.initials))
        .max(full_score(&query, &entry.full));
    if best > 0 {
        return best;
    }

    let polyphone = polyphone_score(&query, &entry, cache.dictionary());
    if polyphone > 0 {
        return polyphone;
    }

    if !options.fuzzy {
        return 0;
    }
    fuzzy_score(&query, &entry.full)
}

/// 原文匹配：完全相等 > 前缀 > 子串 > 子序列
fn raw_score(query: &str, name_lower: &str) -> u32 {
    if name_lower == query {
        SCORE_RAW_EXACT
    } else if name_lower.starts_with(query) {
        SCORE_RAW_PREFIX
    } else if name_lower.contains(query) {
        SCORE_RAW_SUBSTRING
    } else if query.chars().count() >= MIN_SUBSEQUENCE_QUERY_LEN && is_subsequence(query, name_lower) {
        SCORE_RAW_SUBSEQUENCE
    } else {
        0
    }
}

fn initials_score(query: &str, initials: &str) -> u32 {
    if initials.is_empty() {
        0
    } else if initials == query {
        SCORE_INITIALS_EXACT
    } else if initials.contains(query) {
        SCORE_INITIALS_SUBSTRING
    } else if is_subsequence(query, initials) {
        SCORE_INITIALS_SUBSEQUENCE
    } else {
        0
    }
}

fn full_score(query: &str, full: &str) -> u32 {
    if full.is_empty() {
        0
    } else if full == query {
        SCORE_FULL_EXACT
    } else if full.starts_with(query) {
        SCORE_FULL_PREFIX
    } else if full.contains(query) {
        SCORE_FULL_SUBSTRING
    } else {
        0
    }
}

/// 多音字重试：每次只替换一个位置的读音，重新拼出全拼后比较
fn polyphone_score(query: &str, entry: &TransliterationEntry, dictionary: &PolyphonicDictionary) -> u32 {
    let mut best = 0;

    for (idx, (c, current)) in entry.syllables.iter().enumerate() {
        let Some(readings) = dictionary.readings(*c) else {
            continue;
        };

        for alt in readings.iter().filter(|r| *r != current) {
            let rebuilt = rebuild_full(&entry.syllables, idx, alt);
            let score = if rebuilt.starts_with(query) {
                SCORE_POLYPHONE_PREFIX
            } else if rebuilt.contains(query) {
                SCORE_POLYPHONE_SUBSTRING
            } else if is_subsequence(query, &rebuilt) {
                SCORE_POLYPHONE_SUBSEQUENCE
            } else {
                0
            };

            if score == SCORE_POLYPHONE_PREFIX {
                return score;
            }
            best = best.max(score);
        }
    }

    best
}

fn rebuild_full(syllables: &[(char, String)], idx: usize, alt: &str) -> String {
    syllables
        .iter()
        .enumerate()
        .map(|(i, (_, reading))| if i == idx { alt } else { reading.as_str() })
        .collect()
}

/// 编辑距离容错：先用长度差做廉价过滤，再计算编辑距离
fn fuzzy_score(query: &str, full: &str) -> u32 {
    let query_len = query.chars().count();
    let full_len = full.chars().count();

    if full.is_empty() || query_len < MIN_FUZZY_QUERY_LEN || query_len.abs_diff(full_len) > 1 {
        return 0;
    }

    if levenshtein(query, full) <= 1 {
        SCORE_FUZZY
    } else {
        0
    }
}

/// `needle` 的字符是否按顺序出现在 `haystack` 中
pub fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut haystack = haystack.chars();
    needle.chars().all(|n| haystack.any(|h| h == n))
}

/// 按字符计算的编辑距离
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
