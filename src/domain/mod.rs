pub mod query;
pub mod transliteration;
pub mod matcher;
pub mod search;
pub mod file_walker;
pub mod ranker;

pub use query::{Query, TypeFilter};
pub use matcher::MatchOptions;
pub use transliteration::{PolyphonicDictionary, TransliterationCache, TransliterationEntry, DictionaryError};
pub use search::{Candidate, ScoredResult, BASELINE_SCORE};
pub use file_walker::{EntryFilter, WalkStats};
pub use ranker::{Ranker, SortMode};
