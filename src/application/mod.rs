pub mod config;
pub mod engine;

pub use config::{Config, SearchConfig};
pub use engine::{load_dictionary, SearchEngine, SearchOutcome};
