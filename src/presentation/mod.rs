pub mod display;

pub use display::{build_launcher_items, print_search_result, render_launcher_json, LauncherItem, SearchSummary};
