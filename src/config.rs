use std::env;
use std::path::PathBuf;

use crate::matcher::MatchStrategy;
use crate::picks_fetch::DEFAULT_API_BASE;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub match_strategy: MatchStrategy,
    pub persist_history: bool,
    /// `None` keeps every snapshot.
    pub history_max: Option<usize>,
    pub store_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let opt = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let api_base = opt("PICKS_API_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let match_strategy = opt("PICKS_MATCH_STRATEGY")
            .and_then(|s| MatchStrategy::parse(&s))
            .unwrap_or_default();
        let persist_history = opt("PICKS_HISTORY_PERSIST")
            .map(|s| parse_bool(&s, true))
            .unwrap_or(true);
        let history_max = opt("PICKS_HISTORY_MAX")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|max| *max > 0);

        Self {
            api_base,
            match_strategy,
            persist_history,
            history_max,
            store_path: opt("PICKS_STORE_PATH").map(PathBuf::from),
            log_file: opt("PICKS_LOG_FILE").map(PathBuf::from),
        }
    }
}

fn parse_bool(raw: &str, default: bool) -> bool {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
