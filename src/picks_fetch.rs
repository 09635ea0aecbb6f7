use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::http_client::get_text;
use crate::matcher::ResultsBoard;
use crate::state::{Pick, ResultEntry};

pub const DEFAULT_API_BASE: &str = "https://mlb-betting-app-1.onrender.com";
const PICKS_PATH: &str = "/api/mlb/picks";
const RESULTS_PATH: &str = "/api/mlb/results";

#[derive(Debug, Clone, Default)]
pub struct PicksPayload {
    pub picks: Vec<Pick>,
    /// False when the body was valid JSON but not an array.
    pub was_array: bool,
}

pub fn picks_url(base_url: &str) -> String {
    format!("{}{PICKS_PATH}", base_url.trim_end_matches('/'))
}

pub fn results_url(base_url: &str) -> String {
    format!("{}{RESULTS_PATH}", base_url.trim_end_matches('/'))
}

pub fn fetch_picks(base_url: &str) -> Result<PicksPayload> {
    let body = get_text(&picks_url(base_url)).context("picks request failed")?;
    parse_picks_json(&body)
}

pub fn fetch_results(base_url: &str) -> Result<ResultsBoard> {
    let body = get_text(&results_url(base_url)).context("results request failed")?;
    parse_results_json(&body)
}

pub fn parse_picks_json(raw: &str) -> Result<PicksPayload> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid picks json")?;
    Ok(match root {
        Value::Array(items) => PicksPayload {
            picks: items.into_iter().map(Pick::from_value).collect(),
            was_array: true,
        },
        _ => PicksPayload::default(),
    })
}

pub fn parse_results_json(raw: &str) -> Result<ResultsBoard> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid results json")?;
    let Value::Object(map) = root else {
        return Err(anyhow!("results payload is not an object"));
    };
    Ok(ResultsBoard::from_entries(map.into_iter().map(|(key, value)| {
        let entry = serde_json::from_value::<ResultEntry>(value).unwrap_or_default();
        (key, entry)
    })))
}

#[cfg(test)]
mod tests {
    use super::{picks_url, results_url};

    #[test]
    fn urls_tolerate_trailing_slash() {
        assert_eq!(
            picks_url("https://example.com/"),
            "https://example.com/api/mlb/picks"
        );
        assert_eq!(
            results_url("https://example.com"),
            "https://example.com/api/mlb/results"
        );
    }
}
