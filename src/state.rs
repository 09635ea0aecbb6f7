use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::history::PickHistory;
use crate::matcher::{MatchStrategy, PickOutcome, ResultsBoard};

/// One betting recommendation as served by the picks endpoint.
///
/// Every field is optional on the wire. A field holding the wrong JSON type
/// is read as absent instead of failing the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub matchup: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub away_pitcher: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub home_pitcher: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(
        rename = "winProb",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub win_prob: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub odds: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub ev: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub parlay: Option<bool>,
}

impl Pick {
    /// Non-object values become an empty pick so payload order and count survive.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// Actual outcome of a game, keyed by matchup in the results payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub result: Option<String>,
}

/// Snapshot of the picks served by one successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_picks")]
    pub picks: Vec<Pick>,
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => Some(b),
        _ => None,
    })
}

fn lenient_picks<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Pick>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.into_iter().map(Pick::from_value).collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Picks,
    History,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickFilter {
    pub ev_only: bool,
    pub parlay_only: bool,
}

impl PickFilter {
    pub fn accepts(&self, pick: &Pick) -> bool {
        // NaN and missing EV both fail the comparison.
        if self.ev_only && !pick.ev.is_some_and(|ev| ev > 0.0) {
            return false;
        }
        if self.parlay_only && pick.parlay != Some(true) {
            return false;
        }
        true
    }
}

/// Subsequence of `picks` accepted by `filter`, in the original order.
pub fn filter_picks(picks: &[Pick], filter: PickFilter) -> Vec<&Pick> {
    picks.iter().filter(|pick| filter.accepts(pick)).collect()
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub filter: PickFilter,
    pub picks: Vec<Pick>,
    pub results: Option<ResultsBoard>,
    pub loading: bool,
    pub history: PickHistory,
    pub history_dirty: bool,
    pub match_strategy: MatchStrategy,
    pub generation: u64,
    pub scroll: u16,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PickHistory::default(), MatchStrategy::default())
    }
}

impl AppState {
    pub fn new(history: PickHistory, match_strategy: MatchStrategy) -> Self {
        Self {
            screen: Screen::Picks,
            filter: PickFilter::default(),
            picks: Vec::with_capacity(32),
            results: None,
            loading: true,
            history,
            history_dirty: false,
            match_strategy,
            generation: 0,
            scroll: 0,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    /// Resets fetched data for a fresh mount. History is kept.
    pub fn begin_mount(&mut self, generation: u64) {
        self.generation = generation;
        self.picks.clear();
        self.results = None;
        self.loading = true;
        self.scroll = 0;
    }

    pub fn filtered_picks(&self) -> Vec<&Pick> {
        filter_picks(&self.picks, self.filter)
    }

    pub fn outcome(&self, pick: &Pick) -> PickOutcome {
        crate::matcher::outcome_for(
            self.results.as_ref(),
            pick.matchup.as_deref(),
            pick.recommendation.as_deref(),
            self.match_strategy,
        )
    }

    pub fn toggle_ev_only(&mut self) {
        self.filter.ev_only = !self.filter.ev_only;
        self.scroll = 0;
    }

    pub fn toggle_parlay_only(&mut self) {
        self.filter.parlay_only = !self.filter.parlay_only;
        self.scroll = 0;
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.scroll = 0;
        }
    }

    pub fn scroll_down(&mut self) {
        let max = match self.screen {
            Screen::Picks => self.filtered_picks().len(),
            Screen::History => self.history.recent().len(),
        };
        if (self.scroll as usize + 1) < max {
            self.scroll = self.scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn take_history_dirty(&mut self) -> bool {
        std::mem::take(&mut self.history_dirty)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetPicks {
        generation: u64,
        picks: Vec<Pick>,
        fetched_at: DateTime<Utc>,
    },
    PicksFailed {
        generation: u64,
        error: String,
    },
    SetResults {
        generation: u64,
        results: ResultsBoard,
    },
    ResultsFailed {
        generation: u64,
        error: String,
    },
    Log(String),
}

impl Delta {
    fn generation(&self) -> Option<u64> {
        match self {
            Delta::SetPicks { generation, .. }
            | Delta::PicksFailed { generation, .. }
            | Delta::SetResults { generation, .. }
            | Delta::ResultsFailed { generation, .. } => Some(*generation),
            Delta::Log(_) => None,
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    if let Some(generation) = delta.generation() {
        if generation != state.generation {
            return;
        }
    }

    match delta {
        Delta::SetPicks {
            picks, fetched_at, ..
        } => {
            state.history.append(picks.clone(), fetched_at);
            state.history_dirty = true;
            state.picks = picks;
            state.loading = false;
            state.push_log(format!("[INFO] Loaded {} picks", state.picks.len()));
        }
        Delta::PicksFailed { error, .. } => {
            state.picks.clear();
            state.loading = false;
            state.push_log(format!("[WARN] Error fetching MLB picks: {error}"));
        }
        Delta::SetResults { results, .. } => {
            state.push_log(format!("[INFO] Loaded {} results", results.len()));
            state.results = Some(results);
        }
        Delta::ResultsFailed { error, .. } => {
            state.results = None;
            state.push_log(format!("[WARN] Error fetching results: {error}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

/// Formats a number the way a browser prints it: whole values lose the `.0`
/// and switch to exponent notation from 1e21.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() || value.fract() != 0.0 {
        return format!("{value}");
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.abs() >= 1e21 {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => formatted,
        };
    }
    format!("{value:.0}")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

pub fn matchup_label<'a>(pick: &'a Pick, fallback: &'a str) -> &'a str {
    non_empty(pick.matchup.as_deref()).unwrap_or(fallback)
}

pub fn pitcher_label(name: Option<&str>) -> &str {
    non_empty(name).unwrap_or("TBD")
}

pub fn recommendation_label(pick: &Pick) -> &str {
    non_empty(pick.recommendation.as_deref()).unwrap_or("N/A")
}

pub fn win_prob_label(win_prob: Option<f64>) -> String {
    match win_prob {
        Some(p) if p != 0.0 && !p.is_nan() => format!("{}%", format_number((p * 100.0).round())),
        _ => "N/A".to_string(),
    }
}

pub fn odds_label(odds: Option<f64>) -> String {
    match odds {
        Some(o) if o > 0.0 => format!("+{}", format_number(o)),
        Some(o) => format_number(o),
        None => "N/A".to_string(),
    }
}

pub fn ev_label(ev: Option<f64>) -> String {
    ev.map(format_number).unwrap_or_else(|| "N/A".to_string())
}

pub fn parlay_label(parlay: Option<bool>) -> &'static str {
    match parlay {
        Some(true) => "Yes",
        Some(false) => "No",
        None => "N/A",
    }
}

pub fn ev_toggle_label(filter: PickFilter) -> &'static str {
    if filter.ev_only {
        "Showing +EV Only"
    } else {
        "Show +EV Only"
    }
}

pub fn parlay_toggle_label(filter: PickFilter) -> &'static str {
    if filter.parlay_only {
        "Showing Parlay Picks"
    } else {
        "Show Parlay Picks"
    }
}
