use std::collections::HashMap;

use crate::state::ResultEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Case and punctuation insensitive; first key in payload order wins.
    #[default]
    Normalized,
    Exact,
}

impl MatchStrategy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normalized" | "normalised" | "fuzzy" => Some(Self::Normalized),
            "exact" => Some(Self::Exact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Win,
    Loss,
    Pending,
}

impl PickOutcome {
    pub fn label(self) -> &'static str {
        match self {
            PickOutcome::Win => "Win",
            PickOutcome::Loss => "Loss",
            PickOutcome::Pending => "Pending",
        }
    }
}

/// Lowercases and keeps only ASCII letters and digits.
pub fn normalize_matchup(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Results payload indexed for both join strategies.
#[derive(Debug, Clone, Default)]
pub struct ResultsBoard {
    entries: Vec<(String, ResultEntry)>,
    exact: HashMap<String, usize>,
    normalized: HashMap<String, usize>,
}

impl ResultsBoard {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, ResultEntry)>,
    {
        let entries: Vec<(String, ResultEntry)> = entries.into_iter().collect();
        let mut exact = HashMap::with_capacity(entries.len());
        let mut normalized = HashMap::with_capacity(entries.len());
        for (idx, (key, _)) in entries.iter().enumerate() {
            exact.entry(key.clone()).or_insert(idx);
            normalized.entry(normalize_matchup(key)).or_insert(idx);
        }
        Self {
            entries,
            exact,
            normalized,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, ResultEntry)] {
        &self.entries
    }

    pub fn lookup(&self, matchup: &str, strategy: MatchStrategy) -> Option<&ResultEntry> {
        let idx = match strategy {
            MatchStrategy::Exact => self.exact.get(matchup),
            MatchStrategy::Normalized => self.normalized.get(&normalize_matchup(matchup)),
        }?;
        self.entries.get(*idx).map(|(_, entry)| entry)
    }

    pub fn outcome(
        &self,
        matchup: &str,
        recommendation: Option<&str>,
        strategy: MatchStrategy,
    ) -> PickOutcome {
        let Some(entry) = self.lookup(matchup, strategy) else {
            return PickOutcome::Pending;
        };
        match (entry.result.as_deref(), recommendation) {
            (Some(result), Some(rec)) if result == rec => PickOutcome::Win,
            _ => PickOutcome::Loss,
        }
    }
}

/// Outcome of a pick against an optional results board; unset results and
/// missing matchups are always pending.
pub fn outcome_for(
    results: Option<&ResultsBoard>,
    matchup: Option<&str>,
    recommendation: Option<&str>,
    strategy: MatchStrategy,
) -> PickOutcome {
    match (results, matchup) {
        (Some(board), Some(matchup)) => board.outcome(matchup, recommendation, strategy),
        _ => PickOutcome::Pending,
    }
}
