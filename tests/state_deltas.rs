use chrono::{TimeZone, Utc};

use mlb_picks_terminal::history::PickHistory;
use mlb_picks_terminal::matcher::{MatchStrategy, PickOutcome, ResultsBoard};
use mlb_picks_terminal::state::{AppState, Delta, Pick, ResultEntry, Screen, apply_delta};

fn sample_pick() -> Pick {
    Pick {
        matchup: Some("A@B".to_string()),
        recommendation: Some("B".to_string()),
        ev: Some(1.5),
        parlay: Some(true),
        ..Pick::default()
    }
}

fn sample_results() -> ResultsBoard {
    ResultsBoard::from_entries([(
        "A@B".to_string(),
        ResultEntry {
            result: Some("B".to_string()),
        },
    )])
}

fn mounted(generation: u64) -> AppState {
    let mut state = AppState::new(PickHistory::new(None), MatchStrategy::Normalized);
    state.begin_mount(generation);
    state
}

#[test]
fn picks_and_results_combine_into_a_win() {
    let mut state = mounted(1);
    apply_delta(
        &mut state,
        Delta::SetPicks {
            generation: 1,
            picks: vec![sample_pick()],
            fetched_at: Utc::now(),
        },
    );
    apply_delta(
        &mut state,
        Delta::SetResults {
            generation: 1,
            results: sample_results(),
        },
    );

    state.toggle_ev_only();
    let filtered = state.filtered_picks();
    assert_eq!(filtered.len(), 1);
    assert_eq!(state.outcome(filtered[0]), PickOutcome::Win);
}

#[test]
fn picks_failure_clears_loading_with_empty_picks() {
    let mut state = mounted(1);
    assert!(state.loading);
    apply_delta(
        &mut state,
        Delta::PicksFailed {
            generation: 1,
            error: "request failed".to_string(),
        },
    );
    assert!(state.picks.is_empty());
    assert!(!state.loading);
    assert!(state.history.is_empty());
    assert!(
        state
            .logs
            .back()
            .is_some_and(|l| l.starts_with("[WARN] Error fetching MLB picks"))
    );
}

#[test]
fn results_do_not_clear_loading() {
    let mut state = mounted(1);
    apply_delta(
        &mut state,
        Delta::SetResults {
            generation: 1,
            results: sample_results(),
        },
    );
    assert!(state.loading);
    assert!(state.results.is_some());
}

#[test]
fn results_failure_leaves_results_unset_and_picks_pending() {
    let mut state = mounted(1);
    apply_delta(
        &mut state,
        Delta::SetPicks {
            generation: 1,
            picks: vec![sample_pick()],
            fetched_at: Utc::now(),
        },
    );
    apply_delta(
        &mut state,
        Delta::ResultsFailed {
            generation: 1,
            error: "timeout".to_string(),
        },
    );
    assert!(state.results.is_none());
    assert_eq!(state.outcome(&state.picks[0]), PickOutcome::Pending);
}

#[test]
fn each_successful_fetch_appends_one_history_entry() {
    let mut state = mounted(1);
    let fetched_at = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
    apply_delta(
        &mut state,
        Delta::SetPicks {
            generation: 1,
            picks: vec![sample_pick()],
            fetched_at,
        },
    );
    assert_eq!(state.history.len(), 1);
    assert_eq!(state.history.entries()[0].date, fetched_at);
    assert_eq!(state.history.entries()[0].picks, vec![sample_pick()]);
    assert!(state.take_history_dirty());
    assert!(!state.take_history_dirty());

    state.begin_mount(2);
    apply_delta(
        &mut state,
        Delta::SetPicks {
            generation: 2,
            picks: Vec::new(),
            fetched_at: Utc::now(),
        },
    );
    assert_eq!(state.history.len(), 2);
}

#[test]
fn stale_generation_deltas_are_ignored() {
    let mut state = mounted(1);
    state.begin_mount(2);
    apply_delta(
        &mut state,
        Delta::SetPicks {
            generation: 1,
            picks: vec![sample_pick()],
            fetched_at: Utc::now(),
        },
    );
    apply_delta(
        &mut state,
        Delta::SetResults {
            generation: 1,
            results: sample_results(),
        },
    );
    assert!(state.picks.is_empty());
    assert!(state.results.is_none());
    assert!(state.loading);
    assert!(state.history.is_empty());
}

#[test]
fn remount_keeps_history_but_resets_fetched_data() {
    let mut state = mounted(1);
    apply_delta(
        &mut state,
        Delta::SetPicks {
            generation: 1,
            picks: vec![sample_pick()],
            fetched_at: Utc::now(),
        },
    );
    state.begin_mount(2);
    assert!(state.loading);
    assert!(state.picks.is_empty());
    assert!(state.results.is_none());
    assert_eq!(state.history.len(), 1);
}

#[test]
fn toggles_and_screens_reset_scroll() {
    let mut state = mounted(1);
    apply_delta(
        &mut state,
        Delta::SetPicks {
            generation: 1,
            picks: vec![sample_pick(), sample_pick(), sample_pick()],
            fetched_at: Utc::now(),
        },
    );
    state.scroll_down();
    state.scroll_down();
    state.scroll_down();
    assert_eq!(state.scroll, 2);

    state.toggle_parlay_only();
    assert!(state.filter.parlay_only);
    assert_eq!(state.scroll, 0);

    state.scroll_down();
    state.set_screen(Screen::History);
    assert_eq!(state.scroll, 0);
}

#[test]
fn log_buffer_is_bounded() {
    let mut state = mounted(1);
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] 50"));
}
