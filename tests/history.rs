use chrono::{DateTime, TimeZone, Utc};

use mlb_picks_terminal::history::{HISTORY_DISPLAY_LIMIT, HISTORY_KEY, PickHistory};
use mlb_picks_terminal::persist::{FileStore, KeyValueStore, MemoryStore};
use mlb_picks_terminal::state::Pick;

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
}

fn picks(tag: &str) -> Vec<Pick> {
    vec![Pick {
        matchup: Some(format!("{tag}@home")),
        recommendation: Some("home".to_string()),
        ev: Some(0.5),
        ..Pick::default()
    }]
}

#[test]
fn append_grows_by_one_entry() {
    let mut history = PickHistory::new(None);
    for i in 0..3 {
        let before = history.len();
        history.append(picks(&i.to_string()), at(i));
        assert_eq!(history.len(), before + 1);
    }
}

#[test]
fn recent_shows_last_five_in_chronological_order() {
    let mut history = PickHistory::new(None);
    for i in 0..3 {
        history.append(picks(&i.to_string()), at(i));
    }
    assert_eq!(history.recent().len(), 3);

    for i in 3..8 {
        history.append(picks(&i.to_string()), at(i));
    }
    let recent = history.recent();
    assert_eq!(recent.len(), HISTORY_DISPLAY_LIMIT);
    assert_eq!(history.len(), 8);
    let hours: Vec<DateTime<Utc>> = recent.iter().map(|e| e.date).collect();
    assert_eq!(hours, (3..8).map(at).collect::<Vec<_>>());
}

#[test]
fn cap_drops_oldest_entries() {
    let mut history = PickHistory::new(Some(2));
    for i in 0..4 {
        history.append(picks(&i.to_string()), at(i));
    }
    assert_eq!(history.len(), 2);
    assert_eq!(history.entries()[0].date, at(2));
    assert_eq!(history.entries()[1].date, at(3));
}

#[test]
fn zero_cap_means_unbounded() {
    let history = PickHistory::new(Some(0));
    assert_eq!(history.max_entries(), None);
}

#[test]
fn save_then_load_restores_entries() {
    let mut store = MemoryStore::new();
    let mut history = PickHistory::new(None);
    history.append(picks("a"), at(1));
    history.append(Vec::new(), at(2));
    history.save(&mut store).expect("memory store accepts writes");

    let loaded = PickHistory::load(&store, None);
    assert_eq!(loaded, history);
}

#[test]
fn stored_json_uses_browser_field_names() {
    let mut store = MemoryStore::new();
    let mut history = PickHistory::new(None);
    history.append(
        vec![Pick {
            matchup: Some("A@B".to_string()),
            win_prob: Some(0.6),
            ..Pick::default()
        }],
        at(5),
    );
    history.save(&mut store).expect("memory store accepts writes");

    let raw = store.get(HISTORY_KEY).expect("history stored");
    assert!(raw.contains("\"winProb\":0.6"));
    assert!(raw.contains("\"date\":\"2025-06-01T05:00:00Z\""));
}

#[test]
fn corrupt_store_falls_back_to_empty() {
    let mut store = MemoryStore::new();
    store
        .set(HISTORY_KEY, "{not json".to_string())
        .expect("memory store accepts writes");
    assert!(PickHistory::load(&store, None).is_empty());

    let empty = MemoryStore::new();
    assert!(PickHistory::load(&empty, None).is_empty());
}

#[test]
fn loads_history_written_by_the_browser() {
    let mut store = MemoryStore::new();
    store
        .set(
            HISTORY_KEY,
            r#"[{"date":"2025-06-01T12:30:00.000Z","picks":[{"matchup":"A@B","ev":1.5}]},
                {"date":"2025-06-02T12:30:00.000Z","picks":{"error":"down"}}]"#
                .to_string(),
        )
        .expect("memory store accepts writes");

    let history = PickHistory::load(&store, None);
    assert_eq!(history.len(), 2);
    assert_eq!(history.entries()[0].picks[0].ev, Some(1.5));
    assert!(history.entries()[1].picks.is_empty());
}

#[test]
fn load_applies_cap() {
    let mut store = MemoryStore::new();
    let mut history = PickHistory::new(None);
    for i in 0..6 {
        history.append(picks(&i.to_string()), at(i));
    }
    history.save(&mut store).expect("memory store accepts writes");

    let capped = PickHistory::load(&store, Some(4));
    assert_eq!(capped.len(), 4);
    assert_eq!(capped.entries()[0].date, at(2));
}

#[test]
fn file_store_round_trips_across_opens() {
    let dir = std::env::temp_dir().join(format!(
        "mlb_picks_terminal_test_{}_{}",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let path = dir.join("store.json");

    let mut store = FileStore::open(&path);
    assert!(store.get(HISTORY_KEY).is_none());
    let mut history = PickHistory::new(None);
    history.append(picks("a"), at(1));
    history.save(&mut store).expect("file store writes");

    let reopened = FileStore::open(&path);
    assert_eq!(PickHistory::load(&reopened, None), history);

    std::fs::write(&path, "garbage").expect("overwrite store");
    let corrupt = FileStore::open(&path);
    assert!(PickHistory::load(&corrupt, None).is_empty());

    let _ = std::fs::remove_dir_all(dir);
}
