use lyraoke_sync::transcript::LoadError;
use lyraoke_sync::{DisplayUpdate, LoadParams, SyncEngine, SyncState, TranscriptStore};
use serde_json::json;

fn hello_world() -> TranscriptStore {
    TranscriptStore::load(&json!([{
        "text": "hello world",
        "words": [
            { "word": "hello", "start": 0.0, "end": 0.4 },
            { "word": "world", "start": 0.5, "end": 0.9 },
        ]
    }]))
    .expect("fixture should load")
}

fn two_lines() -> TranscriptStore {
    TranscriptStore::load(&json!([
        { "text": "a b", "words": [{ "word": "a", "start": 0 }, { "word": "b", "start": 1 }] },
        { "text": "c d", "words": [{ "word": "c", "start": 2 }, { "word": "d", "start": 3 }] },
    ]))
    .expect("fixture should load")
}

fn five_lines() -> TranscriptStore {
    let segments: Vec<_> = (0..5)
        .map(|line| {
            json!({
                "text": format!("line {line}"),
                "words": [
                    { "word": format!("w{line}a"), "start": line as f64 * 2.0 },
                    { "word": format!("w{line}b"), "start": line as f64 * 2.0 + 1.0 },
                ]
            })
        })
        .collect();
    TranscriptStore::load(&serde_json::Value::Array(segments)).expect("fixture should load")
}

fn engine_with(store: TranscriptStore) -> SyncEngine {
    let mut engine = SyncEngine::default();
    engine.load(store);
    engine
}

#[test]
fn word_inside_single_line() {
    let mut engine = engine_with(hello_world());

    let update = engine.advance_to(0.6);
    assert_eq!(update.active_word, "world");
    assert_eq!(update.current_time, 0.6);
    assert_eq!(update.context_lines, ["hello world"]);
}

#[test]
fn time_before_first_word_shows_nothing() {
    let mut engine = engine_with(hello_world());

    let update = engine.advance_to(-1.0);
    assert_eq!(update, DisplayUpdate::empty());
    assert!(update.context_lines.is_empty());
    assert!(!engine.is_active_at(-1.0));
}

#[test]
fn window_truncates_at_last_line() {
    let mut engine = engine_with(two_lines());

    let update = engine.advance_to(2.5);
    assert_eq!(update.active_word, "c");
    assert_eq!(update.context_lines, ["a b", "c d"]);
}

#[test]
fn backward_seek_retracts_pointer() {
    let mut engine = engine_with(two_lines());

    assert_eq!(engine.advance_to(3.5).active_word, "d");
    assert_eq!(engine.current_index(), 4);

    let update = engine.advance_to(0.5);
    assert_eq!(update.active_word, "a");
    assert_eq!(update.context_lines, ["a b", "c d"]);
    assert_eq!(engine.current_index(), 1);
}

#[test]
fn middle_line_gets_both_neighbours() {
    let mut engine = engine_with(five_lines());

    let update = engine.advance_to(4.2);
    assert_eq!(update.active_word, "w2a");
    assert_eq!(update.context_lines, ["line 1", "line 2", "line 3"]);

    let first = engine.advance_to(0.0);
    assert_eq!(first.context_lines, ["line 0", "line 1"]);
}

#[test]
fn last_word_stays_active_after_the_end() {
    let mut engine = engine_with(hello_world());

    assert_eq!(engine.advance_to(120.0).active_word, "world");
    assert_eq!(engine.advance_to(1e9).active_word, "world");
}

#[test]
fn tie_favours_later_word() {
    let store = TranscriptStore::load(&json!([{
        "text": "together now",
        "words": [
            { "word": "together", "start": 1.0 },
            { "word": "now", "start": 1.0 },
        ]
    }]))
    .expect("fixture should load");
    let mut engine = engine_with(store);

    assert_eq!(engine.advance_to(1.0).active_word, "now");
    assert_eq!(engine.current_index(), 2);
}

#[test]
fn monotonic_times_never_move_pointer_backwards() {
    let mut engine = engine_with(five_lines());

    let mut previous = engine.current_index();
    for step in 0..120 {
        engine.advance_to(step as f64 * 0.1 - 1.0);
        let index = engine.current_index();
        assert!(index >= previous, "pointer went from {previous} to {index}");
        previous = index;
    }
    assert_eq!(previous, 10);
}

#[test]
fn incremental_and_fresh_evaluation_agree() {
    let store = std::sync::Arc::new(five_lines());
    let mut incremental = SyncEngine::default();
    incremental.load(std::sync::Arc::clone(&store));

    // Jumps both ways, including repeats and exact word boundaries.
    let times = [
        3.0, 0.5, 9.5, 9.0, -2.0, 4.0, 4.0, 7.999, 1.0, 11.0, 2.0, 0.0, 6.5,
    ];
    for time in times {
        let update = incremental.advance_to(time);

        let mut fresh = SyncEngine::default();
        fresh.load(std::sync::Arc::clone(&store));
        fresh.reset();
        let expected = fresh.advance_to(time);

        let scanned = store
            .events()
            .iter()
            .rev()
            .find(|event| event.start <= time)
            .map(|event| event.word.as_str())
            .unwrap_or("");

        assert_eq!(update, expected, "t = {time}");
        assert_eq!(update.active_word, scanned, "t = {time}");
        assert_eq!(
            incremental.active_index_at(time),
            incremental.current_index().checked_sub(1),
            "t = {time}"
        );
    }
}

#[test]
fn reset_clears_pointer() {
    let mut engine = engine_with(two_lines());
    engine.advance_to(3.2);

    let update = engine.reset();
    assert_eq!(update, DisplayUpdate::empty());
    assert_eq!(update.current_time, 0.0);
    assert_eq!(engine.current_index(), 0);
    assert_eq!(engine.state(), SyncState::Idle);
    assert!(engine.advance_to(-0.5).is_empty());
    assert_eq!(engine.current_index(), 0);
}

#[test]
fn context_window_never_exceeds_three_lines() {
    let mut engine = engine_with(five_lines());

    for step in -5..120 {
        let update = engine.advance_to(step as f64 * 0.1);
        assert!(update.context_lines.len() <= 3);
        assert!(update
            .context_lines
            .windows(2)
            .all(|pair| pair[0] != pair[1]));
    }
}

#[test]
fn new_transcript_restarts_from_first_word() {
    let mut engine = engine_with(five_lines());
    engine.advance_to(9.5);

    engine.load(hello_world());
    assert_eq!(engine.current_index(), 0);
    assert_eq!(engine.state(), SyncState::Tracking);
    assert_eq!(engine.advance_to(0.1).active_word, "hello");
}

#[test]
fn rejected_json_load_keeps_engine_state() {
    let mut engine = engine_with(two_lines());
    engine.advance_to(1.5);

    let error = engine
        .load_json(&json!({ "oops": true }), &LoadParams::default())
        .expect_err("object without segments must fail");
    assert!(matches!(error, LoadError::MalformedInput(_)));
    assert_eq!(engine.current_index(), 2);
    assert_eq!(engine.advance_to(1.6).active_word, "b");
}

#[test]
fn display_update_serializes_for_the_view() {
    let mut engine = engine_with(hello_world());

    let value = serde_json::to_value(engine.advance_to(0.2)).expect("update should serialize");
    assert_eq!(
        value,
        json!({ "active_word": "hello", "current_time": 0.2, "context_lines": ["hello world"] })
    );
}
