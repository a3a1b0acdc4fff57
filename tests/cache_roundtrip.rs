// File: tests/cache_roundtrip.rs
// The offline cache: survives a round trip, discards anything stale.
use chrono::{TimeZone, Utc};
use std::fs;
use std::path::PathBuf;
use tablo::cache::Cache;
use tablo::context::{AppContext, TestContext};
use tablo::model::{Board, BoardSummary, Card, CardStatus, Column, Priority};

fn make_board(id: &str, name: &str) -> Board {
    let mut board = Board::new(id, name);
    let mut todo = Column::new("col-1", "To Do", 0);
    todo.wip_limit = Some(3);
    let mut card = Card::new("card-1", "Write report", "col-1");
    card.priority = Some(Priority::High);
    card.status = Some(CardStatus::OnTrack);
    card.due_date = Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    todo.cards.push(card);
    board.columns = vec![todo, Column::new("col-2", "Done", 1)];
    board
}

/// The on-disk name hashes the board id, so locate it by prefix.
fn cached_board_file(ctx: &TestContext) -> PathBuf {
    let dir = ctx.get_cache_dir().expect("test context has a cache dir");
    fs::read_dir(&dir)
        .expect("cache dir listable")
        .flatten()
        .map(|e| e.path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("board_") && n.ends_with(".json"))
        })
        .expect("a board cache file exists")
}

#[test]
fn a_saved_board_loads_back_identically() {
    let ctx = TestContext::new();
    let board = make_board("b1", "Sprint 12");

    Cache::save_board(&ctx, &board).expect("save succeeds");
    let loaded = Cache::load_board(&ctx, "b1")
        .expect("load succeeds")
        .expect("board is cached");

    assert_eq!(loaded, board);
}

#[test]
fn loading_a_board_never_cached_is_none() {
    let ctx = TestContext::new();
    let loaded = Cache::load_board(&ctx, "nope").expect("absent cache is not an error");
    assert!(loaded.is_none());
}

#[test]
fn an_incompatible_cache_version_is_discarded() {
    let ctx = TestContext::new();
    Cache::save_board(&ctx, &make_board("b1", "Sprint 12")).expect("save succeeds");

    // Rewind the version stamp as an older build would have written it.
    let path = cached_board_file(&ctx);
    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("cache readable"))
            .expect("cache is json");
    value["version"] = serde_json::json!(1);
    fs::write(&path, value.to_string()).expect("tampered cache written");

    let loaded = Cache::load_board(&ctx, "b1").expect("load succeeds");
    assert!(loaded.is_none(), "an old-version cache must not surface");
}

#[test]
fn garbage_in_the_cache_is_treated_as_absent() {
    let ctx = TestContext::new();
    Cache::save_board(&ctx, &make_board("b1", "Sprint 12")).expect("save succeeds");

    fs::write(cached_board_file(&ctx), "{ half a brace").expect("garbage written");

    let loaded = Cache::load_board(&ctx, "b1").expect("corruption is not an error");
    assert!(loaded.is_none());
}

#[test]
fn two_boards_cache_side_by_side() {
    let ctx = TestContext::new();
    Cache::save_board(&ctx, &make_board("b1", "Sprint 12")).expect("save b1");
    Cache::save_board(&ctx, &make_board("b2", "Backlog")).expect("save b2");

    let first = Cache::load_board(&ctx, "b1").unwrap().expect("b1 cached");
    let second = Cache::load_board(&ctx, "b2").unwrap().expect("b2 cached");
    assert_eq!(first.name, "Sprint 12");
    assert_eq!(second.name, "Backlog");
}

#[test]
fn the_board_list_round_trips() {
    let ctx = TestContext::new();
    let summaries = vec![
        BoardSummary {
            id: "b1".to_string(),
            name: "Sprint 12".to_string(),
            description: "Current sprint".to_string(),
            members: Some(4),
            thumbnail_color: Some("#ff8800".to_string()),
            last_modified: Some(Utc.with_ymd_and_hms(2026, 2, 10, 8, 30, 0).unwrap()),
        },
        BoardSummary {
            id: "b2".to_string(),
            name: "Backlog".to_string(),
            description: String::new(),
            members: None,
            thumbnail_color: None,
            last_modified: None,
        },
    ];

    Cache::save_board_list(&ctx, &summaries).expect("save succeeds");
    let loaded = Cache::load_board_list(&ctx).expect("load succeeds");
    assert_eq!(loaded, summaries);
}

#[test]
fn a_stale_board_list_reads_as_empty() {
    let ctx = TestContext::new();
    let path = ctx
        .get_board_list_cache_path()
        .expect("test context has a cache path");
    fs::write(
        &path,
        r#"{"version": 0, "boards": [{"id": "b1", "name": "Old"}]}"#,
    )
    .expect("stale list written");

    let loaded = Cache::load_board_list(&ctx).expect("load succeeds");
    assert!(loaded.is_empty(), "a stale list must force a refetch");
}

#[test]
fn an_absent_board_list_reads_as_empty() {
    let ctx = TestContext::new();
    let loaded = Cache::load_board_list(&ctx).expect("absent cache is not an error");
    assert!(loaded.is_empty());
}
