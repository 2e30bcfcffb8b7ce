use std::cell::RefCell;
use std::rc::Rc;

use lineup_terminal::overrides::{LockStatus, OverrideChange, OverridePatch, OverrideStore};
use lineup_terminal::projection::{self, DisplayRowCache, ProjectionMode};
use lineup_terminal::state::{PlayerStat, PlayerStatus, StatBundle};

fn player(id: &str, mean: f64, floor: f64, ceiling: f64) -> PlayerStat {
    PlayerStat {
        id: id.to_string(),
        name: format!("Player {id}"),
        team: "NYG".to_string(),
        position: "WR".to_string(),
        salary: 6500,
        stats: StatBundle {
            mean,
            floor,
            ceiling,
            win_probability: 0.5,
        },
        status: PlayerStatus::Active,
    }
}

#[test]
fn each_mode_shows_its_statistic_without_overrides() {
    let p = player("w1", 12.5, 7.0, 22.0);
    assert_eq!(projection::resolve(&p, None, ProjectionMode::Floor), 7.0);
    assert_eq!(projection::resolve(&p, None, ProjectionMode::Mean), 12.5);
    assert_eq!(projection::resolve(&p, None, ProjectionMode::Ceiling), 22.0);
}

#[test]
fn manual_projection_wins_in_every_mode() {
    let p = player("w1", 12.5, 7.0, 22.0);
    let mut store = OverrideStore::new();
    store.set("w1", OverridePatch::new().manual_projection(9.9));
    for mode in ProjectionMode::ALL {
        assert_eq!(projection::resolve(&p, store.get("w1"), mode), 9.9);
    }
}

#[test]
fn floor_then_manual_edit_walkthrough() {
    let players = vec![player("w1", 12.5, 7.0, 22.0)];
    let mut store = OverrideStore::new();
    let mut cache = DisplayRowCache::new();

    let rows = cache.rows(&players, 1, &store, ProjectionMode::Floor);
    assert_eq!(rows[0].display_projection, 7.0);
    assert!(!rows[0].is_edited);

    store.set("w1", OverridePatch::new().manual_projection(9.9));
    let rows = cache.rows(&players, 1, &store, ProjectionMode::Floor);
    assert_eq!(rows[0].display_projection, 9.9);
    assert!(rows[0].is_edited);

    let rows = cache.rows(&players, 1, &store, ProjectionMode::Ceiling);
    assert_eq!(rows[0].display_projection, 9.9);
}

#[test]
fn clearing_manual_projection_restores_mode_value() {
    let p = player("w1", 12.5, 7.0, 22.0);
    let mut store = OverrideStore::new();
    store.set("w1", OverridePatch::new().manual_projection(30.0));
    store.set("w1", OverridePatch::new().clear_manual_projection());
    assert_eq!(
        projection::resolve(&p, store.get("w1"), ProjectionMode::Mean),
        12.5
    );
    assert!(store.get("w1").expect("record kept").manual_projection.is_none());
}

#[test]
fn repeated_set_is_idempotent_but_still_notifies() {
    let mut store = OverrideStore::new();
    let seen = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&seen);
    store.subscribe(move |_| *counter.borrow_mut() += 1);

    let patch = OverridePatch::new().lock_status(LockStatus::Locked).exposure_max(60.0);
    store.set("w1", patch.clone());
    let first = store.get("w1").cloned();
    store.set("w1", patch);
    assert_eq!(store.get("w1").cloned(), first);
    assert_eq!(*seen.borrow(), 2);
}

#[test]
fn clear_removes_every_record() {
    let mut store = OverrideStore::new();
    store.set("a", OverridePatch::new().manual_projection(1.0));
    store.set("b", OverridePatch::new().lock_status(LockStatus::Excluded));

    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    store.subscribe(move |change| sink.borrow_mut().push(change.clone()));
    store.clear();

    assert!(store.get("a").is_none());
    assert!(store.get("b").is_none());
    assert!(store.is_empty());
    assert_eq!(changes.borrow().as_slice(), &[OverrideChange::Cleared]);
}

#[test]
fn lock_then_exclude_is_last_write_wins() {
    let mut store = OverrideStore::new();
    store.set(
        "w1",
        OverridePatch::new()
            .manual_projection(14.0)
            .lock_status(LockStatus::Locked),
    );
    store.set("w1", OverridePatch::new().lock_status(LockStatus::Excluded));

    let record = store.get("w1").expect("record");
    assert_eq!(record.lock_status(), LockStatus::Excluded);
    assert_eq!(record.manual_projection, Some(14.0));
}

#[test]
fn cache_reuses_rows_until_something_changes() {
    let players = vec![player("w1", 12.5, 7.0, 22.0)];
    let mut store = OverrideStore::new();
    let mut cache = DisplayRowCache::new();

    let first = cache.rows(&players, 1, &store, ProjectionMode::Mean).as_ptr();
    let again = cache.rows(&players, 1, &store, ProjectionMode::Mean).as_ptr();
    assert_eq!(first, again);

    store.set("w1", OverridePatch::new().sentiment_boost(1.1));
    let rows = cache.rows(&players, 1, &store, ProjectionMode::Mean);
    assert!(rows[0].user_override.as_ref().is_some_and(|o| o.is_boosted()));
}
