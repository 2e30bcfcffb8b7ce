use std::fs;

use lineup_terminal::lineup::{Lineup, LineupPlayer, ROSTER_SLOTS};
use lineup_terminal::lineup_export::{export_lineups, lineup_rows, override_rows};
use lineup_terminal::overrides::{LockStatus, OverridePatch, OverrideStore};

fn lineup(id: &str) -> Lineup {
    let players = ROSTER_SLOTS
        .iter()
        .enumerate()
        .map(|(i, slot)| LineupPlayer {
            id: format!("{id}-p{i}"),
            name: format!("Player {i}"),
            position: slot.to_string(),
            salary: 5000,
            projection: 10.0,
        })
        .collect();
    Lineup::new(id.to_string(), players, Some(12.5))
}

#[test]
fn rows_cover_every_slot_and_override() {
    let lineups = vec![lineup("aaaaaaaaaaaa"), lineup("bbbbbbbbbbbb")];
    let rows = lineup_rows(&lineups);
    assert_eq!(rows.len(), 1 + 2 * ROSTER_SLOTS.len());

    let mut store = OverrideStore::new();
    store.set("z", OverridePatch::new().lock_status(LockStatus::Excluded));
    store.set("a", OverridePatch::new().manual_projection(9.9));
    let overrides = override_rows(&store);
    assert_eq!(overrides.len(), 3);
    assert_eq!(overrides[1][0], "a");
    assert_eq!(overrides[2][0], "z");
}

#[test]
fn writes_workbook_to_disk() {
    let path = std::env::temp_dir().join(format!("lineup_export_{}.xlsx", std::process::id()));
    let lineups = vec![lineup("cccccccccccc")];
    let mut store = OverrideStore::new();
    store.set("cccccccccccc-p0", OverridePatch::new().lock_status(LockStatus::Locked));

    let report = export_lineups(&path, &lineups, &store).expect("export");
    assert_eq!(report.lineups, 1);
    assert_eq!(report.player_rows, ROSTER_SLOTS.len());
    assert_eq!(report.overrides, 1);
    assert!(fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false));
    let _ = fs::remove_file(&path);
}
