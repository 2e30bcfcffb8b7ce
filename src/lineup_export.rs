use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::lineup::Lineup;
use crate::overrides::{LockStatus, OverrideStore};

pub struct ExportReport {
    pub lineups: usize,
    pub player_rows: usize,
    pub overrides: usize,
}

pub fn export_lineups(
    path: &Path,
    lineups: &[Lineup],
    store: &OverrideStore,
) -> Result<ExportReport> {
    let lineup_rows = lineup_rows(lineups);
    let override_rows = override_rows(store);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Lineups")?;
        write_rows(sheet, &lineup_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Overrides")?;
        write_rows(sheet, &override_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        lineups: lineups.len(),
        player_rows: lineup_rows.len().saturating_sub(1),
        overrides: override_rows.len().saturating_sub(1),
    })
}

pub fn lineup_rows(lineups: &[Lineup]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Lineup".to_string(),
        "Slot".to_string(),
        "Player ID".to_string(),
        "Player".to_string(),
        "Salary".to_string(),
        "Projection".to_string(),
        "ROI".to_string(),
    ]];
    for lineup in lineups {
        for player in &lineup.players {
            rows.push(vec![
                lineup.id.clone(),
                player.position.clone(),
                player.id.clone(),
                player.name.clone(),
                player.salary.to_string(),
                format!("{:.2}", player.projection),
                opt_to_string(lineup.roi),
            ]);
        }
    }
    rows
}

/// Rows sorted by player id so exports are stable across runs.
pub fn override_rows(store: &OverrideStore) -> Vec<Vec<String>> {
    let mut entries: Vec<_> = store.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut rows = vec![vec![
        "Player ID".to_string(),
        "Manual Projection".to_string(),
        "Status".to_string(),
        "Exposure Min".to_string(),
        "Exposure Max".to_string(),
        "Sentiment Boost".to_string(),
    ]];
    for (player_id, record) in entries {
        rows.push(vec![
            player_id.to_string(),
            opt_to_string(record.manual_projection),
            record.lock_status.map(lock_label).unwrap_or_default().to_string(),
            opt_to_string(record.exposure_min),
            opt_to_string(record.exposure_max),
            opt_to_string(record.sentiment_boost),
        ]);
    }
    rows
}

pub fn lock_label(status: LockStatus) -> &'static str {
    match status {
        LockStatus::Locked => "LOCKED",
        LockStatus::Excluded => "EXCLUDED",
        LockStatus::None => "NONE",
    }
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
