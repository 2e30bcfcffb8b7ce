use crate::overrides::{OverridePatch, OverrideStore};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionEdit {
    Set(f64),
    Clear,
}

/// Decides what committing the projection cell does.
///
/// Non-numeric input clears the manual override, and so does typing the value
/// the current mode would show anyway.
pub fn interpret_projection_input(input: &str, mode_value: f64) -> ProjectionEdit {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value != mode_value => ProjectionEdit::Set(value),
        _ => ProjectionEdit::Clear,
    }
}

pub fn commit_projection_input(
    store: &mut OverrideStore,
    player_id: &str,
    input: &str,
    mode_value: f64,
) -> ProjectionEdit {
    let edit = interpret_projection_input(input, mode_value);
    let patch = match edit {
        ProjectionEdit::Set(value) => OverridePatch::new().manual_projection(value),
        ProjectionEdit::Clear => OverridePatch::new().clear_manual_projection(),
    };
    store.set(player_id, patch);
    edit
}

/// Parses an exposure percentage field. Empty or unparsable text yields `None`,
/// which drops the stored bound back to its default. Values are not clamped.
pub fn parse_exposure_input(input: &str) -> Option<f64> {
    input
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Text buffer behind an in-place cell editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellEditor {
    pub buffer: String,
}

impl CellEditor {
    pub fn with_value(value: f64) -> Self {
        Self {
            buffer: format!("{value:.1}"),
        }
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() {
            self.buffer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_and_empty_input_clear() {
        assert_eq!(interpret_projection_input("abc", 12.5), ProjectionEdit::Clear);
        assert_eq!(interpret_projection_input("   ", 12.5), ProjectionEdit::Clear);
        assert_eq!(interpret_projection_input("NaN", 12.5), ProjectionEdit::Clear);
    }

    #[test]
    fn typing_the_mode_value_clears() {
        assert_eq!(interpret_projection_input("12.5", 12.5), ProjectionEdit::Clear);
        assert_eq!(interpret_projection_input(" 14 ", 12.5), ProjectionEdit::Set(14.0));
    }

    #[test]
    fn commit_writes_through_to_the_store() {
        let mut store = OverrideStore::new();
        commit_projection_input(&mut store, "p-1", "9.9", 7.0);
        assert_eq!(store.get("p-1").and_then(|o| o.manual_projection), Some(9.9));
        commit_projection_input(&mut store, "p-1", "oops", 7.0);
        assert_eq!(store.get("p-1").and_then(|o| o.manual_projection), None);
    }

    #[test]
    fn exposure_input_accepts_percent_suffix() {
        assert_eq!(parse_exposure_input("35%"), Some(35.0));
        assert_eq!(parse_exposure_input("120"), Some(120.0));
        assert_eq!(parse_exposure_input(""), None);
    }
}
