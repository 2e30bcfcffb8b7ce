use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const BOOSTED_SENTIMENT: f64 = 1.1;
pub const NEUTRAL_SENTIMENT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LockStatus {
    Locked,
    Excluded,
    #[default]
    None,
}

/// User adjustments for one player. `None` on any field means the facet is not
/// overridden.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub manual_projection: Option<f64>,
    pub lock_status: Option<LockStatus>,
    pub exposure_min: Option<f64>,
    pub exposure_max: Option<f64>,
    pub sentiment_boost: Option<f64>,
}

impl Override {
    pub fn lock_status(&self) -> LockStatus {
        self.lock_status.unwrap_or_default()
    }

    pub fn is_boosted(&self) -> bool {
        self.sentiment_boost.unwrap_or(NEUTRAL_SENTIMENT) > NEUTRAL_SENTIMENT
    }
}

/// A partial write. The outer `Option` says whether the field takes part in the
/// write at all; `Some(None)` removes the facet from the stored record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverridePatch {
    pub manual_projection: Option<Option<f64>>,
    pub lock_status: Option<Option<LockStatus>>,
    pub exposure_min: Option<Option<f64>>,
    pub exposure_max: Option<Option<f64>>,
    pub sentiment_boost: Option<Option<f64>>,
}

impl OverridePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manual_projection(mut self, value: f64) -> Self {
        self.manual_projection = Some(Some(value));
        self
    }

    pub fn clear_manual_projection(mut self) -> Self {
        self.manual_projection = Some(None);
        self
    }

    pub fn lock_status(mut self, status: LockStatus) -> Self {
        self.lock_status = Some(Some(status));
        self
    }

    pub fn exposure_min(mut self, value: f64) -> Self {
        self.exposure_min = Some(Some(value));
        self
    }

    pub fn exposure_max(mut self, value: f64) -> Self {
        self.exposure_max = Some(Some(value));
        self
    }

    pub fn sentiment_boost(mut self, value: f64) -> Self {
        self.sentiment_boost = Some(Some(value));
        self
    }

    fn apply_to(self, record: &mut Override) {
        merge_field(&mut record.manual_projection, self.manual_projection);
        merge_field(&mut record.lock_status, self.lock_status);
        merge_field(&mut record.exposure_min, self.exposure_min);
        merge_field(&mut record.exposure_max, self.exposure_max);
        merge_field(&mut record.sentiment_boost, self.sentiment_boost);
    }
}

fn merge_field<T>(slot: &mut Option<T>, incoming: Option<Option<T>>) {
    if let Some(value) = incoming {
        *slot = value;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverrideChange {
    Updated { player_id: String, record: Override },
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&OverrideChange)>;

/// In-memory override records keyed by player id.
///
/// Single-threaded by construction: one owner mutates it from the UI loop and
/// listeners run synchronously inside `set`/`clear`.
#[derive(Default)]
pub struct OverrideStore {
    records: HashMap<String, Override>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    revision: u64,
}

impl fmt::Debug for OverrideStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideStore")
            .field("records", &self.records)
            .field("listeners", &self.listeners.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player_id: &str) -> Option<&Override> {
        self.records.get(player_id)
    }

    /// Merges `patch` into the record for `player_id`, creating it on first
    /// write. Bounds are stored as given; `exposure_min > exposure_max` is
    /// accepted.
    pub fn set(&mut self, player_id: &str, patch: OverridePatch) {
        let record = self.records.entry(player_id.to_string()).or_default();
        patch.apply_to(record);
        let change = OverrideChange::Updated {
            player_id: player_id.to_string(),
            record: record.clone(),
        };
        tracing::debug!(player_id, ?change, "override updated");
        self.publish(change);
    }

    pub fn clear(&mut self) {
        let dropped = self.records.len();
        self.records.clear();
        tracing::debug!(dropped, "overrides cleared");
        self.publish(OverrideChange::Cleared);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&OverrideChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Bumped on every mutation; dependent views compare it to decide whether
    /// to recompute.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Override)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }

    fn publish(&mut self, change: OverrideChange) {
        self.revision += 1;
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }
}

/// Lock button: toggles between `LOCKED` and `NONE`.
pub fn toggle_lock(store: &mut OverrideStore, player_id: &str) {
    let current = store
        .get(player_id)
        .map(Override::lock_status)
        .unwrap_or_default();
    let next = if current == LockStatus::Locked {
        LockStatus::None
    } else {
        LockStatus::Locked
    };
    store.set(player_id, OverridePatch::new().lock_status(next));
}

/// Exclude button: toggles between `EXCLUDED` and `NONE`.
pub fn toggle_exclude(store: &mut OverrideStore, player_id: &str) {
    let current = store
        .get(player_id)
        .map(Override::lock_status)
        .unwrap_or_default();
    let next = if current == LockStatus::Excluded {
        LockStatus::None
    } else {
        LockStatus::Excluded
    };
    store.set(player_id, OverridePatch::new().lock_status(next));
}

pub fn toggle_boost(store: &mut OverrideStore, player_id: &str) {
    let boosted = store.get(player_id).is_some_and(Override::is_boosted);
    let next = if boosted {
        NEUTRAL_SENTIMENT
    } else {
        BOOSTED_SENTIMENT
    };
    store.set(player_id, OverridePatch::new().sentiment_boost(next));
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn omitted_fields_survive_a_merge() {
        let mut store = OverrideStore::new();
        store.set("p-1", OverridePatch::new().manual_projection(9.9));
        store.set("p-1", OverridePatch::new().exposure_max(40.0));

        let record = store.get("p-1").expect("record");
        assert_eq!(record.manual_projection, Some(9.9));
        assert_eq!(record.exposure_max, Some(40.0));
        assert_eq!(record.lock_status, None);
    }

    #[test]
    fn inverted_bounds_are_stored_verbatim() {
        let mut store = OverrideStore::new();
        store.set(
            "p-1",
            OverridePatch::new().exposure_min(80.0).exposure_max(20.0),
        );
        let record = store.get("p-1").expect("record");
        assert_eq!(record.exposure_min, Some(80.0));
        assert_eq!(record.exposure_max, Some(20.0));
    }

    #[test]
    fn listeners_see_every_mutation_until_unsubscribed() {
        let mut store = OverrideStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = store.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        store.set("p-2", OverridePatch::new().lock_status(LockStatus::Locked));
        store.clear();
        assert!(store.unsubscribe(id));
        store.set("p-3", OverridePatch::new().sentiment_boost(1.1));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(matches!(
            &seen[0],
            OverrideChange::Updated { player_id, record }
                if player_id == "p-2" && record.lock_status == Some(LockStatus::Locked)
        ));
        assert_eq!(seen[1], OverrideChange::Cleared);
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn lock_and_exclude_buttons_cycle_through_none() {
        let mut store = OverrideStore::new();
        toggle_lock(&mut store, "p");
        assert_eq!(store.get("p").map(Override::lock_status), Some(LockStatus::Locked));
        toggle_exclude(&mut store, "p");
        assert_eq!(store.get("p").map(Override::lock_status), Some(LockStatus::Excluded));
        toggle_exclude(&mut store, "p");
        assert_eq!(store.get("p").map(Override::lock_status), Some(LockStatus::None));
        toggle_lock(&mut store, "p");
        toggle_lock(&mut store, "p");
        assert_eq!(store.get("p").map(Override::lock_status), Some(LockStatus::None));
    }

    #[test]
    fn boost_toggles_between_neutral_and_boosted() {
        let mut store = OverrideStore::new();
        toggle_boost(&mut store, "p");
        assert_eq!(store.get("p").and_then(|o| o.sentiment_boost), Some(1.1));
        toggle_boost(&mut store, "p");
        assert_eq!(store.get("p").and_then(|o| o.sentiment_boost), Some(1.0));
        assert!(!store.get("p").is_some_and(Override::is_boosted));
    }
}
