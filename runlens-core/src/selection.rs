//! Experiment selection state and its transitions.
//!
//! The sidebar offers two controls per experiment: a radio (show only this
//! one) and a checkbox (add to or drop from the comparison). Transitions are
//! pure functions from one [`SelectionState`] to the next; side effects the
//! caller must carry out come back as [`SelectionEffect`]s.

use crate::series::ExperimentRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether one experiment is shown or several are overlaid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Single,
    Compare,
}

/// Work requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEffect {
    /// The record for this id is not cached and must be fetched.
    Fetch(String),
    /// This id was deselected and its record dropped.
    Evict(String),
    /// Rebuild every metric chart from the selected records.
    Render,
    /// Nothing is selected any more: tear down every chart instance.
    ClearCharts,
}

/// Result of a transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: SelectionState,
    pub effects: Vec<SelectionEffect>,
}

impl Transition {
    fn unchanged(state: SelectionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Checked state of the two sidebar controls for one experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub id: String,
    pub radio: bool,
    pub checkbox: bool,
}

/// Selected experiment ids, in selection order, with their cached records.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    mode: SelectionMode,
    selected: Vec<String>,
    cache: HashMap<String, ExperimentRecord>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }

    pub fn record(&self, id: &str) -> Option<&ExperimentRecord> {
        self.cache.get(id)
    }

    /// Cached records of the selected ids, in selection order.
    pub fn records(&self) -> Vec<&ExperimentRecord> {
        self.selected
            .iter()
            .filter_map(|id| self.cache.get(id))
            .collect()
    }

    /// Store a fetched record. Ignored if the id is no longer selected.
    pub fn store_record(&mut self, record: ExperimentRecord) -> bool {
        if !self.is_selected(&record.id) {
            return false;
        }
        self.cache.insert(record.id.clone(), record);
        true
    }

    /// Checked state of both controls for every listed id.
    pub fn controls(&self, ids: &[String]) -> Vec<ControlState> {
        ids.iter()
            .map(|id| {
                let selected = self.is_selected(id);
                ControlState {
                    id: id.clone(),
                    radio: selected && self.mode == SelectionMode::Single,
                    checkbox: selected,
                }
            })
            .collect()
    }
}

/// Radio click: show exactly `id`, dropping every other selection.
pub fn choose(mut state: SelectionState, id: &str) -> Transition {
    let mut effects = Vec::new();
    let previous: Vec<String> = state.selected.drain(..).filter(|s| s != id).collect();
    for old in previous {
        state.cache.remove(&old);
        effects.push(SelectionEffect::Evict(old));
    }
    state.selected.push(id.to_string());
    state.mode = SelectionMode::Single;
    if !state.cache.contains_key(id) {
        effects.push(SelectionEffect::Fetch(id.to_string()));
    }
    effects.push(SelectionEffect::Render);
    Transition { state, effects }
}

/// Checkbox click: add `id` to the comparison or drop it.
pub fn toggle(mut state: SelectionState, id: &str, checked: bool) -> Transition {
    let mut effects = Vec::new();
    if checked {
        if state.is_selected(id) {
            return Transition::unchanged(state);
        }
        state.selected.push(id.to_string());
        if state.selected.len() >= 2 {
            state.mode = SelectionMode::Compare;
        }
        if !state.cache.contains_key(id) {
            effects.push(SelectionEffect::Fetch(id.to_string()));
        }
        effects.push(SelectionEffect::Render);
    } else {
        let Some(pos) = state.selected.iter().position(|s| s == id) else {
            return Transition::unchanged(state);
        };
        state.selected.remove(pos);
        state.cache.remove(id);
        effects.push(SelectionEffect::Evict(id.to_string()));
        match state.selected.len() {
            0 => {
                state.mode = SelectionMode::Single;
                effects.push(SelectionEffect::ClearCharts);
            }
            1 => {
                state.mode = SelectionMode::Single;
                effects.push(SelectionEffect::Render);
            }
            _ => effects.push(SelectionEffect::Render),
        }
    }
    Transition { state, effects }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ExperimentRecord {
        ExperimentRecord::empty(id)
    }

    fn apply_fetches(mut t: Transition) -> SelectionState {
        for effect in &t.effects {
            if let SelectionEffect::Fetch(id) = effect {
                t.state.store_record(record(id));
            }
        }
        t.state
    }

    #[test]
    fn test_choose_from_empty() {
        let t = choose(SelectionState::new(), "a");
        assert_eq!(t.state.mode(), SelectionMode::Single);
        assert_eq!(t.state.selected_ids(), &["a".to_string()]);
        assert_eq!(
            t.effects,
            vec![
                SelectionEffect::Fetch("a".into()),
                SelectionEffect::Render
            ]
        );
    }

    #[test]
    fn test_choose_replaces_previous() {
        let state = apply_fetches(choose(SelectionState::new(), "a"));
        let t = choose(state, "b");
        assert_eq!(t.state.selected_ids(), &["b".to_string()]);
        assert!(!t.state.is_cached("a"));
        assert!(t.effects.contains(&SelectionEffect::Evict("a".into())));
        assert!(t.effects.contains(&SelectionEffect::Fetch("b".into())));
    }

    #[test]
    fn test_second_check_switches_to_compare() {
        let state = apply_fetches(choose(SelectionState::new(), "a"));
        let t = toggle(state, "b", true);
        assert_eq!(t.state.mode(), SelectionMode::Compare);
        assert_eq!(t.state.selected_ids().len(), 2);

        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let controls = t.state.controls(&ids);
        assert!(controls.iter().all(|c| !c.radio));
        assert!(controls[0].checkbox && controls[1].checkbox && !controls[2].checkbox);
    }

    #[test]
    fn test_drop_to_one_returns_to_single() {
        let state = apply_fetches(choose(SelectionState::new(), "a"));
        let state = apply_fetches(toggle(state, "b", true));
        let t = toggle(state, "a", false);
        assert_eq!(t.state.mode(), SelectionMode::Single);
        assert_eq!(t.state.selected_ids(), &["b".to_string()]);
        assert!(t.state.is_cached("b"));
        assert_eq!(
            t.effects,
            vec![
                SelectionEffect::Evict("a".into()),
                SelectionEffect::Render
            ]
        );
        let controls = t.state.controls(&["b".to_string()]);
        assert!(controls[0].radio);
    }

    #[test]
    fn test_drop_to_zero_clears_charts() {
        let state = apply_fetches(choose(SelectionState::new(), "a"));
        let t = toggle(state, "a", false);
        assert!(t.state.selected_ids().is_empty());
        assert_eq!(t.state.mode(), SelectionMode::Single);
        assert!(t.effects.contains(&SelectionEffect::ClearCharts));
        assert!(!t.effects.contains(&SelectionEffect::Render));
    }

    #[test]
    fn test_noop_toggles() {
        let state = apply_fetches(choose(SelectionState::new(), "a"));
        let t = toggle(state, "a", true);
        assert!(t.effects.is_empty());
        let t = toggle(t.state, "zzz", false);
        assert!(t.effects.is_empty());
        assert_eq!(t.state.selected_ids(), &["a".to_string()]);
    }

    #[test]
    fn test_cached_record_is_not_refetched() {
        let state = apply_fetches(choose(SelectionState::new(), "a"));
        let t = choose(state, "a");
        assert_eq!(t.effects, vec![SelectionEffect::Render]);
    }

    #[test]
    fn test_store_record_ignores_deselected() {
        let mut state = choose(SelectionState::new(), "a").state;
        assert!(!state.store_record(record("b")));
        assert!(state.store_record(record("a")));
        assert_eq!(state.records().len(), 1);
    }

    #[test]
    fn test_check_from_empty_stays_single() {
        let t = toggle(SelectionState::new(), "a", true);
        assert_eq!(t.state.mode(), SelectionMode::Single);
        assert_eq!(t.state.selected_ids().len(), 1);
    }
}
