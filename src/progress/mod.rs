//! Fan-out progress tracking.
//!
//! Each phase turns its start/end event pairs into one progress entry whose
//! percent only moves forward until the barrier resets the phase.

use std::collections::HashMap;

use uuid::Uuid;

use crate::classify::Phase;
use crate::types::ProgressEntry;

/// Per-phase counters, scoped to one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseCounters {
    pub started: u32,
    pub completed: u32,
}

impl PhaseCounters {
    /// `completed / started` as a rounded percentage, capped at 100.
    /// An end without any observed start counts as done.
    pub fn percent(&self) -> u8 {
        if self.started == 0 {
            return 100;
        }
        let ratio = f64::from(self.completed) / f64::from(self.started);
        (ratio * 100.0).round().min(100.0) as u8
    }
}

#[derive(Debug)]
struct PhaseState {
    counters: PhaseCounters,
    entry_id: Option<String>,
    shown: u8,
}

/// What the caller must do with the conversation after a progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    Append(ProgressEntry),
    Replace(ProgressEntry),
}

#[derive(Debug, Default)]
pub struct ProgressTracker {
    phases: HashMap<&'static str, PhaseState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(&mut self, phase: Phase) -> Option<ProgressUpdate> {
        let state = self.phases.entry(phase.label).or_insert_with(|| PhaseState {
            counters: PhaseCounters::default(),
            entry_id: None,
            shown: 0,
        });
        state.counters.started += 1;
        if state.entry_id.is_some() {
            return None;
        }
        let id = Uuid::new_v4().to_string();
        state.entry_id = Some(id.clone());
        state.shown = 0;
        Some(ProgressUpdate::Append(ProgressEntry {
            id,
            label: phase.label.to_string(),
            percent: 0,
        }))
    }

    pub fn on_end(&mut self, phase: Phase) -> ProgressUpdate {
        let state = self.phases.entry(phase.label).or_insert_with(|| PhaseState {
            counters: PhaseCounters::default(),
            entry_id: None,
            shown: 0,
        });
        state.counters.completed += 1;
        let percent = state.counters.percent().max(state.shown);
        state.shown = percent;
        match &state.entry_id {
            Some(id) => ProgressUpdate::Replace(ProgressEntry {
                id: id.clone(),
                label: phase.label.to_string(),
                percent,
            }),
            None => {
                tracing::debug!(phase = phase.label, "phase end without a start");
                let id = Uuid::new_v4().to_string();
                state.entry_id = Some(id.clone());
                ProgressUpdate::Append(ProgressEntry {
                    id,
                    label: phase.label.to_string(),
                    percent,
                })
            }
        }
    }

    /// Fan-in reached: the next start of any phase opens a fresh entry.
    pub fn on_barrier(&mut self) {
        self.phases.clear();
    }

    /// Drop all state, e.g. when a new run starts.
    pub fn reset(&mut self) {
        self.phases.clear();
    }

    pub fn counters(&self, phase: Phase) -> Option<PhaseCounters> {
        self.phases.get(phase.label).map(|s| s.counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{EXTRACT_CONTENT, FETCH_LINKS};

    fn percent(update: &ProgressUpdate) -> u8 {
        match update {
            ProgressUpdate::Append(p) | ProgressUpdate::Replace(p) => p.percent,
        }
    }

    #[test]
    fn first_start_appends_at_zero_and_later_starts_are_silent() {
        let mut tracker = ProgressTracker::new();
        let first = tracker.on_start(FETCH_LINKS).unwrap();
        assert!(matches!(&first, ProgressUpdate::Append(p) if p.percent == 0));
        assert!(tracker.on_start(FETCH_LINKS).is_none());
        assert_eq!(
            tracker.counters(FETCH_LINKS),
            Some(PhaseCounters {
                started: 2,
                completed: 0
            })
        );
    }

    #[test]
    fn ends_replace_the_same_entry() {
        let mut tracker = ProgressTracker::new();
        let ProgressUpdate::Append(entry) = tracker.on_start(FETCH_LINKS).unwrap() else {
            panic!("expected append");
        };
        tracker.on_start(FETCH_LINKS);
        tracker.on_start(FETCH_LINKS);
        let update = tracker.on_end(FETCH_LINKS);
        match update {
            ProgressUpdate::Replace(p) => {
                assert_eq!(p.id, entry.id);
                assert_eq!(p.percent, 33);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn end_without_start_is_complete() {
        let mut tracker = ProgressTracker::new();
        let update = tracker.on_end(EXTRACT_CONTENT);
        assert!(matches!(update, ProgressUpdate::Append(ref p) if p.percent == 100));
    }

    #[test]
    fn late_start_cannot_move_the_bar_backwards() {
        let mut tracker = ProgressTracker::new();
        tracker.on_start(FETCH_LINKS);
        assert_eq!(percent(&tracker.on_end(FETCH_LINKS)), 100);
        tracker.on_start(FETCH_LINKS);
        assert_eq!(percent(&tracker.on_end(FETCH_LINKS)), 100);
    }

    #[test]
    fn barrier_clears_binding_and_counters() {
        let mut tracker = ProgressTracker::new();
        let ProgressUpdate::Append(old) = tracker.on_start(FETCH_LINKS).unwrap() else {
            panic!("expected append");
        };
        tracker.on_end(FETCH_LINKS);
        tracker.on_barrier();
        assert!(tracker.counters(FETCH_LINKS).is_none());
        let ProgressUpdate::Append(fresh) = tracker.on_start(FETCH_LINKS).unwrap() else {
            panic!("expected append");
        };
        assert_ne!(fresh.id, old.id);
        assert_eq!(fresh.percent, 0);
    }

    #[test]
    fn percent_rounds() {
        let c = PhaseCounters {
            started: 3,
            completed: 2,
        };
        assert_eq!(c.percent(), 67);
    }
}
