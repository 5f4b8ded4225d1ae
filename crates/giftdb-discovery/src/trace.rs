//! Per-query diagnostic accumulator.
//!
//! Each concurrent branch builds its own [`DiagnosticTrace`] and hands it
//! back with its result; the caller merges branch traces after the join, so
//! no trace is ever shared between tasks.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticTrace {
    pub counters: BTreeMap<String, u64>,
    pub notes: Vec<String>,
}

impl DiagnosticTrace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn incr(&mut self, counter: &str) {
        self.add(counter, 1);
    }

    pub fn add(&mut self, counter: &str, amount: u64) {
        let slot = self.counters.entry(counter.to_string()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    #[must_use]
    pub fn count(&self, counter: &str) -> u64 {
        self.counters.get(counter).copied().unwrap_or(0)
    }

    /// Fold another trace into this one: counters add, notes append in order.
    pub fn absorb(&mut self, other: DiagnosticTrace) {
        for (name, value) in other.counters {
            self.add(&name, value);
        }
        self.notes.extend(other.notes);
    }

    /// Position of the first note containing `needle`, if any.
    #[must_use]
    pub fn find_note(&self, needle: &str) -> Option<usize> {
        self.notes.iter().position(|n| n.contains(needle))
    }
}
