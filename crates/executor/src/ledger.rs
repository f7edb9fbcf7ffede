use common::models::TradeDecision;
use uuid::Uuid;

/// Only this many of the newest decisions can be selected for execution.
pub const EXECUTION_WINDOW: usize = 5;

/// Session-scoped, in-memory log of generated decisions, oldest first.
///
/// Entries are never removed individually; `clear` drops everything.
#[derive(Debug, Clone, Default)]
pub struct TradeHistory {
    entries: Vec<TradeDecision>,
}

impl TradeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, decision: TradeDecision) {
        self.entries.push(decision);
    }

    /// The last `n` entries in insertion order.
    pub fn recent(&self, n: usize) -> &[TradeDecision] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, id: Uuid) -> Option<&TradeDecision> {
        self.entries.iter().find(|d| d.id == id)
    }

    /// Replaces the entry with the same id in place, or appends it.
    pub fn upsert(&mut self, decision: TradeDecision) {
        match self.entries.iter_mut().find(|d| d.id == decision.id) {
            Some(existing) => *existing = decision,
            None => self.entries.push(decision),
        }
    }

    /// Decisions that can currently be picked for execution.
    pub fn selectable(&self) -> &[TradeDecision] {
        self.recent(EXECUTION_WINDOW)
    }

    /// `index` counts from the oldest entry of the selectable window.
    pub fn select(&self, index: usize) -> Option<&TradeDecision> {
        self.selectable().get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TradeDecision> {
        self.entries.iter()
    }
}
