use crate::functions::symbol::Symbol;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Frequency-weighted roulette over a fixed candidate set.
///
/// Rebuilt from the grammar for each construction step, so symbol frequencies never live in
/// shared mutable state. Disabled symbols and symbols with a non-positive frequency are left out.
#[derive(Debug, Clone, Default)]
pub struct SelectionTable {
    entries: Vec<(Arc<Symbol>, f64)>,
    total: f64,
}

impl SelectionTable {
    pub fn new<'a, I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<Symbol>>,
    {
        let entries: Vec<(Arc<Symbol>, f64)> = candidates
            .into_iter()
            .filter(|s| s.enabled() && s.frequency() > 0.0 && s.frequency().is_finite())
            .map(|s| (Arc::clone(s), s.frequency()))
            .collect();
        let total = entries.iter().map(|(_, w)| w).sum();
        Self { entries, total }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Keep only the candidates matching `predicate`.
    pub fn filtered(&self, predicate: impl Fn(&Symbol) -> bool) -> Self {
        let entries: Vec<(Arc<Symbol>, f64)> = self
            .entries
            .iter()
            .filter(|(s, _)| predicate(s))
            .cloned()
            .collect();
        let total = entries.iter().map(|(_, w)| w).sum();
        Self { entries, total }
    }

    /// Spin the wheel; `None` when there is nothing to choose from.
    pub fn choose(&self, rng: &mut dyn RngCore) -> Option<Arc<Symbol>> {
        if self.entries.is_empty() {
            return None;
        }

        let mut spin = rng.gen::<f64>() * self.total;
        for (symbol, weight) in &self.entries {
            spin -= weight;
            if spin < 0.0 {
                return Some(Arc::clone(symbol));
            }
        }

        // Rounding can leave a sliver of the wheel uncovered
        self.entries.last().map(|(s, _)| Arc::clone(s))
    }
}
