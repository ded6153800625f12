use super::operators::compare_fitness;
use crate::tree::ExpressionTree;
use crate::types::EliteRecord;

use std::collections::HashSet;

#[derive(Clone, Debug)]
pub struct HallOfFameEntry {
    pub tree: ExpressionTree,
    pub fitness: f64,
    pub generation: usize,
    pub canonical_string: String, // For deduplication
}

impl HallOfFameEntry {
    pub fn to_record(&self) -> EliteRecord {
        EliteRecord {
            tree: self.canonical_string.clone(),
            math: self.tree.to_math_string(),
            fitness: self.fitness,
            length: self.tree.length(),
            depth: self.tree.depth(),
            generation: self.generation,
        }
    }
}

/// Best distinct trees seen over a whole run, best first.
pub struct HallOfFame {
    entries: Vec<HallOfFameEntry>,
    max_size: usize,
    seen_signatures: HashSet<String>,
}

impl HallOfFame {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_size,
            seen_signatures: HashSet::new(),
        }
    }

    /// Offer a tree. Copies it only when it makes the cut.
    pub fn try_add(&mut self, tree: &ExpressionTree, fitness: f64, generation: usize) -> bool {
        if self.max_size == 0 || !fitness.is_finite() {
            return false;
        }

        if self.entries.len() >= self.max_size {
            if let Some(worst) = self.entries.last() {
                if compare_fitness(fitness, worst.fitness).is_le() {
                    return false;
                }
            }
        }

        let canonical_string = tree.to_string();
        if self.seen_signatures.contains(&canonical_string) {
            return false; // Duplicate, reject
        }

        self.seen_signatures.insert(canonical_string.clone());
        self.entries.push(HallOfFameEntry {
            tree: tree.clone(),
            fitness,
            generation,
            canonical_string,
        });

        // Stable sort keeps earlier entries ahead on ties
        self.entries
            .sort_by(|a, b| compare_fitness(b.fitness, a.fitness));

        while self.entries.len() > self.max_size {
            if let Some(removed) = self.entries.pop() {
                self.seen_signatures.remove(&removed.canonical_string);
            }
        }

        true
    }

    pub fn get_all(&self) -> &[HallOfFameEntry] {
        &self.entries
    }

    pub fn get_top_n(&self, n: usize) -> &[HallOfFameEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn records(&self) -> Vec<EliteRecord> {
        self.entries.iter().map(HallOfFameEntry::to_record).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen_signatures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::symbol::Symbol;
    use crate::tree::Node;
    use std::sync::Arc;

    fn constant_tree(value: f64) -> ExpressionTree {
        let symbol = Arc::new(Symbol::constant("Constant", -10.0, 10.0));
        ExpressionTree::new(Node::constant(symbol, value))
    }

    #[test]
    fn test_keeps_best_distinct_entries() {
        let mut hof = HallOfFame::new(2);
        assert!(hof.try_add(&constant_tree(1.0), -3.0, 0));
        assert!(!hof.try_add(&constant_tree(1.0), -3.0, 1));
        assert!(hof.try_add(&constant_tree(2.0), -1.0, 1));
        assert!(hof.try_add(&constant_tree(3.0), -2.0, 2));
        assert!(!hof.try_add(&constant_tree(4.0), -5.0, 2));

        let fitness: Vec<f64> = hof.get_all().iter().map(|e| e.fitness).collect();
        assert_eq!(fitness, vec![-1.0, -2.0]);
        assert_eq!(hof.get_top_n(1)[0].canonical_string, "2");

        // The evicted signature may come back
        assert!(hof.try_add(&constant_tree(1.0), 0.0, 3));
        assert_eq!(hof.records()[0].generation, 3);
    }

    #[test]
    fn test_rejects_non_finite_fitness() {
        let mut hof = HallOfFame::new(3);
        assert!(!hof.try_add(&constant_tree(1.0), f64::NEG_INFINITY, 0));
        assert!(!hof.try_add(&constant_tree(1.0), f64::NAN, 0));
        assert!(hof.is_empty());
    }
}
