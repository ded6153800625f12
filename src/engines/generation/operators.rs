use rand::{Rng, RngCore};
use std::cmp::Ordering;

/// Total order on fitness values where NaN ranks below everything, including -inf.
pub fn compare_fitness(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Index of the best fitness, the earliest one on ties. `None` for an empty slice.
pub fn best_index(fitness: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &f) in fitness.iter().enumerate() {
        match best {
            Some(b) if compare_fitness(f, fitness[b]) != Ordering::Greater => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Picks parents by index into a fitness slice (higher fitness is better).
pub trait Selector: Send + Sync {
    fn name(&self) -> &'static str;

    /// `fitness` must not be empty.
    fn select(&self, rng: &mut dyn RngCore, fitness: &[f64]) -> usize;
}

/// Tournament selection: best of K uniformly drawn contestants.
#[derive(Debug, Clone, Copy)]
pub struct TournamentSelector {
    pub size: usize,
}

impl TournamentSelector {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }
}

impl Default for TournamentSelector {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Selector for TournamentSelector {
    fn name(&self) -> &'static str {
        "TournamentSelector"
    }

    fn select(&self, rng: &mut dyn RngCore, fitness: &[f64]) -> usize {
        let mut best_idx = rng.gen_range(0..fitness.len());

        for _ in 1..self.size {
            let idx = rng.gen_range(0..fitness.len());
            // Equal fitness goes to the contestant earlier in the population
            match compare_fitness(fitness[idx], fitness[best_idx]) {
                Ordering::Greater => best_idx = idx,
                Ordering::Equal if idx < best_idx => best_idx = idx,
                _ => {}
            }
        }

        best_idx
    }
}

/// Roulette wheel selection: probability proportional to fitness shifted above the worst
/// finite value, so negative fitness (e.g. negated error) still works.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouletteSelector;

impl Selector for RouletteSelector {
    fn name(&self) -> &'static str {
        "RouletteSelector"
    }

    fn select(&self, rng: &mut dyn RngCore, fitness: &[f64]) -> usize {
        let finite_min = fitness
            .iter()
            .copied()
            .filter(|f| f.is_finite())
            .fold(f64::INFINITY, f64::min);

        // Non-finite individuals get no share of the wheel
        let weight = |f: f64| if f.is_finite() { f - finite_min + f64::EPSILON } else { 0.0 };
        let total_fitness: f64 = fitness.iter().map(|&f| weight(f)).sum();

        if !(total_fitness > 0.0) || !total_fitness.is_finite() {
            return rng.gen_range(0..fitness.len());
        }

        let mut spin = rng.gen::<f64>() * total_fitness;

        for (i, &f) in fitness.iter().enumerate() {
            spin -= weight(f);
            if spin <= 0.0 && weight(f) > 0.0 {
                return i;
            }
        }

        // Rounding leftovers land on the last individual with a share
        fitness
            .iter()
            .rposition(|&f| weight(f) > 0.0)
            .unwrap_or(fitness.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_compare_fitness_puts_nan_last() {
        assert_eq!(compare_fitness(f64::NAN, f64::NEG_INFINITY), Ordering::Less);
        assert_eq!(compare_fitness(1.0, 2.0), Ordering::Less);
        assert_eq!(best_index(&[f64::NAN, -3.0, -1.0, -1.0]), Some(2));
        assert_eq!(best_index(&[]), None);
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let fitness = vec![-10.0, -1.0, -5.0, -0.5, -20.0];
        let selector = TournamentSelector::new(fitness.len() * 4);
        let mut rng = StdRng::seed_from_u64(1);
        let wins = (0..200).filter(|_| selector.select(&mut rng, &fitness) == 3).count();
        assert!(wins > 190, "best won {} of 200", wins);
    }

    #[test]
    fn test_tournament_ties_go_to_earlier_index() {
        let fitness = vec![1.0; 6];
        let selector = TournamentSelector::new(64);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..20 {
            assert_eq!(selector.select(&mut rng, &fitness), 0);
        }
    }

    #[test]
    fn test_roulette_handles_negative_fitness() {
        let fitness = vec![-100.0, -1.0, f64::NEG_INFINITY, f64::NAN];
        let mut rng = StdRng::seed_from_u64(3);
        let mut counts = [0usize; 4];
        for _ in 0..1000 {
            counts[RouletteSelector.select(&mut rng, &fitness)] += 1;
        }
        assert_eq!(counts[2], 0);
        assert_eq!(counts[3], 0);
        assert!(counts[1] > counts[0]);
    }

    #[test]
    fn test_roulette_falls_back_to_uniform() {
        let fitness = vec![f64::NEG_INFINITY; 3];
        let mut rng = StdRng::seed_from_u64(4);
        let picked = RouletteSelector.select(&mut rng, &fitness);
        assert!(picked < 3);
    }
}
