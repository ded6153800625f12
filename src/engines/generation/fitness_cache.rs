/// Fitness per population index for the current generation only.
///
/// Cleared at the start of every evaluation pass and refilled in one go, so a reader never sees
/// a mix of two generations.
#[derive(Debug, Clone, Default)]
pub struct FitnessCache {
    values: Vec<f64>,
    generation: Option<usize>,
}

impl FitnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.generation = None;
    }

    /// Replace the whole cache with the fitness of `generation`'s population.
    pub fn store(&mut self, generation: usize, values: Vec<f64>) {
        self.values = values;
        self.generation = Some(generation);
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn generation(&self) -> Option<usize> {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Indices ordered best first; equal fitness keeps population order.
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| super::operators::compare_fitness(self.values[b], self.values[a]));
        order
    }
}
