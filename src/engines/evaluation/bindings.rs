use crate::error::EvalError;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Variable name to value for one dataset row.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, f64>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: f64) {
        match self.values.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.values.insert(name.to_string(), value);
            }
        }
    }

    /// Bind every name to the matching column of `row`. Existing keys are reused.
    pub fn bind_row(&mut self, names: &[String], row: &[f64]) {
        for (name, &value) in names.iter().zip(row) {
            self.set(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Result<f64, EvalError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UnknownVariable(name.to_string()))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Recycles [`Bindings`] across rows and worker threads.
#[derive(Debug, Default)]
pub struct BindingPool {
    free: Mutex<Vec<Bindings>>,
    created: AtomicUsize,
}

impl BindingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> PooledBindings<'_> {
        let recycled = self
            .free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop();
        let bindings = recycled.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            Bindings::new()
        });
        PooledBindings {
            pool: self,
            bindings,
        }
    }

    /// Number of binding sets ever allocated by this pool
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn available(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn release(&self, mut bindings: Bindings) {
        bindings.clear();
        self.free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(bindings);
    }
}

/// Borrowed binding set; cleared and handed back to the pool on drop, including during unwinding.
pub struct PooledBindings<'p> {
    pool: &'p BindingPool,
    bindings: Bindings,
}

impl Deref for PooledBindings<'_> {
    type Target = Bindings;

    fn deref(&self) -> &Bindings {
        &self.bindings
    }
}

impl DerefMut for PooledBindings<'_> {
    fn deref_mut(&mut self) -> &mut Bindings {
        &mut self.bindings
    }
}

impl Drop for PooledBindings<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.bindings));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_is_an_error() {
        let bindings: Bindings = [("X", 1.0)].into_iter().collect();
        assert_eq!(bindings.get("X"), Ok(1.0));
        assert_eq!(bindings.get("Y"), Err(EvalError::UnknownVariable("Y".to_string())));
    }

    #[test]
    fn test_pool_reuses_and_clears() {
        let pool = BindingPool::new();
        {
            let mut first = pool.acquire();
            first.set("X", 4.0);
        }
        assert_eq!(pool.available(), 1);

        let second = pool.acquire();
        assert!(second.is_empty());
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_pool_reclaims_on_early_return() {
        fn fails(pool: &BindingPool) -> Result<f64, EvalError> {
            let mut bindings = pool.acquire();
            bindings.set("X", 2.0);
            bindings.get("missing")
        }

        let pool = BindingPool::new();
        assert!(fails(&pool).is_err());
        assert_eq!(pool.available(), 1);
        assert!(pool.acquire().is_empty());
    }
}
