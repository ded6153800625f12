use crate::error::{GpError, Result};
use std::collections::HashSet;

/// Fixed table of input rows and targets. Column `i` of every row is bound to
/// `variable_names[i]`.
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Vec<Vec<f64>>,
    targets: Vec<f64>,
    variable_names: Vec<String>,
}

impl Dataset {
    pub fn new<S: Into<String>>(
        inputs: Vec<Vec<f64>>,
        targets: Vec<f64>,
        variable_names: Vec<S>,
    ) -> Result<Self> {
        let variable_names: Vec<String> = variable_names.into_iter().map(Into::into).collect();

        if inputs.len() != targets.len() {
            return Err(GpError::Dataset(format!(
                "{} input rows but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if inputs.is_empty() {
            return Err(GpError::Dataset("dataset has no rows".to_string()));
        }
        if let Some((row, values)) = inputs
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != variable_names.len())
        {
            return Err(GpError::Dataset(format!(
                "row {} has {} values for {} variables",
                row,
                values.len(),
                variable_names.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = variable_names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(GpError::Dataset(format!(
                "variable name {} appears more than once",
                duplicate
            )));
        }

        Ok(Self {
            inputs,
            targets,
            variable_names,
        })
    }

    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.inputs.get(index).map(Vec::as_slice)
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_names.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_rows_and_targets() {
        let err = Dataset::new(vec![vec![1.0], vec![2.0]], vec![1.0], vec!["X"]).unwrap_err();
        assert!(err.to_string().contains("2 input rows but 1 targets"), "{}", err);
    }

    #[test]
    fn test_rejects_ragged_rows_and_duplicate_names() {
        assert!(Dataset::new(vec![vec![1.0, 2.0], vec![3.0]], vec![0.0, 0.0], vec!["X", "Y"]).is_err());
        assert!(Dataset::new(vec![vec![1.0, 2.0]], vec![0.0], vec!["X", "X"]).is_err());
        assert!(Dataset::new(Vec::new(), Vec::new(), vec!["X"]).is_err());
    }

    #[test]
    fn test_accessors() {
        let data = Dataset::new(vec![vec![1.0, 2.0]], vec![3.0], vec!["X", "Y"]).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.variable_index("Y"), Some(1));
        assert_eq!(data.row(0), Some(&[1.0, 2.0][..]));
    }
}
