//! Argument grid definitions and Cartesian-product enumeration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use tg_types::{validation_error, ArgValue, Combination, GridError, TgResult};

/// A named argument and its candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDef {
    /// Argument name as passed to the prediction function (e.g. "k").
    pub name: String,
    /// Candidate values, evaluated in this order.
    pub values: Vec<ArgValue>,
}

/// The full argument grid: an ordered list of argument definitions.
///
/// Combinations are enumerated with the first argument varying fastest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentGrid {
    pub arguments: Vec<ArgumentDef>,
}

impl ArgumentGrid {
    pub fn new() -> Self {
        Self {
            arguments: Vec::new(),
        }
    }

    pub fn add_values(mut self, name: impl Into<String>, values: Vec<ArgValue>) -> Self {
        self.arguments.push(ArgumentDef {
            name: name.into(),
            values,
        });
        self
    }

    pub fn add_ints(self, name: impl Into<String>, values: &[i64]) -> Self {
        self.add_values(name, values.iter().copied().map(ArgValue::Int).collect())
    }

    /// Every integer in `[low, high]`.
    pub fn add_int_range(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add_values(name, (low..=high).map(ArgValue::Int).collect())
    }

    pub fn add_floats(self, name: impl Into<String>, values: &[f64]) -> Self {
        self.add_values(name, values.iter().copied().map(ArgValue::Float).collect())
    }

    /// `steps` evenly spaced values from `low` to `high` inclusive. One step
    /// yields `low` alone; zero steps leave the argument empty.
    pub fn add_linspace(self, name: impl Into<String>, low: f64, high: f64, steps: usize) -> Self {
        let values = fractions(steps)
            .map(|t| ArgValue::Float(low + t * (high - low)))
            .collect();
        self.add_values(name, values)
    }

    /// `steps` values evenly spaced in log-space from `low` to `high` inclusive,
    /// with the same handling of zero and one step as [`add_linspace`](Self::add_linspace).
    pub fn add_log_space(self, name: impl Into<String>, low: f64, high: f64, steps: usize) -> Self {
        let log_low = low.ln();
        let log_high = high.ln();
        let values = fractions(steps)
            .map(|t| ArgValue::Float((log_low + t * (log_high - log_low)).exp()))
            .collect();
        self.add_values(name, values)
    }

    pub fn add_choices(self, name: impl Into<String>, choices: &[&str]) -> Self {
        self.add_values(name, choices.iter().map(|c| ArgValue::from(*c)).collect())
    }

    pub fn add_bools(self, name: impl Into<String>) -> Self {
        self.add_values(name, vec![ArgValue::Bool(false), ArgValue::Bool(true)])
    }

    pub fn names(&self) -> Vec<String> {
        self.arguments.iter().map(|a| a.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Check that the grid can be enumerated.
    pub fn validate(&self) -> TgResult<()> {
        let mut seen = HashSet::new();
        for arg in &self.arguments {
            if !seen.insert(arg.name.as_str()) {
                return Err(GridError::DuplicateArgument {
                    name: arg.name.clone(),
                }
                .into());
            }
            if arg.values.is_empty() {
                return Err(GridError::EmptyArgument {
                    name: arg.name.clone(),
                }
                .into());
            }
            if let Some(bad) = arg
                .values
                .iter()
                .find(|v| matches!(v, ArgValue::Float(f) if !f.is_finite()))
            {
                return Err(validation_error!(
                    "argument '{}' has a non-finite candidate value {}",
                    arg.name,
                    bad
                ));
            }
        }
        self.checked_size().ok_or(GridError::TooLarge)?;
        Ok(())
    }

    fn checked_size(&self) -> Option<usize> {
        self.arguments
            .iter()
            .try_fold(1usize, |acc, arg| acc.checked_mul(arg.values.len()))
    }

    /// Total number of combinations. An empty grid has exactly one (empty)
    /// combination; an overflowing grid saturates at `usize::MAX`.
    pub fn size(&self) -> usize {
        self.checked_size().unwrap_or(usize::MAX)
    }

    /// The `index`-th combination, first argument varying fastest.
    pub fn combination(&self, index: usize) -> TgResult<Combination> {
        let size = self.size();
        if index >= size {
            return Err(GridError::IndexOutOfRange { index, len: size }.into());
        }

        let mut rest = index;
        let mut combination = Combination::new();
        for arg in &self.arguments {
            let radix = arg.values.len();
            combination.push(arg.name.clone(), arg.values[rest % radix].clone());
            rest /= radix;
        }
        Ok(combination)
    }

    /// Iterate every combination in grid order.
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            grid: self,
            next: 0,
            len: self.size(),
        }
    }

    pub fn to_vec(&self) -> Vec<Combination> {
        self.combinations().collect()
    }
}

/// Positions in `[0, 1]` for `steps` evenly spaced values, starting at 0.
fn fractions(steps: usize) -> impl Iterator<Item = f64> {
    let denom = steps.saturating_sub(1).max(1) as f64;
    (0..steps).map(move |i| i as f64 / denom)
}

/// Iterator over the combinations of an [`ArgumentGrid`].
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    grid: &'a ArgumentGrid,
    next: usize,
    len: usize,
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let combination = self.grid.combination(self.next).ok();
        self.next += 1;
        combination
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_types::TgError;

    #[test]
    fn grid_produces_correct_count() {
        let grid = ArgumentGrid::new()
            .add_int_range("a", 1, 3) // 3 values
            .add_ints("b", &[10, 11]); // 2 values
        assert_eq!(grid.size(), 6);
        assert_eq!(grid.combinations().len(), 6);
        assert_eq!(grid.to_vec().len(), 6);
    }

    #[test]
    fn first_argument_varies_fastest() {
        let grid = ArgumentGrid::new()
            .add_ints("a", &[1, 2])
            .add_choices("b", &["x", "y"]);
        let rendered: Vec<String> = grid.combinations().map(|c| c.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["a=1, b=x", "a=2, b=x", "a=1, b=y", "a=2, b=y"]
        );
    }

    #[test]
    fn empty_grid_has_single_empty_combination() {
        let grid = ArgumentGrid::new();
        assert!(grid.validate().is_ok());
        let all = grid.to_vec();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_empty());
    }

    #[test]
    fn validate_rejects_empty_and_duplicate_arguments() {
        let empty = ArgumentGrid::new().add_values("k", vec![]);
        assert!(matches!(
            empty.validate(),
            Err(TgError::Grid(GridError::EmptyArgument { .. }))
        ));
        assert_eq!(empty.size(), 0);

        let dup = ArgumentGrid::new().add_ints("k", &[1]).add_ints("k", &[2]);
        assert!(matches!(
            dup.validate(),
            Err(TgError::Grid(GridError::DuplicateArgument { .. }))
        ));

        let nan = ArgumentGrid::new().add_floats("x", &[f64::NAN]);
        assert!(matches!(nan.validate(), Err(TgError::Validation(_))));
    }

    #[test]
    fn validate_rejects_overflowing_grid() {
        let big: Vec<i64> = (0..100_000).collect();
        let mut grid = ArgumentGrid::new();
        for i in 0..5 {
            grid = grid.add_ints(format!("a{i}"), &big);
        }
        assert!(matches!(grid.validate(), Err(TgError::Grid(GridError::TooLarge))));
    }

    #[test]
    fn combination_index_out_of_range() {
        let grid = ArgumentGrid::new().add_bools("flag");
        assert!(grid.combination(1).is_ok());
        assert!(matches!(
            grid.combination(2),
            Err(TgError::Grid(GridError::IndexOutOfRange { index: 2, len: 2 }))
        ));
    }

    #[test]
    fn linspace_and_log_space_endpoints() {
        let grid = ArgumentGrid::new()
            .add_linspace("x", 0.0, 1.0, 5)
            .add_log_space("lr", 1e-4, 1e-1, 4);
        let xs = &grid.arguments[0].values;
        assert_eq!(xs.len(), 5);
        assert_eq!(xs[2], ArgValue::Float(0.5));
        let lrs = &grid.arguments[1].values;
        let first = lrs[0].as_f64().unwrap();
        let last = lrs[3].as_f64().unwrap();
        assert!((first - 1e-4).abs() < 1e-12);
        assert!((last - 1e-1).abs() < 1e-9);
    }

    #[test]
    fn spaced_ranges_honour_small_step_counts() {
        let grid = ArgumentGrid::new()
            .add_linspace("x", 2.0, 4.0, 1)
            .add_log_space("lr", 1e-3, 1e-1, 1);
        assert_eq!(grid.arguments[0].values, vec![ArgValue::Float(2.0)]);
        assert_eq!(grid.arguments[1].values.len(), 1);
        let lr = grid.arguments[1].values[0].as_f64().unwrap();
        assert!((lr - 1e-3).abs() < 1e-15);
        assert_eq!(grid.size(), 1);

        let empty = ArgumentGrid::new().add_linspace("x", 0.0, 1.0, 0);
        assert!(empty.arguments[0].values.is_empty());
        assert_eq!(empty.size(), 0);
        assert!(matches!(
            empty.validate(),
            Err(TgError::Grid(GridError::EmptyArgument { .. }))
        ));
    }
}
