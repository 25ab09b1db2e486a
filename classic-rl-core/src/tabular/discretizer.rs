//! Discretization of continuous observations.
use crate::{error::RlError, BoxSpace};
use serde::{Deserialize, Serialize};

/// Maps a continuous observation to a grid cell.
///
/// Each dimension `i` with bounds `[low_i, high_i]` is split into `n_cells_i` cells
/// of equal width, and the cell index is `floor((x - low_i) / (high_i - low_i) * n_cells_i)`.
/// Values outside of the bounds are clipped into the first or the last cell, so that
/// `x == high_i` lands in cell `n_cells_i - 1`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Discretizer {
    low: Vec<f32>,
    high: Vec<f32>,
    n_cells: Vec<usize>,
}

impl Discretizer {
    /// Constructs a discretizer from per-dimension bounds and the number of cells.
    pub fn new(low: Vec<f32>, high: Vec<f32>, n_cells: Vec<usize>) -> Result<Self, RlError> {
        if low.len() != high.len() || low.len() != n_cells.len() {
            return Err(RlError::invalid_config(
                "discretizer",
                format!(
                    "lengths of low ({}), high ({}) and n_cells ({}) differ",
                    low.len(),
                    high.len(),
                    n_cells.len()
                ),
            ));
        }
        if n_cells.is_empty() {
            return Err(RlError::invalid_config(
                "n_cells",
                "at least one dimension is required",
            ));
        }
        for i in 0..low.len() {
            let (l, h) = (low[i], high[i]);
            if !(h - l).is_finite() {
                return Err(RlError::invalid_config(
                    "discretizer bounds",
                    format!("range [{}, {}] of dimension {} is not finite", l, h, i),
                ));
            }
            if l >= h {
                return Err(RlError::invalid_config(
                    "discretizer bounds",
                    format!("low {} is not less than high {} at dimension {}", l, h, i),
                ));
            }
            if n_cells[i] == 0 {
                return Err(RlError::invalid_config(
                    "n_cells",
                    format!("dimension {} has no cell", i),
                ));
            }
        }
        Ok(Self {
            low,
            high,
            n_cells,
        })
    }

    /// Constructs a discretizer over the bounds of an observation space.
    pub fn from_space(space: &BoxSpace, n_cells: Vec<usize>) -> Result<Self, RlError> {
        Self::new(space.low().to_vec(), space.high().to_vec(), n_cells)
    }

    /// The number of cells per dimension.
    pub fn n_cells(&self) -> &[usize] {
        &self.n_cells
    }

    /// Returns the cell of an observation.
    pub fn discretize(&self, obs: &[f32]) -> Result<Vec<usize>, RlError> {
        if obs.len() != self.n_cells.len() {
            return Err(RlError::ObsDimMismatch {
                expected: self.n_cells.len(),
                got: obs.len(),
            });
        }
        obs.iter()
            .enumerate()
            .map(|(i, &x)| {
                if !x.is_finite() {
                    return Err(RlError::NonFiniteObs(i));
                }
                let n = self.n_cells[i];
                let r = (x - self.low[i]) / (self.high[i] - self.low[i]);
                let c = (r * n as f32).floor();
                Ok(if c < 0.0 {
                    0
                } else {
                    (c as usize).min(n - 1)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    fn discretizer() -> Discretizer {
        Discretizer::new(vec![-2.4, -3.0, -0.21], vec![2.4, 3.0, 0.21], vec![6, 6, 12]).unwrap()
    }

    #[test]
    fn test_cells_in_range_within_bounds() {
        let d = discretizer();
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..10_000 {
            let obs = (0..3)
                .map(|i| rng.gen_range(d.low[i]..=d.high[i]))
                .collect::<Vec<_>>();
            let cell = d.discretize(&obs).unwrap();
            for (c, n) in cell.iter().zip(d.n_cells()) {
                assert!(c < n);
            }
        }
    }

    #[test]
    fn test_boundaries_and_clipping() {
        let d = Discretizer::new(vec![0.0], vec![1.0], vec![4]).unwrap();
        assert_eq!(d.discretize(&[0.0]).unwrap(), vec![0]);
        assert_eq!(d.discretize(&[0.25]).unwrap(), vec![1]);
        assert_eq!(d.discretize(&[0.74]).unwrap(), vec![2]);
        assert_eq!(d.discretize(&[1.0]).unwrap(), vec![3]);
        assert_eq!(d.discretize(&[-5.0]).unwrap(), vec![0]);
        assert_eq!(d.discretize(&[7.0]).unwrap(), vec![3]);
    }

    #[test]
    fn test_invalid_input() {
        let d = discretizer();
        assert_eq!(
            d.discretize(&[0.0, 0.0]),
            Err(RlError::ObsDimMismatch {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            d.discretize(&[0.0, f32::NAN, 0.0]),
            Err(RlError::NonFiniteObs(1))
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(Discretizer::new(vec![0.0], vec![1.0], vec![0]).is_err());
        assert!(Discretizer::new(vec![1.0], vec![1.0], vec![2]).is_err());
        assert!(Discretizer::new(vec![0.0], vec![1.0, 2.0], vec![2]).is_err());
        assert!(Discretizer::new(vec![-f32::MAX], vec![f32::MAX], vec![2]).is_err());
        assert!(Discretizer::new(vec![0.0], vec![f32::INFINITY], vec![2]).is_err());
    }
}
