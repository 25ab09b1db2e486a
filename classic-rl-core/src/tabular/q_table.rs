//! Q-table.
use crate::error::RlError;
use anyhow::Result;
use ndarray::{ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// A dense table of action values.
///
/// The shape of the table is `n_cells ++ [n_actions]`, fixed at construction.
/// All entries are initialized to zero.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct QTable {
    q: ArrayD<f32>,
}

impl QTable {
    /// Constructs a zero-initialized table.
    pub fn new(n_cells: &[usize], n_actions: usize) -> Result<Self, RlError> {
        if n_cells.iter().any(|&n| n == 0) {
            return Err(RlError::invalid_config("n_cells", "must be positive"));
        }
        if n_actions == 0 {
            return Err(RlError::invalid_config("n_actions", "must be positive"));
        }
        let mut shape = n_cells.to_vec();
        shape.push(n_actions);
        Ok(Self {
            q: ArrayD::zeros(IxDyn(&shape)),
        })
    }

    /// The number of actions.
    pub fn n_actions(&self) -> usize {
        self.q.shape()[self.q.ndim() - 1]
    }

    /// The shape of the table.
    pub fn shape(&self) -> &[usize] {
        self.q.shape()
    }

    fn check_cell(&self, cell: &[usize]) -> Result<(), RlError> {
        let shape = self.q.shape();
        if cell.len() != shape.len() - 1 {
            return Err(RlError::ObsDimMismatch {
                expected: shape.len() - 1,
                got: cell.len(),
            });
        }
        for (dim, (&index, &size)) in cell.iter().zip(shape).enumerate() {
            if index >= size {
                return Err(RlError::CellOutOfRange { dim, index, size });
            }
        }
        Ok(())
    }

    fn index(&self, cell: &[usize], act: usize) -> Result<Vec<usize>, RlError> {
        self.check_cell(cell)?;
        let n = self.n_actions();
        if act >= n {
            return Err(RlError::ActionOutOfRange { act, n });
        }
        let mut ix = cell.to_vec();
        ix.push(act);
        Ok(ix)
    }

    /// Action values of a cell.
    pub fn values(&self, cell: &[usize]) -> Result<Vec<f32>, RlError> {
        self.check_cell(cell)?;
        let mut view = self.q.view();
        for &i in cell {
            view = view.index_axis_move(Axis(0), i);
        }
        Ok(view.iter().copied().collect())
    }

    /// Action value of a cell and an action.
    pub fn get(&self, cell: &[usize], act: usize) -> Result<f32, RlError> {
        let ix = self.index(cell, act)?;
        Ok(self.q[&ix[..]])
    }

    /// Sets the action value of a cell and an action.
    pub fn set(&mut self, cell: &[usize], act: usize, value: f32) -> Result<(), RlError> {
        let ix = self.index(cell, act)?;
        self.q[&ix[..]] = value;
        Ok(())
    }

    /// Moves `Q[cell][act]` toward `target` with step size `alpha`.
    ///
    /// Returns the TD error `target - Q[cell][act]` before the update.
    pub fn update(
        &mut self,
        cell: &[usize],
        act: usize,
        target: f32,
        alpha: f32,
    ) -> Result<f32, RlError> {
        let ix = self.index(cell, act)?;
        let q = &mut self.q[&ix[..]];
        let td_error = target - *q;
        *q += alpha * td_error;
        Ok(td_error)
    }

    /// Saves the table to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        bincode::serialize_into(file, self)?;
        Ok(())
    }

    /// Loads a table from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_shape_and_zero_init() -> Result<()> {
        let q = QTable::new(&[3, 4], 2)?;
        assert_eq!(q.shape(), &[3, 4, 2]);
        assert_eq!(q.n_actions(), 2);
        assert_eq!(q.values(&[2, 3])?, vec![0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_update() -> Result<()> {
        let mut q = QTable::new(&[2], 2)?;
        let td = q.update(&[1], 0, 1.0, 0.5)?;
        assert_eq!(td, 1.0);
        assert_eq!(q.get(&[1], 0)?, 0.5);
        assert_eq!(q.values(&[1])?, vec![0.5, 0.0]);
        assert_eq!(q.values(&[0])?, vec![0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_bounds_checked() -> Result<()> {
        let mut q = QTable::new(&[2, 3], 2)?;
        assert_eq!(
            q.get(&[1, 3], 0),
            Err(RlError::CellOutOfRange {
                dim: 1,
                index: 3,
                size: 3
            })
        );
        assert_eq!(
            q.set(&[0, 0], 2, 1.0),
            Err(RlError::ActionOutOfRange { act: 2, n: 2 })
        );
        assert!(q.values(&[0]).is_err());
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let mut q = QTable::new(&[2, 2], 3)?;
        q.set(&[1, 0], 2, -1.5)?;
        let dir = TempDir::new("q_table")?;
        let path = dir.path().join("q_table.bin");
        q.save(&path)?;
        assert_eq!(QTable::load(&path)?, q);
        Ok(())
    }
}
