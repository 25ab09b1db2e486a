//! State shared by the tabular agents.
use super::{Discretizer, QTable, TabularConfig};
use crate::{
    error::RlError,
    explorer::{argmax_random_tie, EpsilonGreedy},
    record::{Record, RecordValue},
    BoxSpace,
};
use anyhow::Result;
use log::info;
use rand::{rngs::SmallRng, SeedableRng};
use std::{fs, path::Path};

const Q_TABLE_FILE: &str = "q_table.bin";

pub(super) struct TabularBase {
    pub discretizer: Discretizer,
    pub q: QTable,
    pub explorer: EpsilonGreedy,
    pub rng: SmallRng,
    pub alpha: f32,
    pub discount_factor: f32,
    pub train: bool,
}

impl TabularBase {
    pub fn build(config: TabularConfig, obs_space: &BoxSpace, n_actions: usize) -> Result<Self> {
        config.validate()?;
        let discretizer = match config.bounds {
            Some(bounds) => Discretizer::new(bounds.low, bounds.high, config.n_cells)?,
            None => Discretizer::from_space(obs_space, config.n_cells)?,
        };
        if discretizer.n_cells().len() != obs_space.dim() {
            return Err(RlError::ObsDimMismatch {
                expected: obs_space.dim(),
                got: discretizer.n_cells().len(),
            }
            .into());
        }
        let q = QTable::new(discretizer.n_cells(), n_actions)?;

        Ok(Self {
            discretizer,
            q,
            explorer: config.explorer,
            rng: SmallRng::seed_from_u64(config.seed),
            alpha: config.alpha,
            discount_factor: config.discount_factor,
            train: false,
        })
    }

    /// Epsilon-greedy action in training mode, greedy action otherwise.
    pub fn select(&mut self, cell: &[usize]) -> Result<usize> {
        let values = self.q.values(cell)?;
        let a = if self.train {
            self.explorer.action(&values, &mut self.rng)?
        } else {
            argmax_random_tie(&values, &mut self.rng)?
        };
        Ok(a)
    }

    pub fn record(&self, td_error: f32) -> Record {
        let mut record = Record::from_scalar("td_error", td_error);
        record.insert(
            "epsilon",
            RecordValue::Scalar(self.explorer.epsilon() as f32),
        );
        record
    }

    pub fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        let path = path.join(Q_TABLE_FILE);
        self.q.save(&path)?;
        info!("Save Q-table to {:?}", path);
        Ok(())
    }

    pub fn load_params(&mut self, path: &Path) -> Result<()> {
        let q = QTable::load(path.join(Q_TABLE_FILE))?;
        if q.shape() != self.q.shape() {
            return Err(RlError::invalid_config(
                "q_table",
                format!("loaded shape {:?}, expected {:?}", q.shape(), self.q.shape()),
            )
            .into());
        }
        self.q = q;
        Ok(())
    }
}
