//! Q-learning agent.
use super::{base::TabularBase, q_learning_target, QTable, TabularConfig};
use crate::{record::Record, Act, Agent, BoxSpace, Env, Obs, Policy, Transition};
use anyhow::Result;
use std::{marker::PhantomData, path::Path};

/// Tabular Q-learning agent.
///
/// Actions are selected epsilon-greedily, but the TD target bootstraps from the
/// largest action value of the next state.
pub struct QLearning<E: Env> {
    base: TabularBase,
    phantom: PhantomData<E>,
}

impl<E: Env> QLearning<E> {
    /// Constructs a Q-learning agent.
    pub fn build(config: TabularConfig, obs_space: &BoxSpace, n_actions: usize) -> Result<Self> {
        Ok(Self {
            base: TabularBase::build(config, obs_space, n_actions)?,
            phantom: PhantomData,
        })
    }

    /// The Q-table.
    pub fn q_table(&self) -> &QTable {
        &self.base.q
    }

    /// Discretizes an observation.
    pub fn cell(&self, obs: &E::Obs) -> Result<Vec<usize>> {
        Ok(self.base.discretizer.discretize(obs.as_slice())?)
    }
}

impl<E: Env> Policy<E> for QLearning<E> {
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let cell = self.cell(obs)?;
        Ok(E::Act::from_index(self.base.select(&cell)?))
    }
}

impl<E: Env> Agent<E> for QLearning<E> {
    fn train(&mut self) {
        self.base.train = true;
    }

    fn eval(&mut self) {
        self.base.train = false;
    }

    fn is_train(&self) -> bool {
        self.base.train
    }

    fn observe(&mut self, tr: Transition<E::Obs, E::Act>) -> Result<Option<Record>> {
        let cell = self.cell(&tr.obs)?;
        let next_cell = self.cell(&tr.next_obs)?;
        let q_next = self.base.q.values(&next_cell)?;
        let target = q_learning_target(
            tr.reward,
            self.base.discount_factor,
            &q_next,
            tr.is_terminated,
        );
        let td_error = self
            .base
            .q
            .update(&cell, tr.act.index(), target, self.base.alpha)?;

        Ok(Some(self.base.record(td_error)))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        self.base.save_params(path)
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.base.load_params(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{explorer::EpsilonGreedy, tabular::test_env::Loop, DiscreteAct};
    use tempdir::TempDir;

    fn agent() -> Result<QLearning<Loop>> {
        let env = Loop::build(&(), 0)?;
        let config = TabularConfig::default()
            .n_cells(vec![2])
            .alpha(0.5)
            .discount_factor(0.9)
            .explorer(EpsilonGreedy::constant(1.0));
        let mut agent = QLearning::build(config, env.observation_space(), 2)?;
        agent.train();
        Ok(agent)
    }

    #[test]
    fn test_update_bootstraps_from_max() -> Result<()> {
        let mut agent = agent()?;
        agent.observe(Transition {
            obs: Loop::obs(0),
            act: DiscreteAct(0),
            reward: 1.0,
            next_obs: Loop::obs(0),
            is_terminated: true,
            is_truncated: false,
        })?;
        assert_eq!(agent.q_table().values(&[0])?, vec![0.5, 0.0]);

        let record = agent
            .observe(Transition {
                obs: Loop::obs(1),
                act: DiscreteAct(0),
                reward: 0.0,
                next_obs: Loop::obs(0),
                is_terminated: false,
                is_truncated: false,
            })?
            .unwrap();
        assert!((record.get_scalar("td_error")? - 0.45).abs() < 1e-6);
        assert!((agent.q_table().get(&[1], 0)? - 0.225).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_truncation_still_bootstraps() -> Result<()> {
        let mut agent = agent()?;
        agent.base.q.set(&[0], 1, 1.0)?;
        agent.observe(Transition {
            obs: Loop::obs(1),
            act: DiscreteAct(1),
            reward: 0.0,
            next_obs: Loop::obs(0),
            is_terminated: false,
            is_truncated: true,
        })?;
        assert!((agent.q_table().get(&[1], 1)? - 0.45).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_eval_is_greedy() -> Result<()> {
        let mut agent = agent()?;
        agent.base.q.set(&[0], 1, 1.0)?;
        agent.eval();
        for _ in 0..20 {
            assert_eq!(agent.sample(&Loop::obs(0))?.0, 1);
        }
        Ok(())
    }

    #[test]
    fn test_save_and_load_params() -> Result<()> {
        let mut agent = agent()?;
        agent.base.q.set(&[1], 0, 2.0)?;
        let dir = TempDir::new("q_learning")?;
        agent.save_params(dir.path())?;

        let mut agent_ = self::agent()?;
        agent_.load_params(dir.path())?;
        assert_eq!(agent_.q_table(), agent.q_table());
        Ok(())
    }

    #[test]
    fn test_action_out_of_range() -> Result<()> {
        let mut agent = agent()?;
        let res = agent.observe(Transition {
            obs: Loop::obs(0),
            act: DiscreteAct(5),
            reward: 0.0,
            next_obs: Loop::obs(1),
            is_terminated: false,
            is_truncated: false,
        });
        assert!(res.is_err());
        Ok(())
    }
}
