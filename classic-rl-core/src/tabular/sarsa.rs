//! SARSA agent.
use super::{base::TabularBase, sarsa_target, QTable, TabularConfig};
use crate::{record::Record, Act, Agent, BoxSpace, Env, Obs, Policy, Transition};
use anyhow::Result;
use std::{marker::PhantomData, path::Path};

/// Tabular SARSA agent.
///
/// SARSA is on-policy: the TD target bootstraps from the action that the agent
/// will take in the next state. When [`Agent::observe`] selects that action, it is
/// kept and returned by the next call of [`Policy::sample`] on the same cell, so the
/// action used in the target is the action actually executed.
pub struct Sarsa<E: Env> {
    base: TabularBase,
    // next cell and the action committed to in that cell
    pending: Option<(Vec<usize>, usize)>,
    phantom: PhantomData<E>,
}

impl<E: Env> Sarsa<E> {
    /// Constructs a SARSA agent.
    pub fn build(config: TabularConfig, obs_space: &BoxSpace, n_actions: usize) -> Result<Self> {
        Ok(Self {
            base: TabularBase::build(config, obs_space, n_actions)?,
            pending: None,
            phantom: PhantomData,
        })
    }

    /// The Q-table.
    pub fn q_table(&self) -> &QTable {
        &self.base.q
    }

    /// The action committed to for the next state, if any.
    pub fn pending_action(&self) -> Option<usize> {
        self.pending.as_ref().map(|(_, a)| *a)
    }

    /// Discretizes an observation.
    pub fn cell(&self, obs: &E::Obs) -> Result<Vec<usize>> {
        Ok(self.base.discretizer.discretize(obs.as_slice())?)
    }
}

impl<E: Env> Policy<E> for Sarsa<E> {
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let cell = self.cell(obs)?;
        if self.base.train {
            if let Some((pending_cell, a)) = self.pending.take() {
                if pending_cell == cell {
                    return Ok(E::Act::from_index(a));
                }
            }
        }
        Ok(E::Act::from_index(self.base.select(&cell)?))
    }
}

impl<E: Env> Agent<E> for Sarsa<E> {
    fn train(&mut self) {
        self.base.train = true;
    }

    fn eval(&mut self) {
        self.base.train = false;
        self.pending = None;
    }

    fn is_train(&self) -> bool {
        self.base.train
    }

    fn reset(&mut self, _init_obs: &E::Obs) {
        self.pending = None;
    }

    fn observe(&mut self, tr: Transition<E::Obs, E::Act>) -> Result<Option<Record>> {
        let cell = self.cell(&tr.obs)?;
        let next_cell = self.cell(&tr.next_obs)?;
        let act = tr.act.index();

        let (target, next_act) = if tr.is_terminated {
            (tr.reward, None)
        } else {
            let q_next = self.base.q.values(&next_cell)?;
            let next_act = self.base.select(&next_cell)?;
            let target = sarsa_target(
                tr.reward,
                self.base.discount_factor,
                &q_next,
                next_act,
                false,
            );
            (target, Some(next_act))
        };
        let td_error = self.base.q.update(&cell, act, target, self.base.alpha)?;

        self.pending = match next_act {
            Some(a) if !tr.is_truncated => Some((next_cell, a)),
            _ => None,
        };

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
    use crate::{explorer::EpsilonGreedy, tabular::test_env::Loop, DiscreteAct, VecObs};

    fn agent(eps: f64) -> Result<Sarsa<Loop>> {
        let env = Loop::build(&(), 0)?;
        let config = TabularConfig::default()
            .n_cells(vec![2])
            .alpha(0.5)
            .discount_factor(0.9)
            .explorer(EpsilonGreedy::constant(eps));
        let mut agent = Sarsa::build(config, env.observation_space(), 2)?;
        agent.train();
        Ok(agent)
    }

    fn transition(s: usize, a: usize, r: f32, s_: usize, term: bool) -> Transition<VecObs, DiscreteAct> {
        Transition {
            obs: Loop::obs(s),
            act: DiscreteAct(a),
            reward: r,
            next_obs: Loop::obs(s_),
            is_terminated: term,
            is_truncated: false,
        }
    }

    #[test]
    fn test_sample_returns_committed_action() -> Result<()> {
        let mut agent = agent(1.0)?;
        for _ in 0..50 {
            agent.observe(transition(0, 1, 0.0, 1, false))?;
            let a = agent.pending_action().unwrap();
            assert_eq!(agent.sample(&Loop::obs(1))?.0, a);
            assert_eq!(agent.pending_action(), None);
        }
        Ok(())
    }

    #[test]
    fn test_no_commitment_after_termination_or_reset() -> Result<()> {
        let mut agent = agent(0.0)?;
        agent.observe(transition(0, 0, 1.0, 0, true))?;
        assert_eq!(agent.pending_action(), None);
        agent.observe(transition(0, 1, 0.0, 1, false))?;
        assert!(agent.pending_action().is_some());
        agent.reset(&Loop::obs(0));
        assert_eq!(agent.pending_action(), None);
        Ok(())
    }

    #[test]
    fn test_update_uses_committed_action_value() -> Result<()> {
        let mut agent = agent(0.0)?;
        // Q[0][0] = 0.5
        agent.observe(transition(0, 0, 1.0, 0, true))?;
        assert_eq!(agent.q_table().get(&[0], 0)?, 0.5);
        // greedy next action in state 0 is 0, so the target is 0 + 0.9 * 0.5
        agent.observe(transition(1, 1, 0.0, 0, false))?;
        assert_eq!(agent.pending_action(), Some(0));
        assert!((agent.q_table().get(&[1], 1)? - 0.5 * 0.45).abs() < 1e-6);
        Ok(())
    }
}
