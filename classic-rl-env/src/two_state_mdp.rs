//! A deterministic two-state MDP.
use anyhow::Result;
use classic_rl_core::{
    record::Record, BoxSpace, DiscreteAct, DiscreteSpace, Env, Step, VecObs,
};
use serde::{Deserialize, Serialize};

/// Configuration of [`TwoStateMdp`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TwoStateMdpConfig {
    /// Episodes are truncated after this number of steps.
    pub max_steps: usize,
}

impl Default for TwoStateMdpConfig {
    fn default() -> Self {
        Self { max_steps: 100 }
    }
}

impl TwoStateMdpConfig {
    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }
}

/// A two-state MDP with a known optimal policy.
///
/// The observation is `[state]`. In state 0, action 0 yields reward 1 and
/// terminates the episode, while action 1 yields reward 0 and moves to state 1.
/// Any action in state 1 yields reward 0 and moves back to state 0.
/// The optimal action in state 0 is therefore 0 for any discount factor below 1.
pub struct TwoStateMdp {
    state: usize,
    steps: usize,
    max_steps: usize,
    obs_space: BoxSpace,
    act_space: DiscreteSpace,
}

impl TwoStateMdp {
    /// The observation of the given state.
    pub fn obs(state: usize) -> VecObs {
        VecObs(vec![state as f32])
    }

    /// The current state.
    pub fn state(&self) -> usize {
        self.state
    }
}

impl Env for TwoStateMdp {
    type Config = TwoStateMdpConfig;
    type Obs = VecObs;
    type Act = DiscreteAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            state: 0,
            steps: 0,
            max_steps: config.max_steps,
            obs_space: BoxSpace::new(vec![0.0], vec![1.0])?,
            act_space: DiscreteSpace::new(2)?,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.act_space.check(a.0)?;
        let (reward, is_terminated) = match (self.state, a.0) {
            (0, 0) => (1.0, true),
            (0, _) => {
                self.state = 1;
                (0.0, false)
            }
            _ => {
                self.state = 0;
                (0.0, false)
            }
        };
        self.steps += 1;
        let is_truncated = !is_terminated && self.steps >= self.max_steps;
        let step = Step::new(Self::obs(self.state), *a, reward, is_terminated, is_truncated, ());
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.state = 0;
        self.steps = 0;
        Ok(Self::obs(0))
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }

    fn observation_space(&self) -> &BoxSpace {
        &self.obs_space
    }

    fn action_space(&self) -> &DiscreteSpace {
        &self.act_space
    }
}
