//! A two-state environment for testing tabular agents.
use crate::{record::Record, BoxSpace, DiscreteAct, DiscreteSpace, Env, Step, VecObs};
use anyhow::Result;

/// In state 0, action 0 gives reward 1 and terminates, action 1 moves to state 1.
/// Any action in state 1 moves back to state 0.
///
/// Same dynamics as `classic_rl_env::TwoStateMdp`, which this crate cannot depend on
/// because `classic-rl-env` depends on it.
pub struct Loop {
    state: usize,
    obs_space: BoxSpace,
    act_space: DiscreteSpace,
}

impl Loop {
    pub fn obs(state: usize) -> VecObs {
        VecObs(vec![state as f32])
    }
}

impl Env for Loop {
    type Config = ();
    type Obs = VecObs;
    type Act = DiscreteAct;
    type Info = ();

    fn build(_config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            state: 0,
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
        let step = Step::new(Self::obs(self.state), *a, reward, is_terminated, false, ());
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.state = 0;
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
