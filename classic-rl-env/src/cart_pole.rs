//! Cart-pole environment.
use anyhow::Result;
use classic_rl_core::{
    record::Record, util, BoxSpace, DiscreteAct, DiscreteSpace, Env, Step, VecObs,
};
use log::warn;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, path::Path};

const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_POLE: f64 = 0.1;
const TOTAL_MASS: f64 = MASS_CART + MASS_POLE;
// half of the pole length
const LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = MASS_POLE * LENGTH;
const FORCE_MAG: f64 = 10.0;
// seconds between state updates
const TAU: f64 = 0.02;
const X_THRESHOLD: f64 = 2.4;
const THETA_THRESHOLD: f64 = 12.0 * 2.0 * PI / 360.0;

/// Configuration of [`CartPole`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CartPoleConfig {
    /// Episodes are truncated after this number of steps.
    pub max_steps: Option<usize>,

    /// Bound of the cart velocity in the observation space.
    /// The velocity is unbounded if `None`.
    pub velocity_bound: Option<f32>,

    /// Bound of the pole angular velocity in the observation space.
    /// The angular velocity is unbounded if `None`.
    pub angular_velocity_bound: Option<f32>,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(500),
            velocity_bound: None,
            angular_velocity_bound: None,
        }
    }
}

impl CartPoleConfig {
    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: Option<usize>) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets finite bounds of the velocities in the observation space.
    ///
    /// Tabular agents discretize observations within the bounds of the observation
    /// space, which must be finite.
    pub fn velocity_bounds(mut self, velocity: f32, angular_velocity: f32) -> Self {
        self.velocity_bound = Some(velocity);
        self.angular_velocity_bound = Some(angular_velocity);
        self
    }

    /// Loads [`CartPoleConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        util::load_yaml(path)
    }

    /// Saves [`CartPoleConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        util::save_yaml(self, path)
    }
}

/// The cart-pole balancing task.
///
/// A pole is attached to a cart moving along a track. Action 0 pushes the cart to
/// the left and action 1 to the right. The observation is
/// `[x, x_dot, theta, theta_dot]`. Every step yields reward 1. The episode terminates
/// when `|x| > 2.4` or `|theta| > 12 degrees`, and is truncated after `max_steps`.
///
/// The dynamics are integrated with the explicit Euler method at 50 Hz.
pub struct CartPole {
    // [x, x_dot, theta, theta_dot]
    state: [f64; 4],
    steps: usize,
    done: bool,
    max_steps: Option<usize>,
    seed: u64,
    rng: StdRng,
    obs_space: BoxSpace,
    act_space: DiscreteSpace,
}

impl CartPole {
    fn obs(&self) -> VecObs {
        VecObs(self.state.iter().map(|&v| v as f32).collect())
    }

    fn reset_state(&mut self) -> VecObs {
        for v in self.state.iter_mut() {
            *v = self.rng.gen_range(-0.05..0.05);
        }
        self.steps = 0;
        self.done = false;
        self.obs()
    }

    /// The internal state `[x, x_dot, theta, theta_dot]`.
    pub fn state(&self) -> [f64; 4] {
        self.state
    }

    /// Sets the internal state.
    pub fn set_state(&mut self, state: [f64; 4]) {
        self.state = state;
    }
}

impl Env for CartPole {
    type Config = CartPoleConfig;
    type Obs = VecObs;
    type Act = DiscreteAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let high = vec![
            (2.0 * X_THRESHOLD) as f32,
            config.velocity_bound.unwrap_or(f32::MAX),
            (2.0 * THETA_THRESHOLD) as f32,
            config.angular_velocity_bound.unwrap_or(f32::MAX),
        ];
        let low = high.iter().map(|v| -v).collect();
        let seed = seed as u64;

        Ok(Self {
            state: [0.0; 4],
            steps: 0,
            done: false,
            max_steps: config.max_steps,
            seed,
            rng: StdRng::seed_from_u64(seed),
            obs_space: BoxSpace::new(low, high)?,
            act_space: DiscreteSpace::new(2)?,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.act_space.check(a.0)?;
        if self.done {
            warn!("CartPole::step() is called after the episode ended, call reset()");
        }

        let [x, x_dot, theta, theta_dot] = self.state;
        let force = if a.0 == 1 { FORCE_MAG } else { -FORCE_MAG };
        let (sin, cos) = theta.sin_cos();
        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin - cos * temp)
            / (LENGTH * (4.0 / 3.0 - MASS_POLE * cos * cos / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos / TOTAL_MASS;

        self.state = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc,
        ];
        self.steps += 1;

        let [x, _, theta, _] = self.state;
        let is_terminated = !(-X_THRESHOLD..=X_THRESHOLD).contains(&x)
            || !(-THETA_THRESHOLD..=THETA_THRESHOLD).contains(&theta);
        let is_truncated =
            !is_terminated && self.max_steps.map_or(false, |max| self.steps >= max);
        self.done = is_terminated || is_truncated;

        let step = Step::new(self.obs(), *a, 1.0, is_terminated, is_truncated, ());
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        Ok(self.reset_state())
    }

    /// Resets the environment with a random generator seeded by `seed + ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = StdRng::seed_from_u64(self.seed.wrapping_add(ix as u64));
        Ok(self.reset_state())
    }

    fn observation_space(&self) -> &BoxSpace {
        &self.obs_space
    }

    fn action_space(&self) -> &DiscreteSpace {
        &self.act_space
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classic_rl_core::Obs;
    use tempdir::TempDir;

    #[test]
    fn test_reset_is_near_upright() -> Result<()> {
        let mut env = CartPole::build(&CartPoleConfig::default(), 0)?;
        for _ in 0..10 {
            let obs = env.reset()?;
            assert_eq!(obs.len(), 4);
            assert!(obs.as_slice().iter().all(|v| v.abs() < 0.05));
        }
        Ok(())
    }

    #[test]
    fn test_reset_with_index_is_reproducible() -> Result<()> {
        let mut env1 = CartPole::build(&CartPoleConfig::default(), 7)?;
        let mut env2 = CartPole::build(&CartPoleConfig::default(), 7)?;
        env2.reset()?;
        assert_eq!(env1.reset_with_index(3)?, env2.reset_with_index(3)?);
        assert_ne!(env1.reset_with_index(3)?, env1.reset_with_index(4)?);
        Ok(())
    }

    #[test]
    fn test_one_step_dynamics() -> Result<()> {
        let mut env = CartPole::build(&CartPoleConfig::default(), 0)?;
        env.reset()?;
        env.set_state([0.0; 4]);
        let (step, _) = env.step(&DiscreteAct(1))?;
        // x and theta change one step after the velocities
        let s = env.state();
        assert_eq!(s[0], 0.0);
        assert_eq!(s[2], 0.0);
        assert!((s[1] - 0.195_121_95).abs() < 1e-6);
        assert!((s[3] + 0.292_682_93).abs() < 1e-6);
        assert_eq!(step.reward, 1.0);
        assert!(!step.is_done());
        Ok(())
    }

    #[test]
    fn test_pole_falls_with_constant_push() -> Result<()> {
        let mut env = CartPole::build(&CartPoleConfig::default(), 0)?;
        env.reset()?;
        let mut n = 0;
        loop {
            let (step, _) = env.step(&DiscreteAct(0))?;
            n += 1;
            if step.is_done() {
                assert!(step.is_terminated);
                break;
            }
        }
        assert!(n < 100);
        Ok(())
    }

    #[test]
    fn test_truncation() -> Result<()> {
        let config = CartPoleConfig::default().max_steps(Some(3));
        let mut env = CartPole::build(&config, 0)?;
        env.reset()?;
        let mut last = None;
        for a in [0, 1, 0] {
            last = Some(env.step(&DiscreteAct(a))?.0);
        }
        let last = last.unwrap();
        assert!(last.is_truncated && !last.is_terminated);
        Ok(())
    }

    #[test]
    fn test_invalid_action() -> Result<()> {
        let mut env = CartPole::build(&CartPoleConfig::default(), 0)?;
        env.reset()?;
        assert!(env.step(&DiscreteAct(2)).is_err());
        Ok(())
    }

    #[test]
    fn test_observation_space() -> Result<()> {
        let env = CartPole::build(&CartPoleConfig::default(), 0)?;
        assert_eq!(env.observation_space().high()[1], f32::MAX);
        let config = CartPoleConfig::default().velocity_bounds(3.0, 3.5);
        let env = CartPole::build(&config, 0)?;
        assert_eq!(env.observation_space().low()[1], -3.0);
        assert_eq!(env.observation_space().high()[3], 3.5);
        assert_eq!(env.action_space().n(), 2);
        Ok(())
    }

    #[test]
    fn test_serde_config() -> Result<()> {
        let config = CartPoleConfig::default().velocity_bounds(3.0, 3.5);
        let dir = TempDir::new("cart_pole_config")?;
        let path = dir.path().join("cart_pole.yaml");
        config.save(&path)?;
        assert_eq!(CartPoleConfig::load(&path)?, config);
        Ok(())
    }
}
