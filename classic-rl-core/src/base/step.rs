//! Environment step.
use super::Env;

/// Additional information to `Obs` and `Act`.
pub trait Info {}

impl Info for () {}

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with some additional information.
///
/// An environment emits [`Step`] object at every interaction steps.
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// Observation.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if episode is terminated.
    pub is_terminated: bool,

    /// Flag denoting if episode is truncated.
    pub is_truncated: bool,

    /// Information defined by user.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// A transition `(o_t, a_t, r_t, o_t+1, done_t)`, the unit of experience.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O, A> {
    /// Observation `o_t`.
    pub obs: O,

    /// Action `a_t`.
    pub act: A,

    /// Reward `r_t`.
    pub reward: f32,

    /// Observation `o_t+1`.
    pub next_obs: O,

    /// `o_t+1` is a terminal state.
    pub is_terminated: bool,

    /// The episode was cut at `o_t+1` without reaching a terminal state.
    pub is_truncated: bool,
}

impl<O, A> Transition<O, A> {
    /// Builds a transition from the previous observation and a [`Step`].
    pub fn from_step<E>(obs: O, step: Step<E>) -> Self
    where
        E: Env<Obs = O, Act = A>,
    {
        Self {
            obs,
            act: step.act,
            reward: step.reward,
            next_obs: step.obs,
            is_terminated: step.is_terminated,
            is_truncated: step.is_truncated,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
