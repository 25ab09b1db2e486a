/// A batch of transitions sampled from a replay buffer.
#[derive(Clone, Debug)]
pub struct TransitionBatch<O, A> {
    /// Observations `o_t`.
    pub obs: Vec<O>,

    /// Actions `a_t`.
    pub act: Vec<A>,

    /// Next observations `o_t+1`.
    pub next_obs: Vec<O>,

    /// Rewards `r_t`.
    pub reward: Vec<f32>,

    /// `1` if `o_t+1` is a terminal state.
    pub is_terminated: Vec<i8>,
}

impl<O, A> TransitionBatch<O, A> {
    /// Creates an empty batch with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            is_terminated: Vec::with_capacity(capacity),
        }
    }

    /// Unpack the data `(o_t, a_t, o_t+1, r_t, is_terminated_t)`.
    #[allow(clippy::type_complexity)]
    pub fn unpack(self) -> (Vec<O>, Vec<A>, Vec<O>, Vec<f32>, Vec<i8>) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
        )
    }

    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
