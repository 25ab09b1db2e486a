//! TD targets of the tabular agents.

/// TD target of SARSA.
///
/// `q_next` holds the action values of the next state and `next_act` is the action
/// chosen there by the behavior policy. Returns `reward` if the next state is terminal.
pub fn sarsa_target(
    reward: f32,
    discount_factor: f32,
    q_next: &[f32],
    next_act: usize,
    is_terminated: bool,
) -> f32 {
    if is_terminated {
        reward
    } else {
        reward + discount_factor * q_next[next_act]
    }
}

/// TD target of Q-learning.
///
/// Bootstraps from the largest action value of the next state.
/// Returns `reward` if the next state is terminal.
pub fn q_learning_target(
    reward: f32,
    discount_factor: f32,
    q_next: &[f32],
    is_terminated: bool,
) -> f32 {
    if is_terminated {
        reward
    } else {
        let max = q_next.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        reward + discount_factor * max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_differ_only_for_non_greedy_next_action() {
        let q_next = [0.5, 2.0, 1.0];
        let (r, gamma) = (1.0, 0.9);
        let qt = q_learning_target(r, gamma, &q_next, false);
        assert_eq!(qt, 1.0 + 0.9 * 2.0);

        // greedy next action
        assert_eq!(sarsa_target(r, gamma, &q_next, 1, false), qt);

        // exploratory next actions
        for a in [0, 2] {
            let st = sarsa_target(r, gamma, &q_next, a, false);
            assert_ne!(st, qt);
            assert_eq!(st, 1.0 + 0.9 * q_next[a]);
        }
    }

    #[test]
    fn test_terminal_targets_are_reward() {
        let q_next = [3.0, -1.0];
        assert_eq!(sarsa_target(-1.0, 0.99, &q_next, 1, true), -1.0);
        assert_eq!(q_learning_target(-1.0, 0.99, &q_next, true), -1.0);
    }
}
