//! Simple generic replay buffer.
use super::{SimpleReplayBufferConfig, TransitionBatch};
use crate::{error::RlError, ExperienceBufferBase, ReplayBufferBase, Transition};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A replay buffer with a fixed capacity.
///
/// Transitions are kept in a ring buffer: once `capacity` transitions are stored,
/// each push overwrites the oldest one. Batches are sampled uniformly at random,
/// with replacement.
pub struct SimpleReplayBuffer<O, A> {
    capacity: usize,
    // next write position
    i: usize,
    data: Vec<Transition<O, A>>,
    rng: StdRng,
}

impl<O, A> SimpleReplayBuffer<O, A> {
    /// Returns the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns an iterator over the stored transitions, from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<O, A>> {
        // before the buffer is full, `i` is the length and the data is already in order
        let start = if self.data.len() < self.capacity { 0 } else { self.i };
        let (newer, older) = self.data.split_at(start);
        older.iter().chain(newer.iter())
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A> {
    type Item = Transition<O, A>;

    fn len(&self) -> usize {
        self.data.len()
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        if self.data.len() < self.capacity {
            self.data.push(tr);
        } else {
            self.data[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;
        Ok(())
    }
}

impl<O: Clone, A: Clone> ReplayBufferBase for SimpleReplayBuffer<O, A> {
    type Config = SimpleReplayBufferConfig;
    type Batch = TransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            capacity: config.capacity,
            i: 0,
            data: Vec::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.data.is_empty() {
            return Err(RlError::EmptyBuffer.into());
        }
        if size == 0 {
            return Err(RlError::invalid_config("batch size", "must be positive").into());
        }

        let mut batch = TransitionBatch::with_capacity(size);
        for _ in 0..size {
            let tr = &self.data[self.rng.gen_range(0..self.data.len())];
            batch.obs.push(tr.obs.clone());
            batch.act.push(tr.act.clone());
            batch.next_obs.push(tr.next_obs.clone());
            batch.reward.push(tr.reward);
            batch.is_terminated.push(tr.is_terminated as i8);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(i: usize) -> Transition<f32, usize> {
        Transition {
            obs: i as f32,
            act: i % 2,
            reward: i as f32,
            next_obs: (i + 1) as f32,
            is_terminated: false,
            is_truncated: false,
        }
    }

    fn buffer(capacity: usize) -> SimpleReplayBuffer<f32, usize> {
        let config = SimpleReplayBufferConfig::default().capacity(capacity);
        SimpleReplayBuffer::build(&config).unwrap()
    }

    #[test]
    fn test_eviction_keeps_most_recent_in_order() -> Result<()> {
        let (capacity, k) = (5, 3);
        let mut buffer = buffer(capacity);
        for i in 0..capacity + k {
            buffer.push(transition(i))?;
        }
        assert_eq!(buffer.len(), capacity);
        let rewards = buffer.iter().map(|tr| tr.reward).collect::<Vec<_>>();
        assert_eq!(rewards, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        Ok(())
    }

    #[test]
    fn test_iter_before_full() -> Result<()> {
        let mut buffer = buffer(4);
        for i in 0..3 {
            buffer.push(transition(i))?;
        }
        let rewards = buffer.iter().map(|tr| tr.reward).collect::<Vec<_>>();
        assert_eq!(rewards, vec![0.0, 1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_len_never_exceeds_capacity() -> Result<()> {
        let mut buffer = buffer(3);
        for i in 0..10 {
            buffer.push(transition(i))?;
            assert!(buffer.len() <= 3);
        }
        Ok(())
    }

    #[test]
    fn test_batch() -> Result<()> {
        let mut buffer = buffer(8);
        assert!(buffer.batch(2).is_err());
        for i in 0..8 {
            buffer.push(transition(i))?;
        }
        let batch = buffer.batch(16)?;
        assert_eq!(batch.len(), 16);
        for (o, r) in batch.obs.iter().zip(batch.reward.iter()) {
            assert_eq!(o, r);
        }
        Ok(())
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let config = SimpleReplayBufferConfig::default().capacity(0);
        assert!(SimpleReplayBuffer::<f32, usize>::build(&config).is_err());
    }
}
