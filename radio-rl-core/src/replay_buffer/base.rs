use super::{BatchBase, GenericTransitionBatch, ReplayBufferConfig};
use crate::{error::RadioRlError, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A fixed-capacity ring of transitions.
pub struct ReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,

    /// Row written by the next push.
    i: usize,

    size: usize,
    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    rng: StdRng,
}

impl<O, A> ReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    #[inline]
    fn push_reward(&mut self, i: usize, b: &[f32]) {
        let mut j = i;
        for r in b.iter() {
            self.reward[j] = *r;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    fn sample_reward(&self, ixs: &[usize]) -> Vec<f32> {
        ixs.iter().map(|ix| self.reward[*ix]).collect()
    }

    /// Maximum number of stored transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<O, A> ExperienceBufferBase for ReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Item = GenericTransitionBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len();
        let (obs, act, next_obs, reward) = tr.unpack();
        self.obs.push(self.i, obs);
        self.act.push(self.i, act);
        self.next_obs.push(self.i, next_obs);
        self.push_reward(self.i, &reward);

        self.i = (self.i + len) % self.capacity;
        self.size = (self.size + len).min(self.capacity);

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for ReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Config = ReplayBufferConfig;
    type Batch = GenericTransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Result<Self> {
        config.validate()?;
        let capacity = config.capacity;

        Ok(Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if size > self.size {
            return Err(RadioRlError::InsufficientSamples {
                required: size,
                available: self.size,
            }
            .into());
        }
        let ixs = index::sample(&mut self.rng, self.size, size).into_vec();

        Ok(Self::Batch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: self.sample_reward(&ixs),
            ix_sample: Some(ixs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay_buffer::ArrayBatch;
    use std::collections::HashSet;

    type Buffer = ReplayBuffer<ArrayBatch, ArrayBatch>;

    fn transition(v: f32) -> GenericTransitionBatch<ArrayBatch, ArrayBatch> {
        GenericTransitionBatch {
            obs: ArrayBatch::from_row(vec![v, v]),
            act: ArrayBatch::from_row(vec![v]),
            next_obs: ArrayBatch::from_row(vec![v + 1.0, v + 1.0]),
            reward: vec![v],
            ix_sample: None,
        }
    }

    #[test]
    fn test_ring_overwrites_oldest() -> Result<()> {
        let capacity = 5;
        let mut buffer = Buffer::build(&ReplayBufferConfig::default().capacity(capacity))?;
        for v in 0..=capacity {
            buffer.push(transition(v as f32))?;
        }
        assert_eq!(buffer.len(), capacity);

        // sampling the whole buffer without replacement returns every stored row once
        let batch = buffer.batch(capacity)?;
        let rewards: HashSet<i32> = batch.reward.iter().map(|r| *r as i32).collect();
        let expected: HashSet<i32> = (1..=capacity as i32).collect();
        assert_eq!(rewards, expected);

        for (k, r) in batch.reward.iter().enumerate() {
            assert_eq!(batch.obs.row(k), &[*r, *r]);
            assert_eq!(batch.next_obs.row(k), &[*r + 1.0, *r + 1.0]);
        }
        Ok(())
    }

    #[test]
    fn test_batch_without_replacement() -> Result<()> {
        let mut buffer = Buffer::build(&ReplayBufferConfig::default().capacity(100))?;
        for v in 0..50 {
            buffer.push(transition(v as f32))?;
        }
        for _ in 0..10 {
            let batch = buffer.batch(32)?;
            let ixs: HashSet<usize> = batch.ix_sample.unwrap().into_iter().collect();
            assert_eq!(ixs.len(), 32);
            assert!(ixs.iter().all(|&ix| ix < 50));
        }
        Ok(())
    }

    #[test]
    fn test_insufficient_samples() -> Result<()> {
        let mut buffer = Buffer::build(&ReplayBufferConfig::default().capacity(10))?;
        buffer.push(transition(0.0))?;
        let err = buffer.batch(2).err().unwrap();
        assert_eq!(
            err.downcast_ref::<RadioRlError>(),
            Some(&RadioRlError::InsufficientSamples {
                required: 2,
                available: 1
            })
        );
        Ok(())
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() -> Result<()> {
        let config = ReplayBufferConfig::default().capacity(20).seed(3);
        let mut b1 = Buffer::build(&config)?;
        let mut b2 = Buffer::build(&config)?;
        for v in 0..20 {
            b1.push(transition(v as f32))?;
            b2.push(transition(v as f32))?;
        }
        assert_eq!(b1.batch(8)?.ix_sample, b2.batch(8)?.ix_sample);
        Ok(())
    }
}
