//! Transition batches.
use crate::TransitionBatch;

/// Columnar storage of observations or actions.
pub trait BatchBase {
    /// Creates a store for `capacity` rows.
    fn new(capacity: usize) -> Self;

    /// Writes the rows of `data` starting at row `ix`, wrapping around at the
    /// capacity.
    fn push(&mut self, ix: usize, data: Self);

    /// Gathers the rows at the given indices.
    fn sample(&self, ixs: &[usize]) -> Self;
}

/// A batch of transitions `(o_t, a_t, r_t, o_t+1)`.
pub struct GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Observations.
    pub obs: O,

    /// Actions.
    pub act: A,

    /// Next observations.
    pub next_obs: O,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Indices of sampled transitions in the replay buffer.
    pub ix_sample: Option<Vec<usize>>,
}

impl<O, A> TransitionBatch for GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type ObsBatch = O;
    type ActBatch = A;

    fn unpack(self) -> (Self::ObsBatch, Self::ActBatch, Self::ObsBatch, Vec<f32>) {
        (self.obs, self.act, self.next_obs, self.reward)
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Self::ObsBatch {
        &self.obs
    }

    fn act(&self) -> &Self::ActBatch {
        &self.act
    }
}

impl<O, A> GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Creates an empty batch with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: Vec::with_capacity(capacity),
            ix_sample: None,
        }
    }
}
