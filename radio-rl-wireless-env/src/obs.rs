use radio_rl_core::{replay_buffer::ArrayBatch, Obs};

/// Observation of [`WirelessEnv`](crate::WirelessEnv).
///
/// The state vector is zero-padded to `4 * max_users`; `current_users` tells
/// how many user slots are active.
#[derive(Clone, Debug, PartialEq)]
pub struct WirelessObs {
    state: Vec<f32>,
    current_users: usize,
}

impl WirelessObs {
    pub(crate) fn new(state: Vec<f32>, current_users: usize) -> Self {
        debug_assert_eq!(state.len() % 4, 0);
        Self {
            state,
            current_users,
        }
    }

    /// Number of active users.
    pub fn current_users(&self) -> usize {
        self.current_users
    }

    /// Maximum number of users.
    pub fn max_users(&self) -> usize {
        self.state.len() / 4
    }

    /// The padded state vector.
    pub fn state(&self) -> &[f32] {
        &self.state
    }

    fn block(&self, k: usize) -> &[f32] {
        let n = self.current_users;
        &self.state[k * n..(k + 1) * n]
    }

    /// Normalized channel quality of the active users.
    pub fn channel_quality(&self) -> &[f32] {
        self.block(0)
    }

    /// Normalized QoS demand of the active users.
    pub fn qos_demand(&self) -> &[f32] {
        self.block(1)
    }

    /// Base station load, equal for all active users.
    pub fn load(&self) -> &[f32] {
        self.block(2)
    }

    /// Interference level, equal for all active users.
    pub fn interference(&self) -> &[f32] {
        self.block(3)
    }
}

impl Obs for WirelessObs {
    fn len(&self) -> usize {
        self.state.len()
    }
}

impl AsRef<[f32]> for WirelessObs {
    fn as_ref(&self) -> &[f32] {
        &self.state
    }
}

impl From<WirelessObs> for ArrayBatch {
    fn from(obs: WirelessObs) -> Self {
        ArrayBatch::from_row(obs.state)
    }
}
