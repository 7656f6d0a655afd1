use radio_rl_core::{replay_buffer::ArrayBatch, Act};

/// Action of [`WirelessEnv`](crate::WirelessEnv).
///
/// Of length `2 * max_users`: resource-block shares in the first half and
/// normalized power levels in the second half. Only the first
/// `current_users` entries of each half are used.
#[derive(Clone, Debug, PartialEq)]
pub struct WirelessAct(pub Vec<f32>);

impl WirelessAct {
    /// An all-zero action for `max_users` users.
    pub fn zeros(max_users: usize) -> Self {
        Self(vec![0.0; 2 * max_users])
    }

    /// Resource-block shares of the first `n` users.
    pub fn rb(&self, n: usize) -> &[f32] {
        &self.0[..n]
    }

    /// Power levels of the first `n` users.
    pub fn power(&self, n: usize) -> &[f32] {
        let max_users = self.0.len() / 2;
        &self.0[max_users..max_users + n]
    }
}

impl Act for WirelessAct {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<f32>> for WirelessAct {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

impl From<WirelessAct> for ArrayBatch {
    fn from(act: WirelessAct) -> Self {
        ArrayBatch::from_row(act.0)
    }
}
