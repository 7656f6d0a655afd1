//! Exploration noise of DDPG.
use anyhow::Result;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Adds `N(0, scale^2)` noise to each action dimension and clips to `[low, high]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianNoise {
    low: f32,
    high: f32,
}

impl Default for GaussianNoise {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

impl GaussianNoise {
    /// Constructs the explorer for actions bounded in `[low, high]`.
    pub fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    /// Perturbs `act` in place. `scale == 0` only clips.
    pub fn action(&self, act: &mut [f32], scale: f32, rng: &mut impl Rng) -> Result<()> {
        if scale > 0.0 {
            let normal = Normal::new(0.0f32, scale)?;
            for a in act.iter_mut() {
                *a += normal.sample(rng);
            }
        }
        for a in act.iter_mut() {
            *a = a.clamp(self.low, self.high);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_noise_is_clipped() -> Result<()> {
        let explorer = GaussianNoise::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut act = vec![0.0f32, 0.5, 1.0, 0.99, 0.01];
        explorer.action(&mut act, 10.0, &mut rng)?;
        assert!(act.iter().all(|a| (0.0..=1.0).contains(a)));
        Ok(())
    }

    #[test]
    fn test_zero_scale_only_clips() -> Result<()> {
        let explorer = GaussianNoise::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut act = vec![-0.5f32, 0.25, 1.5];
        explorer.action(&mut act, 0.0, &mut rng)?;
        assert_eq!(act, vec![0.0, 0.25, 1.0]);
        Ok(())
    }
}
