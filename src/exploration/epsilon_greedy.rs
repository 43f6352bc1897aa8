use rand::Rng;

use crate::decay::Decay;

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// The exploration rate after `episode` completed episodes
    pub fn epsilon(&self, episode: u32) -> f32 {
        self.epsilon.evaluate(episode as f32)
    }

    /// Invoke epsilon greedy policy for current episode
    pub fn choose<R: Rng + ?Sized>(&self, episode: u32, rng: &mut R) -> Choice {
        if rng.gen::<f32>() < self.epsilon(episode) {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::decay::{Constant, Geometric};

    use super::*;

    #[test]
    fn extremes_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(0);
        let always = EpsilonGreedy::new(Constant::new(1.0));
        let never = EpsilonGreedy::new(Constant::new(0.0));
        for _ in 0..1000 {
            assert!(matches!(always.choose(0, &mut rng), Choice::Explore));
            assert!(matches!(never.choose(0, &mut rng), Choice::Exploit));
        }
    }

    #[test]
    fn epsilon_follows_decay() {
        let policy = EpsilonGreedy::new(Geometric::new(0.5, 1.0, 0.1).unwrap());
        assert_eq!(policy.epsilon(0), 1.0);
        assert_eq!(policy.epsilon(1), 0.5);
        assert_eq!(policy.epsilon(10), 0.1, "clamped at floor");
    }
}
