use rand::{rngs::StdRng, seq::SliceRandom, Rng};
use strum::VariantArray;

use crate::{
    assert_interval,
    decay::{self, Decay},
    discretize::DiscreteState,
    ds::QTable,
    exploration::{Choice, EpsilonGreedy},
    gym::Action,
};

/// Configuration for the [`QTableAgent`]
#[derive(Debug, Clone)]
pub struct QTableAgentConfig<D = decay::Geometric> {
    pub exploration: EpsilonGreedy<D>,
    /// Learning rate
    pub alpha: f32,
    /// Discount factor
    pub gamma: f32,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(
                decay::Geometric::new(0.9995, 1.0, 0.01).expect("default decay is valid"),
            ),
            alpha: 0.1,
            gamma: 0.99,
        }
    }
}

/// A Q-learning agent that stores its value estimates in a [`QTable`]
///
/// Actions are chosen epsilon-greedily; exploitation breaks ties between equally
/// valued actions uniformly at random. Epsilon is a function of the number of completed
/// episodes, advanced by [`decay_exploration`](Self::decay_exploration).
///
/// ### Generics
/// - `D` - The [`Decay`] schedule for epsilon
/// - `R` - The random source for exploration and tie-breaking
#[derive(Debug, Clone)]
pub struct QTableAgent<D = decay::Geometric, R = StdRng> {
    q_table: QTable,
    exploration: EpsilonGreedy<D>,
    alpha: f32,
    gamma: f32,
    episode: u32,
    rng: R,
}

impl<D: Decay, R: Rng> QTableAgent<D, R> {
    /// Initialize a new `QTableAgent` with an empty table
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(config: QTableAgentConfig<D>, rng: R) -> Self {
        assert_interval!(config.alpha, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);
        Self {
            q_table: QTable::new(),
            exploration: config.exploration,
            alpha: config.alpha,
            gamma: config.gamma,
            episode: 0,
            rng,
        }
    }

    /// Start from previously learned values
    pub fn with_q_table(mut self, q_table: QTable) -> Self {
        self.q_table = q_table;
        self
    }

    /// Resume the exploration schedule as if `episode` episodes had already completed
    pub fn with_episode(mut self, episode: u32) -> Self {
        self.episode = episode;
        self
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn into_q_table(self) -> QTable {
        self.q_table
    }

    /// Number of completed episodes
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon(self.episode)
    }

    pub fn choose_action(&mut self, state: DiscreteState) -> Action {
        let candidates = match self.exploration.choose(self.episode, &mut self.rng) {
            Choice::Explore => Action::VARIANTS.to_vec(),
            Choice::Exploit => self.q_table.best_actions(state),
        };
        candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Action::Idle)
    }

    /// One-step Q-learning update
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max<sub>a'</sub> Q(s',a') - Q(s,a)]
    pub fn learn(
        &mut self,
        state: DiscreteState,
        action: Action,
        reward: f32,
        next_state: DiscreteState,
    ) {
        let q_value = self.q_table.get(state, action);
        let max_next_q = self.q_table.max_value(next_state);
        let target = reward + self.gamma * max_next_q;
        let update = q_value + self.alpha * (target - q_value);
        self.q_table.set(state, action, update);
    }

    /// Advance the exploration schedule by one episode
    pub fn decay_exploration(&mut self) {
        self.episode += 1;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    const S: DiscreteState = DiscreteState(1, 2, 3);
    const T: DiscreteState = DiscreteState(4, 5, 6);

    fn agent(epsilon: f32, alpha: f32, gamma: f32) -> QTableAgent<decay::Constant> {
        QTableAgent::new(
            QTableAgentConfig {
                exploration: EpsilonGreedy::new(decay::Constant::new(epsilon)),
                alpha,
                gamma,
            },
            StdRng::seed_from_u64(42),
        )
    }

    #[test]
    fn learn_moves_toward_target() {
        let mut agent = agent(0.0, 0.5, 0.9);
        agent.learn(S, Action::Jump, 10.0, T);
        assert_eq!(agent.q_table().get(S, Action::Jump), 5.0, "halfway to target 10");
        assert_eq!(agent.q_table().len(), 1, "only the updated entry is created");

        let mut agent = agent.with_q_table(QTable::new());
        agent.q_table.set(T, Action::Idle, 4.0);
        agent.q_table.set(T, Action::Jump, 2.0);
        agent.q_table.set(S, Action::Idle, 1.0);
        agent.learn(S, Action::Idle, 1.0, T);
        let target = 1.0 + 0.9 * 4.0;
        assert_eq!(
            agent.q_table().get(S, Action::Idle),
            1.0 + 0.5 * (target - 1.0),
            "bootstraps from the best next action"
        );
    }

    #[test]
    fn learn_is_a_contraction() {
        let mut agent = agent(0.0, 0.3, 0.99);
        let cases = [(0.0, 5.0, 1.0), (20.0, -100.0, 0.0), (-3.0, 1.0, -2.0), (7.0, 0.0, 9.0)];
        for (old, reward, next_best) in cases {
            agent.q_table.set(S, Action::Jump, old);
            agent.q_table.set(T, Action::Jump, next_best);
            agent.q_table.set(T, Action::Idle, next_best);
            let target = reward + 0.99 * next_best;
            agent.learn(S, Action::Jump, reward, T);
            let new = agent.q_table().get(S, Action::Jump);
            let (lo, hi) = if old < target { (old, target) } else { (target, old) };
            assert!(
                lo < new && new < hi,
                "{new} not strictly between old {old} and target {target}"
            );
        }
    }

    #[test]
    fn exploit_picks_best_action() {
        let mut agent = agent(0.0, 0.1, 0.9);
        agent.q_table.set(S, Action::Jump, 0.5);
        for _ in 0..100 {
            assert_eq!(agent.choose_action(S), Action::Jump);
        }
        agent.q_table.set(S, Action::Idle, 0.7);
        for _ in 0..100 {
            assert_eq!(agent.choose_action(S), Action::Idle);
        }
    }

    #[test]
    fn exploit_breaks_ties_randomly() {
        let mut agent = agent(0.0, 0.1, 0.9);
        let jumps = (0..1000)
            .filter(|_| agent.choose_action(S) == Action::Jump)
            .count();
        assert!((350..650).contains(&jumps), "ties split evenly, got {jumps} jumps");
    }

    #[test]
    fn explore_ignores_values() {
        let mut agent = agent(1.0, 0.1, 0.9);
        agent.q_table.set(S, Action::Jump, 100.0);
        let idles = (0..1000)
            .filter(|_| agent.choose_action(S) == Action::Idle)
            .count();
        assert!((350..650).contains(&idles), "uniform exploration, got {idles} idles");
    }

    #[test]
    fn exploration_decays_to_floor() {
        let config = QTableAgentConfig {
            exploration: EpsilonGreedy::new(decay::Geometric::new(0.9, 1.0, 0.05).unwrap()),
            ..Default::default()
        };
        let mut agent = QTableAgent::new(config, StdRng::seed_from_u64(0));
        assert_eq!(agent.epsilon(), 1.0);
        let mut prev = agent.epsilon();
        for _ in 0..200 {
            agent.decay_exploration();
            assert!(agent.epsilon() <= prev, "epsilon never increases");
            assert!(agent.epsilon() >= 0.05, "epsilon never drops below the floor");
            prev = agent.epsilon();
        }
        assert_eq!(agent.epsilon(), 0.05, "floor reached");
        assert_eq!(agent.episode(), 200);
    }

    #[test]
    fn resume_restores_schedule() {
        let config = QTableAgentConfig::default();
        let agent = QTableAgent::new(config, StdRng::seed_from_u64(0)).with_episode(2);
        assert!((agent.epsilon() - 0.9995f32.powi(2)).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "Invalid value for `config.alpha`")]
    fn rejects_bad_alpha() {
        agent(0.1, 1.5, 0.9);
    }
}
