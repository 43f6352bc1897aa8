use rand::{rngs::StdRng, seq::SliceRandom, Rng};

use crate::{discretize::DiscreteState, ds::QTable, gym::Action};

/// Inference-only player for a learned [`QTable`]
///
/// Always exploits, breaking ties uniformly at random. In states the table has no
/// entries for it jumps, which keeps an unexplored bird in the air instead of letting
/// it fall.
#[derive(Debug, Clone)]
pub struct GreedyAgent<R = StdRng> {
    q_table: QTable,
    rng: R,
}

impl<R: Rng> GreedyAgent<R> {
    pub fn new(q_table: QTable, rng: R) -> Self {
        Self { q_table, rng }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn choose_action(&mut self, state: DiscreteState) -> Action {
        if !self.q_table.contains_state(state) {
            return Action::Jump;
        }
        self.q_table
            .best_actions(state)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Action::Jump)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    const S: DiscreteState = DiscreteState(9, 9, 9);

    fn player(entries: &[(Action, f32)]) -> GreedyAgent {
        let table = entries.iter().map(|&(a, v)| ((S, a), v)).collect();
        GreedyAgent::new(table, StdRng::seed_from_u64(5))
    }

    #[test]
    fn unseen_state_jumps() {
        let mut agent = player(&[]);
        for _ in 0..100 {
            assert_eq!(agent.choose_action(S), Action::Jump, "bootstrap bias");
        }
    }

    #[test]
    fn single_entry_counts_as_seen() {
        let mut agent = player(&[(Action::Jump, -1.0)]);
        for _ in 0..100 {
            assert_eq!(
                agent.choose_action(S),
                Action::Idle,
                "unseen idle reads 0.0 and beats a negative jump"
            );
        }
    }

    #[test]
    fn picks_greedy_action() {
        let mut agent = player(&[(Action::Idle, 3.0), (Action::Jump, 2.0)]);
        for _ in 0..100 {
            assert_eq!(agent.choose_action(S), Action::Idle);
        }
    }

    #[test]
    fn ties_are_random() {
        let mut agent = player(&[(Action::Idle, 1.0), (Action::Jump, 1.0)]);
        let jumps = (0..1000)
            .filter(|_| agent.choose_action(S) == Action::Jump)
            .count();
        assert!((350..650).contains(&jumps), "ties split evenly, got {jumps} jumps");
    }
}
