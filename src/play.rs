use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    algo::GreedyAgent,
    discretize::Discretizer,
    env::Environment,
    gym::{Canvas, FlappyBird},
    persist::Snapshot,
    util::mean,
    Result,
};

/// Scores of a batch of greedy episodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub scores: Vec<u32>,
    /// Episodes stopped by the step cap while the bird was still alive
    pub truncated: usize,
}

impl Evaluation {
    pub fn mean(&self) -> f64 {
        mean(&self.scores)
    }

    pub fn best(&self) -> u32 {
        self.scores.iter().copied().max().unwrap_or(0)
    }
}

/// Play one episode without learning
///
/// Every frame, including the first and the last, is pushed to `canvas` when given.
/// **Returns** the final score and whether the bird was still alive at `max_steps`.
pub fn play_episode<R: Rng, P: Rng>(
    env: &mut FlappyBird<R>,
    agent: &mut GreedyAgent<P>,
    discretizer: &Discretizer,
    max_steps: Option<u32>,
    mut canvas: Option<&mut dyn Canvas>,
) -> (u32, bool) {
    let mut observation = env.reset();
    let mut steps = 0;

    loop {
        if let Some(canvas) = canvas.as_deref_mut() {
            env.render(canvas);
        }
        if !env.is_active() {
            return (env.score(), false);
        }
        if max_steps.is_some_and(|max| steps >= max) {
            return (env.score(), true);
        }

        let action = agent.choose_action(discretizer.discretize(observation));
        observation = env.step(action).observation;
        steps += 1;
    }
}

/// Play `episodes` greedy episodes back to back
pub fn evaluate<R: Rng, P: Rng>(
    env: &mut FlappyBird<R>,
    agent: &mut GreedyAgent<P>,
    discretizer: &Discretizer,
    episodes: u32,
    max_steps: Option<u32>,
) -> Evaluation {
    let mut evaluation = Evaluation::default();
    for episode in 1..=episodes {
        let (score, truncated) = play_episode(env, agent, discretizer, max_steps, None);
        let note = if truncated { " (truncated)" } else { "" };
        log::info!("episode {episode}: score {score}{note}");
        evaluation.scores.push(score);
        evaluation.truncated += truncated as usize;
        env.report.take();
    }
    evaluation
}

/// Evaluate a saved table on the game it was trained on
///
/// The game and the state bins are rebuilt from the snapshot metadata, so lookups use
/// the same discretization as training.
pub fn evaluate_snapshot(
    snapshot: Snapshot,
    seed: u64,
    episodes: u32,
    max_steps: Option<u32>,
) -> Result<Evaluation> {
    let game = snapshot.metadata.game;
    let discretizer = Discretizer::for_game(&game)?;
    let mut env = FlappyBird::new(game, StdRng::seed_from_u64(seed))?;
    let mut agent = GreedyAgent::new(snapshot.q_table, StdRng::seed_from_u64(seed.wrapping_add(1)));
    Ok(evaluate(&mut env, &mut agent, &discretizer, episodes, max_steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        discretize::DiscreteState,
        ds::QTable,
        gym::{Action, FlappyConfig, Rect, Sprite},
        persist::TableMetadata,
    };

    fn env(config: FlappyConfig) -> FlappyBird {
        FlappyBird::seeded(config, 3).unwrap()
    }

    fn agent(q_table: QTable) -> GreedyAgent {
        GreedyAgent::new(q_table, StdRng::seed_from_u64(4))
    }

    #[test]
    fn empty_table_jumps_out_the_top() {
        let mut env = env(FlappyConfig::default());
        let mut agent = agent(QTable::new());
        let discretizer = Discretizer::default();
        let (score, truncated) = play_episode(&mut env, &mut agent, &discretizer, None, None);

        assert_eq!(score, 0);
        assert!(!truncated);
        assert!(env.bird().y < 0.0, "constant jumping leaves through the top");
    }

    #[test]
    fn step_cap_truncates() {
        let config = FlappyConfig {
            gravity: 0.0,
            jump_velocity: 0.0,
            ..Default::default()
        };
        let mut env = env(config);
        let mut agent = agent(QTable::new());
        let evaluation = evaluate(&mut env, &mut agent, &Discretizer::default(), 3, Some(10));

        assert_eq!(evaluation.scores, [0, 0, 0]);
        assert_eq!(evaluation.truncated, 3, "floating bird outlives the cap");
        assert_eq!(evaluation.mean(), 0.0);
        assert_eq!(evaluation.best(), 0);
    }

    #[test]
    fn learned_idle_falls_to_ground() {
        let discretizer = Discretizer::default();
        let mut q_table = QTable::new();
        for v in 0..=20 {
            for h in 0..=10 {
                for vel in 0..=10 {
                    q_table.set(DiscreteState(v, h, vel), Action::Idle, 1.0);
                }
            }
        }
        let mut env = env(FlappyConfig::default());
        let mut agent = agent(q_table);
        let (score, truncated) =
            play_episode(&mut env, &mut agent, &discretizer, Some(1000), None);

        assert_eq!(score, 0);
        assert!(!truncated);
        assert!(env.bird().y > 300.0, "bird fell onto the ground");
    }

    #[test]
    fn renders_every_frame() {
        #[derive(Default)]
        struct Frames(u32);
        impl Canvas for Frames {
            fn clear(&mut self) {}
            fn fill_rect(&mut self, _rect: Rect, _sprite: Sprite) {}
            fn draw_score(&mut self, _score: u32) {}
            fn present(&mut self) {
                self.0 += 1;
            }
        }

        let config = FlappyConfig {
            gravity: 0.0,
            jump_velocity: 0.0,
            ..Default::default()
        };
        let mut env = env(config);
        let mut agent = agent(QTable::new());
        let mut frames = Frames::default();
        let canvas: &mut dyn Canvas = &mut frames;
        play_episode(&mut env, &mut agent, &Discretizer::default(), Some(7), Some(canvas));
        assert_eq!(frames.0, 8, "initial frame plus one per tick");
    }

    #[test]
    fn snapshot_game_is_played() {
        let snapshot = Snapshot {
            q_table: QTable::new(),
            metadata: TableMetadata {
                game: FlappyConfig {
                    gravity: 0.0,
                    jump_velocity: 0.0,
                    ..Default::default()
                },
                ..Default::default()
            },
        };
        let evaluation = evaluate_snapshot(snapshot, 9, 2, Some(100)).unwrap();
        assert_eq!(
            evaluation.truncated, 2,
            "bird floats under the stored physics instead of jumping out the top"
        );

        let evaluation = evaluate_snapshot(Snapshot::default(), 9, 2, Some(100)).unwrap();
        assert_eq!(evaluation.truncated, 0, "default physics");
    }
}
