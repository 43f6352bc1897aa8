use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    algo::{QTableAgent, QTableAgentConfig},
    decay,
    discretize::Discretizer,
    ds::{QTable, RingBuffer},
    env::{Environment, Transition},
    exploration::EpsilonGreedy,
    gym::{FlappyBird, FlappyConfig, Observation, Rewards},
    persist::{Snapshot, TableMetadata},
    util::{check_interval, mean},
    Error, Result,
};

/// Hyperparameters and run settings for [`Trainer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub learning_rate: f32,
    pub discount_factor: f32,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    /// Factor epsilon is multiplied by after every episode
    pub epsilon_decay: f32,
    pub episodes: u32,
    /// Number of episodes between progress reports, also the moving average window
    pub report_interval: u32,
    /// End an episode after this many ticks even if the bird is still alive
    pub max_episode_steps: Option<u32>,
    /// Seed for all randomness; drawn at random when absent
    pub seed: Option<u64>,
    pub game: FlappyConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.9995,
            episodes: 10_000,
            report_interval: 100,
            max_episode_steps: None,
            seed: None,
            game: FlappyConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        check_interval("learning_rate", self.learning_rate, 0.0, 1.0)?;
        check_interval("discount_factor", self.discount_factor, 0.0, 1.0)?;
        check_interval("epsilon_start", self.epsilon_start, 0.0, 1.0)?;
        check_interval("epsilon_min", self.epsilon_min, 0.0, self.epsilon_start)?;
        if self.report_interval == 0 {
            return Err(Error::config("`report_interval` must be nonzero"));
        }
        if self.max_episode_steps == Some(0) {
            return Err(Error::config("`max_episode_steps` must be nonzero"));
        }
        self.game.validate()
    }

    fn agent_config(&self) -> Result<QTableAgentConfig> {
        let schedule =
            decay::Geometric::new(self.epsilon_decay, self.epsilon_start, self.epsilon_min)?;
        Ok(QTableAgentConfig {
            exploration: EpsilonGreedy::new(schedule),
            alpha: self.learning_rate,
            gamma: self.discount_factor,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: "read",
            path: path.into(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| Error::Io {
            operation: "write",
            path: path.into(),
            source,
        })
    }
}

/// A stop request observed between ticks
pub trait Interrupt {
    fn requested(&self) -> bool;
}

impl Interrupt for AtomicBool {
    fn requested(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// An [`Interrupt`] that never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Interrupt for Never {
    fn requested(&self) -> bool {
        false
    }
}

/// Statistics of one completed training episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Total completed episodes, including this one
    pub episode: u32,
    pub score: u32,
    pub steps: u32,
    pub reward: f64,
    /// Exploration rate after decaying at the end of the episode
    pub epsilon: f32,
}

/// Everything recorded by [`Trainer::train`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeSummary>,
    /// `(episode, mean score over the preceding window)` at every report
    pub averages: Vec<(u32, f64)>,
    pub interrupted: bool,
}

impl TrainingReport {
    /// Write one CSV row per episode
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for summary in &self.episodes {
            wtr.serialize(summary)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// The reward the agent learns from for one step
///
/// A tick on which the episode score rose earns the pipe reward in place of the
/// survival reward; the crash penalty of a terminal tick is kept.
pub fn shaped_reward(
    transition: &Transition<Observation>,
    prev_score: u32,
    rewards: &Rewards,
) -> f32 {
    if transition.score > prev_score && !transition.terminal {
        rewards.pipe_passed
    } else {
        transition.reward
    }
}

/// Runs Q-learning episodes of [`FlappyBird`]
pub struct Trainer {
    config: TrainConfig,
    env: FlappyBird,
    agent: QTableAgent,
    discretizer: Discretizer,
    scores: RingBuffer<u32>,
    best_score: u32,
}

impl Trainer {
    /// Start training from an empty table
    pub fn new(config: TrainConfig) -> Result<Self> {
        Self::resume(config, Snapshot::default())
    }

    /// Continue training from a snapshot, restoring its values and exploration schedule
    pub fn resume(config: TrainConfig, snapshot: Snapshot) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("training with seed {seed}");

        let env = FlappyBird::new(config.game.clone(), StdRng::seed_from_u64(seed))?;
        let table_is_empty = snapshot.q_table.is_empty();
        let agent = QTableAgent::new(
            config.agent_config()?,
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
        .with_q_table(snapshot.q_table)
        .with_episode(snapshot.metadata.episodes_trained);
        if !table_is_empty && snapshot.metadata.game != config.game {
            log::warn!("resuming a table trained on a different game configuration");
        }
        let discretizer = Discretizer::for_game(&config.game)?;

        Ok(Self {
            scores: RingBuffer::new(config.report_interval as usize),
            best_score: snapshot.metadata.best_score,
            config,
            env,
            agent,
            discretizer,
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn agent(&self) -> &QTableAgent {
        &self.agent
    }

    pub fn q_table(&self) -> &QTable {
        self.agent.q_table()
    }

    pub fn metadata(&self) -> TableMetadata {
        TableMetadata {
            episodes_trained: self.agent.episode(),
            best_score: self.best_score,
            epsilon: self.agent.epsilon(),
            game: self.config.game.clone(),
        }
    }

    pub fn into_snapshot(self) -> Snapshot {
        let metadata = self.metadata();
        Snapshot {
            q_table: self.agent.into_q_table(),
            metadata,
        }
    }

    /// Play one episode, learning from every step
    ///
    /// **Returns** `None` if `interrupt` fired before the episode ended; the partial
    /// episode is not counted and exploration is not decayed.
    pub fn run_episode<I: Interrupt + ?Sized>(&mut self, interrupt: &I) -> Option<EpisodeSummary> {
        let rewards = self.config.game.rewards;
        let mut state = self.discretizer.discretize(self.env.reset());
        let mut episode_score = 0;
        let mut steps = 0;

        loop {
            if interrupt.requested() {
                self.env.report.take();
                return None;
            }

            let action = self.agent.choose_action(state);
            let transition = self.env.step(action);
            let next_state = self.discretizer.discretize(transition.observation);
            let reward = shaped_reward(&transition, episode_score, &rewards);
            episode_score = transition.score;

            self.agent.learn(state, action, reward, next_state);
            state = next_state;
            steps += 1;

            let capped = self.config.max_episode_steps.is_some_and(|max| steps >= max);
            if transition.terminal || capped {
                break;
            }
        }

        self.agent.decay_exploration();
        let report = self.env.report.take();
        Some(EpisodeSummary {
            episode: self.agent.episode(),
            score: episode_score,
            steps: report["steps"] as u32,
            reward: report["reward"],
            epsilon: self.agent.epsilon(),
        })
    }

    /// Run the configured number of episodes, logging a moving average of scores
    pub fn train<I: Interrupt + ?Sized>(&mut self, interrupt: &I) -> TrainingReport {
        let mut report = TrainingReport::default();
        let interval = self.config.report_interval;

        for _ in 0..self.config.episodes {
            let Some(summary) = self.run_episode(interrupt) else {
                log::info!("training interrupted after {} episodes", report.episodes.len());
                report.interrupted = true;
                break;
            };

            self.scores.push(summary.score);
            self.best_score = self.best_score.max(summary.score);
            log::debug!(
                "episode {}: score {}, steps {}, reward {:.1}",
                summary.episode,
                summary.score,
                summary.steps,
                summary.reward
            );

            if summary.episode % interval == 0 {
                let average = mean(self.scores.view());
                log::info!(
                    "Episode {}, Average Score (last {}): {:.2}, Best: {}, Epsilon: {:.4}",
                    summary.episode,
                    self.scores.len(),
                    average,
                    self.best_score,
                    summary.epsilon
                );
                report.averages.push((summary.episode, average));
            }

            report.episodes.push(summary);
        }

        report
    }
}
