use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Context;
use clap::Parser;
use flappy_rl::{
    persist::{self, Loaded, Snapshot},
    train::{TrainConfig, Trainer},
};

/// Train a Q-table to play flappy bird
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with training and game settings; flags below take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where the learned table is loaded from and saved to
    #[arg(short, long, default_value = "q_table.json")]
    table: PathBuf,

    /// Continue from the table at `--table` if it exists
    #[arg(short, long)]
    resume: bool,

    #[arg(short, long)]
    episodes: Option<u32>,

    #[arg(long)]
    learning_rate: Option<f32>,

    #[arg(long)]
    discount_factor: Option<f32>,

    #[arg(long)]
    epsilon_start: Option<f32>,

    #[arg(long)]
    epsilon_min: Option<f32>,

    #[arg(long)]
    epsilon_decay: Option<f32>,

    #[arg(long)]
    report_interval: Option<u32>,

    #[arg(long)]
    max_episode_steps: Option<u32>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Write per-episode statistics to this CSV file
    #[arg(long)]
    scores_csv: Option<PathBuf>,

    /// Write the effective configuration to this file and continue
    #[arg(long)]
    save_config: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> anyhow::Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => TrainConfig::default(),
        };

        if let Some(episodes) = self.episodes {
            config.episodes = episodes;
        }
        if let Some(alpha) = self.learning_rate {
            config.learning_rate = alpha;
        }
        if let Some(gamma) = self.discount_factor {
            config.discount_factor = gamma;
        }
        if let Some(epsilon) = self.epsilon_start {
            config.epsilon_start = epsilon;
        }
        if let Some(epsilon) = self.epsilon_min {
            config.epsilon_min = epsilon;
        }
        if let Some(decay) = self.epsilon_decay {
            config.epsilon_decay = decay;
        }
        if let Some(interval) = self.report_interval {
            config.report_interval = interval;
        }
        if self.max_episode_steps.is_some() {
            config.max_episode_steps = self.max_episode_steps;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.config()?;
    config.validate().context("invalid training configuration")?;

    if let Some(path) = &args.save_config {
        config
            .save(path)
            .with_context(|| format!("saving config to {}", path.display()))?;
    }

    let snapshot = if args.resume {
        match persist::load_or_empty(&args.table) {
            Loaded::Found(snapshot) => {
                log::info!(
                    "resuming from {} ({} entries, {} episodes trained)",
                    args.table.display(),
                    snapshot.q_table.len(),
                    snapshot.metadata.episodes_trained
                );
                snapshot
            }
            Loaded::Missing => {
                log::info!("no table at {}, starting fresh", args.table.display());
                Snapshot::default()
            }
            Loaded::Unreadable(e) => {
                log::warn!("ignoring unreadable table: {e}");
                Snapshot::default()
            }
        }
    } else {
        Snapshot::default()
    };

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        log::info!("stop requested, saving after the current tick");
        handler_stop.store(true, Ordering::Relaxed);
    })
    .context("installing the Ctrl-C handler")?;

    let mut trainer = Trainer::resume(config, snapshot)?;
    let report = trainer.train(&*stop);

    if let Some(path) = &args.scores_csv {
        report
            .write_csv(path)
            .with_context(|| format!("writing scores to {}", path.display()))?;
    }

    let snapshot = trainer.into_snapshot();
    persist::save(&args.table, &snapshot.q_table, &snapshot.metadata)
        .with_context(|| format!("saving table to {}", args.table.display()))?;
    log::info!(
        "saved {} entries to {} after {} episodes, best score {}",
        snapshot.q_table.len(),
        args.table.display(),
        snapshot.metadata.episodes_trained,
        snapshot.metadata.best_score
    );

    Ok(())
}
