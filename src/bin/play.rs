use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use flappy_rl::{
    persist::{self, Loaded, Snapshot},
    play,
};

/// Watch a learned Q-table play flappy bird, headless
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "q_table.json")]
    table: PathBuf,

    #[arg(short, long, default_value_t = 10)]
    episodes: u32,

    /// Stop an episode after this many ticks
    #[arg(long, default_value_t = 100_000)]
    max_steps: u32,

    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let snapshot = match persist::load_or_empty(&args.table) {
        Loaded::Found(snapshot) => {
            log::info!(
                "loaded {} entries trained over {} episodes",
                snapshot.q_table.len(),
                snapshot.metadata.episodes_trained
            );
            snapshot
        }
        Loaded::Missing => {
            log::warn!("no table at {}, playing untrained", args.table.display());
            Snapshot::default()
        }
        Loaded::Unreadable(e) => {
            log::warn!("ignoring unreadable table: {e}");
            Snapshot::default()
        }
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let evaluation = play::evaluate_snapshot(snapshot, seed, args.episodes, Some(args.max_steps))
        .context("building the game")?;
    log::info!(
        "mean score {:.2}, best {}, {} of {} episodes hit the step cap",
        evaluation.mean(),
        evaluation.best(),
        evaluation.truncated,
        evaluation.scores.len()
    );

    Ok(())
}
