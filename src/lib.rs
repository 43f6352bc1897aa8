//! A flappy bird simulation and a tabular Q-learning agent that learns to play it

/// Learning and playing agents
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Mapping continuous observations to table keys
pub mod discretize;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

mod error;

/// Exploration policies
pub mod exploration;

/// Game environments
pub mod gym;

/// Q-table snapshots on disk
pub mod persist;

/// Greedy evaluation of a learned table
pub mod play;

/// The Q-learning training loop
pub mod train;

mod util;

pub use error::{Error, Result};
