use serde::{Deserialize, Serialize};

use crate::{
    gym::{FlappyConfig, Observation},
    Error, Result,
};

/// A discretized observation: one bin index per observation dimension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscreteState(pub usize, pub usize, pub usize);

impl From<(usize, usize, usize)> for DiscreteState {
    fn from((v, h, vel): (usize, usize, usize)) -> Self {
        Self(v, h, vel)
    }
}

/// An increasing sequence of bin edges
///
/// A value is assigned the number of edges less than or equal to it, so values below the
/// first edge land in bin `0`, values at or past the last edge land in bin `edges.len()`,
/// and there are `edges.len() + 1` bins in total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bins {
    edges: Vec<f64>,
}

impl Bins {
    /// **Errors** if `edges` is empty, contains a non-finite value, or is not strictly increasing
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.is_empty() {
            return Err(Error::config("bin edges must not be empty"));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(Error::config("bin edges must be finite"));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::config("bin edges must be strictly increasing"));
        }
        Ok(Self { edges })
    }

    /// `num` evenly spaced edges from `start` to `stop`, both included
    pub fn linspace(start: f64, stop: f64, num: usize) -> Result<Self> {
        if num < 2 {
            return Err(Error::config("linspace needs at least two edges"));
        }
        let step = (stop - start) / (num - 1) as f64;
        let mut edges: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
        edges[num - 1] = stop;
        Self::new(edges)
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins, one more than the number of edges
    pub fn count(&self) -> usize {
        self.edges.len() + 1
    }

    pub fn index(&self, value: f64) -> usize {
        self.edges.partition_point(|&e| e <= value)
    }
}

/// Maps raw [`Observation`]s onto [`DiscreteState`]s
///
/// Training and inference must share the same discretizer or learned values will be
/// looked up under the wrong states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discretizer {
    pub vertical: Bins,
    pub horizontal: Bins,
    pub velocity: Bins,
}

impl Default for Discretizer {
    fn default() -> Self {
        Self::for_field(288.0, 512.0).expect("default field bins are valid")
    }
}

impl Discretizer {
    /// Bins sized for a field of the given dimensions
    ///
    /// Vertical offsets span `[-height, height]` in 20 edges, horizontal distances
    /// `[0, width]` in 10 edges, and velocities `[-10, 10]` in 10 edges.
    pub fn for_field(width: f64, height: f64) -> Result<Self> {
        Ok(Self {
            vertical: Bins::linspace(-height, height, 20)?,
            horizontal: Bins::linspace(0.0, width, 10)?,
            velocity: Bins::linspace(-10.0, 10.0, 10)?,
        })
    }

    /// Bins sized for the field of `config`
    pub fn for_game(config: &FlappyConfig) -> Result<Self> {
        Self::for_field(config.width as f64, config.height as f64)
    }

    pub fn discretize(&self, observation: Observation) -> DiscreteState {
        DiscreteState(
            self.vertical.index(observation.vertical_offset as f64),
            self.horizontal.index(observation.horizontal_distance as f64),
            self.velocity.index(observation.velocity as f64),
        )
    }
}
