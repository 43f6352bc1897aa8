use std::{
    collections::{btree_map::Entry, BTreeMap},
    ops::Index,
};

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Determine if the state is active or terminal
    fn is_active(&self) -> bool;

    /// Advance the environment by one tick in response to an action taken by an agent
    fn step(&mut self, action: Self::Action) -> Transition<Self::State>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// The outcome of a single [`Environment::step`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<S> {
    /// The state observed after the step
    pub observation: S,
    /// The reward associated with the step
    pub reward: f32,
    /// Whether the episode ended on this step
    pub terminal: bool,
    /// The episode score after the step
    pub score: u32,
}

/// Named per-episode counters accumulated by an environment
///
/// Keys are fixed at construction. [`Report::take`] hands the accumulated values to the
/// caller and zeroes them for the next episode.
#[derive(Debug, Clone, Default)]
pub struct Report {
    keys: Vec<&'static str>,
    data: BTreeMap<&'static str, f64>,
}

impl Report {
    pub fn new(keys: Vec<&'static str>) -> Self {
        let data = keys.iter().map(|&k| (k, 0.0)).collect();
        Self { keys, data }
    }

    /// The report keys in the order they were declared
    pub fn keys(&self) -> &[&'static str] {
        &self.keys
    }

    pub fn entry(&mut self, key: &'static str) -> Entry<'_, &'static str, f64> {
        self.data.entry(key)
    }

    /// Take the accumulated values, resetting every counter to zero
    pub fn take(&mut self) -> BTreeMap<&'static str, f64> {
        let fresh = self.keys.iter().map(|&k| (k, 0.0)).collect();
        std::mem::replace(&mut self.data, fresh)
    }
}

impl Index<&str> for Report {
    type Output = f64;

    fn index(&self, key: &str) -> &Self::Output {
        &self.data[key]
    }
}
