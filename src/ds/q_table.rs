use std::collections::{hash_map, HashMap};

use strum::VariantArray;

use crate::{discretize::DiscreteState, gym::Action};

/// Sparse table of action values
///
/// Entries are created lazily on first write; every `(state, action)` pair that has
/// never been written reads as `0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    values: HashMap<(DiscreteState, Action), f32>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: DiscreteState, action: Action) -> f32 {
        self.values.get(&(state, action)).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, state: DiscreteState, action: Action, value: f32) {
        self.values.insert((state, action), value);
    }

    /// Whether any action has been written for `state`
    pub fn contains_state(&self, state: DiscreteState) -> bool {
        Action::VARIANTS
            .iter()
            .any(|&a| self.values.contains_key(&(state, a)))
    }

    /// The largest value over all actions in `state`
    pub fn max_value(&self, state: DiscreteState) -> f32 {
        Action::VARIANTS
            .iter()
            .map(|&a| self.get(state, a))
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Every action whose value in `state` equals the maximum, in action order
    pub fn best_actions(&self, state: DiscreteState) -> Vec<Action> {
        let max = self.max_value(state);
        Action::VARIANTS
            .iter()
            .copied()
            .filter(|&a| self.get(state, a) == max)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, (DiscreteState, Action), f32> {
        self.values.iter()
    }
}

impl FromIterator<((DiscreteState, Action), f32)> for QTable {
    fn from_iter<T: IntoIterator<Item = ((DiscreteState, Action), f32)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a QTable {
    type Item = (&'a (DiscreteState, Action), &'a f32);
    type IntoIter = hash_map::Iter<'a, (DiscreteState, Action), f32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
