use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-feature score contributions, keyed by feature name.
///
/// A `BTreeMap` keeps iteration (and therefore n-best output) ordered by
/// feature name regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreBreakdown {
    values: BTreeMap<String, f32>,
}

impl ScoreBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the named feature, creating it at zero if absent.
    pub fn add(&mut self, feature: &str, value: f32) {
        *self.values.entry(feature.to_string()).or_insert(0.0) += value;
    }

    pub fn with(mut self, feature: &str, value: f32) -> Self {
        self.add(feature, value);
        self
    }

    pub fn get(&self, feature: &str) -> f32 {
        self.values.get(feature).copied().unwrap_or(0.0)
    }

    pub fn plus_equals(&mut self, other: &ScoreBreakdown) {
        for (name, value) in &other.values {
            *self.values.entry(name.clone()).or_insert(0.0) += value;
        }
    }

    pub fn minus_equals(&mut self, other: &ScoreBreakdown) {
        for (name, value) in &other.values {
            *self.values.entry(name.clone()).or_insert(0.0) -= value;
        }
    }

    /// Unweighted sum over all features.
    pub fn total(&self) -> f32 {
        self.values.values().sum()
    }

    /// Dot product with a weight vector. Features without a weight count as 0.
    pub fn weighted(&self, weights: &BTreeMap<String, f32>) -> f32 {
        self.values
            .iter()
            .map(|(name, value)| weights.get(name).copied().unwrap_or(0.0) * value)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.values {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            match f.precision() {
                Some(p) => write!(f, "{name}= {value:.p$}")?,
                None => write!(f, "{name}= {value}")?,
            }
        }
        Ok(())
    }
}
