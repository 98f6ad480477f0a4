//! Numeric trial results and how they combine

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metric label to value, produced once per trial
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(BTreeMap<String, f64>);

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: f64) {
        self.0.insert(label.into(), value);
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(label, value)| (label.as_str(), *value))
    }

    /// Elementwise sum. An empty report on either side is the identity.
    ///
    /// Both reports must come from the same benchmark; labels present only
    /// in `other` are not carried over.
    pub fn aggregate(&self, other: &Report) -> Report {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }

        self.0
            .iter()
            .map(|(label, value)| (label.clone(), value + other.get(label).unwrap_or(0.0)))
            .collect()
    }

    /// Elementwise division by `n`, turning a folded sum into a mean
    pub fn scale(&self, n: u32) -> Report {
        let divisor = f64::from(n);
        self.0
            .iter()
            .map(|(label, value)| (label.clone(), value / divisor))
            .collect()
    }

    /// Prefix every label with `prefix/`
    pub fn namespaced(&self, prefix: &str) -> Report {
        self.0
            .iter()
            .map(|(label, value)| (format!("{}/{}", prefix, label), *value))
            .collect()
    }
}

impl FromIterator<(String, f64)> for Report {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, f64); N]> for Report {
    fn from(pairs: [(&str, f64); N]) -> Self {
        pairs
            .into_iter()
            .map(|(label, value)| (label.to_string(), value))
            .collect()
    }
}

impl Extend<(String, f64)> for Report {
    fn extend<I: IntoIterator<Item = (String, f64)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
