use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const COUNTS_HEADER: &str = "Vehicle Counts:";
pub const COUNTS_SEPARATOR: &str = "===============";

/// Per-class crossing totals for one session
///
/// Counts only ever go up. Classes appear once they have been counted at
/// least once; iteration is by class name so snapshots are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountAggregate {
    counts: BTreeMap<String, u64>,
}

impl CountAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to `class_name` and return its new total
    pub fn increment(&mut self, class_name: &str) -> u64 {
        let count = self.counts.entry(class_name.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn get(&self, class_name: &str) -> u64 {
        self.counts.get(class_name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Text snapshot: header, separator, then one `name: count` line per class
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CountAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", COUNTS_HEADER)?;
        writeln!(f, "{}", COUNTS_SEPARATOR)?;
        for (name, count) in self.iter() {
            writeln!(f, "{}: {}", name, count)?;
        }
        Ok(())
    }
}
