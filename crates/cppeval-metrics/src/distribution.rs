//! Value counts
//!
//! Insertion-ordered counter: iteration follows first occurrence, and
//! `most_common` breaks count ties by first occurrence too.

use indexmap::IndexMap;

/// Count of each distinct value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    counts: IndexMap<String, usize>,
    total: usize,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `value`
    pub fn add(&mut self, value: impl Into<String>) {
        self.add_n(value, 1);
    }

    /// Count `n` occurrences of `value`
    pub fn add_n(&mut self, value: impl Into<String>, n: usize) {
        *self.counts.entry(value.into()).or_insert(0) += n;
        self.total += n;
    }

    #[must_use]
    pub fn get(&self, value: &str) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Sum of all counts
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entries by descending count, ties in first-seen order
    #[must_use]
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    /// The `n` most common entries
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<(&str, usize)> {
        let mut entries = self.most_common();
        entries.truncate(n);
        entries
    }

    /// Entries sorted by value
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Share of `count` in the total, in percent
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    /// `{'a': 1, 'b': 2}` rendering used in summary files
    #[must_use]
    pub fn to_inline(&self) -> String {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("'{k}': {v}")).collect();
        format!("{{{}}}", parts.join(", "))
    }
}

impl<S: Into<String>> FromIterator<S> for Distribution {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut dist = Self::new();
        for value in iter {
            dist.add(value);
        }
        dist
    }
}
