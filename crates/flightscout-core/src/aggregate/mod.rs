//! Date-indexed view over the raw results of a run.
//!
//! Every observation lands in the entry for the date it reports. A date is
//! *complete* once every expected group has reported for it; until then its
//! lowest price is only the best seen so far, because a missing source could
//! still undercut it.

use crate::fares::{Observation, RawResult};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Whether a date's best price can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// No observation exists for the date
    NoData,
    /// Some expected groups have not reported
    Partial {
        best: u32,
        present: usize,
        expected: usize,
    },
    /// Every expected group reported
    Complete { best: u32 },
}

impl Completeness {
    pub fn best_price(&self) -> Option<u32> {
        match self {
            Completeness::NoData => None,
            Completeness::Partial { best, .. } | Completeness::Complete { best } => Some(*best),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Completeness::Complete { .. })
    }
}

/// Observations of a run keyed by the date they report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateIndex {
    entries: BTreeMap<NaiveDate, Vec<Observation>>,
    expected_groups: BTreeSet<String>,
}

impl DateIndex {
    /// Index every observation of `results`.
    ///
    /// Each distinct group seen counts as expected, including groups whose
    /// results failed outright.
    pub fn build(results: &[RawResult]) -> Self {
        let mut index = DateIndex::default();

        for result in results {
            index.expected_groups.insert(result.group.clone());
            for observation in result.tagged() {
                let entry = index.entries.entry(observation.date).or_default();
                if !entry.contains(&observation) {
                    entry.push(observation);
                }
            }
        }

        for entry in index.entries.values_mut() {
            entry.sort_by(|a, b| {
                (a.price, &a.source_group, &a.source_label).cmp(&(
                    b.price,
                    &b.source_group,
                    &b.source_label,
                ))
            });
        }

        tracing::debug!(
            "Indexed {} dates across {} expected groups",
            index.entries.len(),
            index.expected_groups.len()
        );

        index
    }

    pub fn total_expected_groups(&self) -> usize {
        self.expected_groups.len()
    }

    pub fn expected_groups(&self) -> impl Iterator<Item = &str> {
        self.expected_groups.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dates with at least one observation, ascending
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.keys().copied()
    }

    /// Observations for `date`, cheapest first
    pub fn get(&self, date: NaiveDate) -> &[Observation] {
        self.entries.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every observation, ordered by date then price
    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.entries.values().flatten()
    }

    /// Distinct groups that reported for `date`
    pub fn groups_on(&self, date: NaiveDate) -> BTreeSet<&str> {
        self.get(date)
            .iter()
            .map(|o| o.source_group.as_str())
            .collect()
    }

    /// Groups expected for every date that have not reported for `date`
    pub fn missing_groups_on(&self, date: NaiveDate) -> Vec<&str> {
        let present = self.groups_on(date);
        self.expected_groups()
            .filter(|g| !present.contains(g))
            .collect()
    }

    /// Lowest price observed for `date`, regardless of completeness
    pub fn best_price(&self, date: NaiveDate) -> Option<u32> {
        self.get(date).iter().map(|o| o.price).min()
    }

    pub fn completeness(&self, date: NaiveDate) -> Completeness {
        let Some(best) = self.best_price(date) else {
            return Completeness::NoData;
        };

        let present = self.groups_on(date).len();
        let expected = self.total_expected_groups();
        if present == expected {
            Completeness::Complete { best }
        } else {
            Completeness::Partial {
                best,
                present,
                expected,
            }
        }
    }
}

/// Build the date index for a run's raw results
pub fn aggregate(results: &[RawResult]) -> DateIndex {
    DateIndex::build(results)
}
