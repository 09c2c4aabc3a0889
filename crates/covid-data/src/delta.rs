//! Derivation of daily new cases from cumulative totals.

use covid_core::formatting::SignedDelta;
use covid_core::models::{DerivedNewCases, NEW_CASES_UNRESOLVED};
use tracing::debug;

use crate::dataset::Dataset;

/// Outcome of one delta pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaSummary {
    /// Records that received a value.
    pub resolved: usize,
    /// Placeholder records left at the sentinel.
    pub placeholders: usize,
    /// Distinct entities seen.
    pub entities: usize,
}

/// Populate `new_cases` on every record of `dataset`.
///
/// Every value is first reset to [`NEW_CASES_UNRESOLVED`]. The dataset is
/// then walked from the newest record back. Each unresolved record starts a
/// chain: its previous occurrence of the same entity is found by scanning
/// further back, the later record gets `|total(later) - total(earlier)|`,
/// and the walk continues from the earlier record until the entity's first
/// occurrence, which gets its own total. Placeholder pseudo-entities are
/// skipped and keep the sentinel.
///
/// The result depends only on totals and entity codes, so re-running the
/// pass yields the same values.
pub fn compute_new_cases<R: DerivedNewCases>(dataset: &mut Dataset<R>) -> DeltaSummary {
    let records = dataset.records_mut();
    for record in records.iter_mut() {
        record.set_new_cases(NEW_CASES_UNRESOLVED);
    }

    let mut resolved = vec![false; records.len()];
    let mut summary = DeltaSummary::default();

    for start in (0..records.len()).rev() {
        if records[start].is_placeholder() {
            summary.placeholders += 1;
            continue;
        }
        if resolved[start] {
            continue;
        }

        summary.entities += 1;
        let identity = records[start].entity_code();
        let mut current = start;
        loop {
            let previous = (0..current).rev().find(|&j| {
                !records[j].is_placeholder() && records[j].entity_code() == identity
            });
            let value = match previous {
                Some(j) => {
                    SignedDelta::between(records[j].total_cases(), records[current].total_cases())
                        .magnitude()
                }
                None => records[current].total_cases(),
            };
            records[current].set_new_cases(value);
            resolved[current] = true;
            summary.resolved += 1;

            match previous {
                Some(j) => current = j,
                None => break,
            }
        }
    }

    debug!(
        resolved = summary.resolved,
        placeholders = summary.placeholders,
        entities = summary.entities,
        "new cases computed"
    );
    summary
}
