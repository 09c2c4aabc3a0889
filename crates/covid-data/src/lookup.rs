//! First/last occurrence search over datasets and note tables.
//!
//! Text fields are compared case-insensitively with `-` folded to a space;
//! integer fields compare exactly. A value of the wrong type, or a field the
//! record type does not carry, is reported as
//! [`SeriesError::InvalidSelector`] and never as a plain miss.

use covid_core::fields::{Field, FieldValue};
use covid_core::models::{DailyRecord, Searchable};
use covid_core::{Result, SeriesError};

use crate::dataset::{CardinalityPolicy, Dataset};

// ── Dataset lookups ───────────────────────────────────────────────────────────

/// Index of the first record whose `field` equals `value`.
pub fn find_first<R: DailyRecord>(
    dataset: &Dataset<R>,
    field: Field,
    value: impl Into<FieldValue>,
) -> Result<usize> {
    let value = value.into();
    position_first(dataset.records(), field, &value)?
        .ok_or_else(|| SeriesError::not_found(field, &value))
}

/// Index of the last record whose `field` equals `value`.
///
/// On a fixed-cardinality dataset only the most recent reporting day (the
/// final `per_day` records) is searched, so the match is always the current
/// value and never a historical record that happens to share it.
pub fn find_last<R: DailyRecord>(
    dataset: &Dataset<R>,
    field: Field,
    value: impl Into<FieldValue>,
) -> Result<usize> {
    let value = value.into();
    let records = dataset.records();
    let start = match dataset.policy() {
        CardinalityPolicy::Fixed { per_day } => records.len().saturating_sub(per_day),
        CardinalityPolicy::Variable => 0,
    };
    position_last(&records[start..], field, &value)?
        .map(|offset| start + offset)
        .ok_or_else(|| SeriesError::not_found(field, &value))
}

/// Index of the last record before `end` (exclusive) whose `field` equals
/// `value`. Searches the whole prefix regardless of cardinality policy.
pub fn find_last_before<R: DailyRecord>(
    dataset: &Dataset<R>,
    field: Field,
    value: impl Into<FieldValue>,
    end: usize,
) -> Result<usize> {
    let value = value.into();
    let records = dataset.records();
    let end = end.min(records.len());
    position_last(&records[..end], field, &value)?
        .ok_or_else(|| SeriesError::not_found(field, &value))
}

// ── Slice lookups ─────────────────────────────────────────────────────────────

/// Position of the first item whose `field` equals `value`, or `None`.
pub fn position_first<S: Searchable>(
    items: &[S],
    field: Field,
    value: &FieldValue,
) -> Result<Option<usize>> {
    validate(items, field, value)?;
    let needle = value.folded();
    Ok(items.iter().position(|item| {
        item.field(field)
            .is_some_and(|candidate| needle.matches_folded(candidate))
    }))
}

/// Position of the last item whose `field` equals `value`, or `None`.
pub fn position_last<S: Searchable>(
    items: &[S],
    field: Field,
    value: &FieldValue,
) -> Result<Option<usize>> {
    validate(items, field, value)?;
    let needle = value.folded();
    Ok(items.iter().rposition(|item| {
        item.field(field)
            .is_some_and(|candidate| needle.matches_folded(candidate))
    }))
}

/// Reject values of the wrong type and fields the item type does not carry.
fn validate<S: Searchable>(items: &[S], field: Field, value: &FieldValue) -> Result<()> {
    field.check_value(value)?;
    if let Some(sample) = items.first() {
        if sample.field(field).is_none() {
            return Err(SeriesError::InvalidSelector(format!(
                "field {} is not available for this dataset",
                field
            )));
        }
    }
    Ok(())
}
