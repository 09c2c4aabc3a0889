//! Per-entity series reconstruction from flat, interleaved datasets.
//!
//! Two index-resolution strategies produce the same series:
//!
//! * **fixed stride** — find the entity's first record, then take every
//!   `per_day`-th record. Only valid when every reporting day holds the same
//!   entities in the same order.
//! * **scan and link** — walk the array backward, jumping from each match to
//!   the entity's previous occurrence. Tolerates entities that skip days and
//!   placeholder rows at irregular positions.
//!
//! [`extract`] picks the strategy from the dataset's resolved
//! [`CardinalityPolicy`].

use chrono::NaiveDate;
use covid_core::fields::{Field, FieldValue};
use covid_core::formatting::SignedDelta;
use covid_core::metrics::Metric;
use covid_core::models::{DailyRecord, Granularity};
use covid_core::{Result, SeriesError};
use serde::{Deserialize, Serialize};

use crate::dataset::{CardinalityPolicy, Dataset};
use crate::lookup::{find_first, find_last_before};

// ── EntitySelector ────────────────────────────────────────────────────────────

/// Which entity's records to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitySelector {
    /// The single national entity.
    Whole,
    /// Stable numeric region or province code.
    Code(i64),
    /// Display name, compared case-insensitively with `-` folded to a space.
    Name(String),
}

impl EntitySelector {
    /// A numeric string selects by code, anything else by name.
    pub fn parse(s: &str) -> Self {
        match s.trim().parse::<i64>() {
            Ok(code) => EntitySelector::Code(code),
            Err(_) => EntitySelector::Name(s.trim().to_string()),
        }
    }

    /// Field and value to search for, or `None` for the whole dataset.
    fn resolve(&self, granularity: Granularity) -> Result<Option<(Field, FieldValue)>> {
        let resolved = match self {
            EntitySelector::Whole if granularity == Granularity::Nation => None,
            EntitySelector::Whole => {
                return Err(SeriesError::InvalidSelector(format!(
                    "{} data needs an entity code or name",
                    granularity
                )))
            }
            EntitySelector::Code(code) => {
                Some((code_field(granularity)?, FieldValue::Integer(*code)))
            }
            EntitySelector::Name(name) => Some((
                granularity.name_field().ok_or_else(|| no_entities(granularity))?,
                FieldValue::Text(name.clone()),
            )),
        };
        Ok(resolved)
    }
}

fn code_field(granularity: Granularity) -> Result<Field> {
    granularity.code_field().ok_or_else(|| no_entities(granularity))
}

fn no_entities(granularity: Granularity) -> SeriesError {
    SeriesError::InvalidSelector(format!("{} data has a single entity", granularity))
}

// ── EntitySeries ──────────────────────────────────────────────────────────────

/// One record of an entity's series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesPoint<'a, R> {
    /// Report date with the time-of-day discarded.
    pub date: NaiveDate,
    /// Position of the record in its dataset.
    pub index: usize,
    pub record: &'a R,
}

/// An entity's records across all reporting days, oldest first.
#[derive(Debug, Clone)]
pub struct EntitySeries<'a, R> {
    points: Vec<SeriesPoint<'a, R>>,
}

impl<'a, R: DailyRecord> EntitySeries<'a, R> {
    pub fn points(&self) -> &[SeriesPoint<'a, R>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dataset positions of the series' records.
    pub fn indexes(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.index).collect()
    }

    /// Keep only points on or after `date`.
    pub fn starting_at(mut self, date: NaiveDate) -> Self {
        self.points.retain(|p| p.date >= date);
        self
    }

    /// Dated values of `metric` plus a signed-delta annotation for every
    /// point after the first.
    pub fn time_series(&self, metric: Metric) -> Result<TimeSeries> {
        let mut points = Vec::with_capacity(self.points.len());
        for point in &self.points {
            let value = point.record.metric(metric).ok_or_else(|| {
                SeriesError::InvalidSelector(format!(
                    "{} is not published for {} data",
                    metric,
                    R::GRANULARITY
                ))
            })?;
            points.push(TimePoint {
                date: point.date,
                value,
            });
        }

        let annotations = points
            .windows(2)
            .map(|pair| DeltaAnnotation {
                date: pair[1].date,
                value: pair[1].value,
                label: SignedDelta::between(pair[0].value, pair[1].value).label(),
            })
            .collect();

        Ok(TimeSeries {
            metric,
            entity: self
                .points
                .first()
                .and_then(|p| p.record.entity_name())
                .map(str::to_string),
            points,
            annotations,
        })
    }
}

// ── Rendering export ──────────────────────────────────────────────────────────

/// A `(date, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: i64,
}

/// Chart label showing the change from the previous point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaAnnotation {
    pub date: NaiveDate,
    pub value: i64,
    /// `"+N"`, `"-N"` or `"+0"`.
    pub label: String,
}

/// Everything a chart renderer needs for one metric of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub metric: Metric,
    /// Entity display name; `None` for national data.
    pub entity: Option<String>,
    pub points: Vec<TimePoint>,
    pub annotations: Vec<DeltaAnnotation>,
}

// ── Extraction ────────────────────────────────────────────────────────────────

/// Extract the selected entity's series with the strategy the dataset's
/// cardinality policy allows.
pub fn extract<'a, R: DailyRecord>(
    dataset: &'a Dataset<R>,
    selector: &EntitySelector,
) -> Result<EntitySeries<'a, R>> {
    match dataset.policy() {
        CardinalityPolicy::Fixed { .. } => extract_fixed_stride(dataset, selector),
        CardinalityPolicy::Variable => extract_scan_and_link(dataset, selector),
    }
}

/// Stride walk from the entity's first record.
///
/// Fails with [`SeriesError::CardinalityViolation`] on a variable-cardinality
/// dataset, or if any visited record belongs to another entity.
pub fn extract_fixed_stride<'a, R: DailyRecord>(
    dataset: &'a Dataset<R>,
    selector: &EntitySelector,
) -> Result<EntitySeries<'a, R>> {
    let CardinalityPolicy::Fixed { per_day } = dataset.policy() else {
        return Err(SeriesError::CardinalityViolation(format!(
            "fixed-stride extraction on {} data whose per-day record count varies",
            R::GRANULARITY
        )));
    };

    let start = match selector.resolve(R::GRANULARITY)? {
        None => 0,
        Some((field, value)) => find_first(dataset, field, value)?,
    };

    let records = dataset.records();
    let Some(first) = records.get(start) else {
        return Ok(EntitySeries { points: Vec::new() });
    };
    let identity = first.entity_code();

    let mut points = Vec::with_capacity(records.len() / per_day.max(1) + 1);
    for index in (start..records.len()).step_by(per_day.max(1)) {
        let record = &records[index];
        if record.entity_code() != identity {
            return Err(SeriesError::CardinalityViolation(format!(
                "record {} belongs to entity {:?}, expected {:?}",
                index,
                record.entity_code(),
                identity
            )));
        }
        points.push(SeriesPoint {
            date: record.report_day()?,
            index,
            record,
        });
    }

    Ok(EntitySeries { points })
}

/// Backward scan linking each occurrence to the previous one.
///
/// Placeholder pseudo-entities never match.
pub fn extract_scan_and_link<'a, R: DailyRecord>(
    dataset: &'a Dataset<R>,
    selector: &EntitySelector,
) -> Result<EntitySeries<'a, R>> {
    let records = dataset.records();

    let Some((field, value)) = selector.resolve(R::GRANULARITY)? else {
        let mut points = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            points.push(SeriesPoint {
                date: record.report_day()?,
                index,
                record,
            });
        }
        return Ok(EntitySeries { points });
    };

    let mut points = Vec::new();
    let mut end = records.len();
    loop {
        let index = match find_last_before(dataset, field, value.clone(), end) {
            Ok(index) => index,
            Err(SeriesError::NotFound { .. }) => break,
            Err(e) => return Err(e),
        };
        let record = &records[index];
        if !record.is_placeholder() {
            points.push(SeriesPoint {
                date: record.report_day()?,
                index,
                record,
            });
        }
        end = index;
    }

    if points.is_empty() {
        return Err(SeriesError::not_found(field, &value));
    }
    points.reverse();

    Ok(EntitySeries { points })
}
