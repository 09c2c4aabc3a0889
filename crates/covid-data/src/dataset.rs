//! Flat, append-only datasets and their per-day cardinality policy.

use chrono::{DateTime, NaiveDate, Utc};
use covid_core::models::{DailyRecord, DeclaredCardinality};
use covid_core::Result;
use tracing::{debug, warn};

// ── CardinalityPolicy ─────────────────────────────────────────────────────────

/// Resolved per-day record count of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityPolicy {
    /// Every reporting day holds exactly `per_day` records, entities in the
    /// same order each day.
    Fixed { per_day: usize },
    /// Per-day count or order varies; only scan-based access is valid.
    Variable,
}

// ── Ingested ──────────────────────────────────────────────────────────────────

/// A decoded dataset paired with the instant it was ingested.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub data: T,
    pub ingested_at: DateTime<Utc>,
}

impl<T> Ingested<T> {
    /// Stamp `data` with the current time.
    pub fn now(data: T) -> Self {
        Self {
            data,
            ingested_at: Utc::now(),
        }
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// The full published history of one granularity, oldest day first.
///
/// Built once by [`Dataset::ingest`]; re-ingestion replaces the whole value.
#[derive(Debug, Clone)]
pub struct Dataset<R> {
    records: Vec<R>,
    policy: CardinalityPolicy,
}

impl<R: DailyRecord> Dataset<R> {
    /// Wrap `records` and resolve the cardinality policy.
    ///
    /// Granularities that declare a fixed per-day count are verified: the
    /// count of the first day becomes the stride and every other day must
    /// repeat it with the same entity order. When they do not, the dataset
    /// falls back to [`CardinalityPolicy::Variable`]. Report dates are parsed
    /// during verification, so a malformed date fails the ingestion.
    pub fn ingest(records: Vec<R>) -> Result<Self> {
        let policy = match R::GRANULARITY.declared_cardinality() {
            DeclaredCardinality::Variable => CardinalityPolicy::Variable,
            DeclaredCardinality::Fixed => verify_fixed_cardinality(&records)?,
        };
        debug!(
            granularity = %R::GRANULARITY,
            records = records.len(),
            ?policy,
            "dataset ingested"
        );
        Ok(Self { records, policy })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.records.get(index)
    }

    pub fn last(&self) -> Option<&R> {
        self.records.last()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn policy(&self) -> CardinalityPolicy {
        self.policy
    }

    /// Mutable access for the delta engine. Does not allow reordering.
    pub(crate) fn records_mut(&mut self) -> &mut [R] {
        &mut self.records
    }
}

/// Group consecutive records by calendar day and check every group has the
/// same length and entity order as the first.
fn verify_fixed_cardinality<R: DailyRecord>(records: &[R]) -> Result<CardinalityPolicy> {
    let Some(first) = records.first() else {
        return Ok(CardinalityPolicy::Variable);
    };

    let first_day = first.report_day()?;
    let mut reference: Vec<Option<i64>> = Vec::new();
    for record in records {
        if record.report_day()? != first_day {
            break;
        }
        reference.push(record.entity_code());
    }
    let per_day = reference.len();

    let mut current_day: Option<NaiveDate> = None;
    let mut position = 0usize;
    for (index, record) in records.iter().enumerate() {
        let day = record.report_day()?;
        if current_day != Some(day) {
            if current_day.is_some() && position != per_day {
                return Ok(downgrade::<R>(index, per_day, position));
            }
            current_day = Some(day);
            position = 0;
        }
        if position >= per_day || reference[position] != record.entity_code() {
            return Ok(downgrade::<R>(index, per_day, position + 1));
        }
        position += 1;
    }
    if position != per_day {
        return Ok(downgrade::<R>(records.len(), per_day, position));
    }

    Ok(CardinalityPolicy::Fixed { per_day })
}

fn downgrade<R: DailyRecord>(index: usize, expected: usize, found: usize) -> CardinalityPolicy {
    warn!(
        granularity = %R::GRANULARITY,
        index,
        expected,
        found,
        "per-day record count is not constant; using scan-based access"
    );
    CardinalityPolicy::Variable
}

#[cfg(test)]
pub(crate) mod fixtures {
    use covid_core::models::{CumulativeCounts, ProvinceRecord, RegionRecord, NEW_CASES_UNRESOLVED};

    pub fn region(date: &str, code: i64, name: &str, total_cases: i64) -> RegionRecord {
        RegionRecord {
            date: date.to_string(),
            country: "ITA".to_string(),
            region_code: code,
            region_name: name.to_string(),
            lat: None,
            long: None,
            counts: CumulativeCounts {
                total_cases,
                deaths: total_cases / 10,
                ..Default::default()
            },
            note: None,
        }
    }

    pub fn province(date: &str, code: i64, name: &str, region: &str, total_cases: i64) -> ProvinceRecord {
        ProvinceRecord {
            date: date.to_string(),
            country: "ITA".to_string(),
            region_code: 1,
            region_name: region.to_string(),
            province_code: code,
            province_name: name.to_string(),
            province_abbreviation: Some(name.chars().take(2).collect::<String>().to_uppercase()),
            lat: None,
            long: None,
            total_cases,
            note: None,
            new_cases: NEW_CASES_UNRESOLVED,
        }
    }

    /// Three days, two regions: Alpha `[10, 15, 15]`, Beta `[5, 5, 9]`.
    pub fn alpha_beta_regions() -> Vec<RegionRecord> {
        vec![
            region("2020-03-01T18:00:00", 1, "Alpha", 10),
            region("2020-03-01T18:00:00", 2, "Beta", 5),
            region("2020-03-02T18:00:00", 1, "Alpha", 15),
            region("2020-03-02T18:00:00", 2, "Beta", 5),
            region("2020-03-03T18:00:00", 1, "Alpha", 15),
            region("2020-03-03T18:00:00", 2, "Beta", 9),
        ]
    }

    /// Provinces with irregular presence and interleaved placeholders.
    ///
    /// Day 1: Bergamo 10, Brescia 4
    /// Day 2: Bergamo 25, placeholder 3, Brescia 4, Cremona 2 (first appearance)
    /// Day 3: Brescia 9, Cremona 2, placeholder 1, Bergamo 20 (downward correction)
    pub fn irregular_provinces() -> Vec<ProvinceRecord> {
        vec![
            province("2020-03-01T17:00:00", 16, "Bergamo", "Lombardia", 10),
            province("2020-03-01T17:00:00", 17, "Brescia", "Lombardia", 4),
            province("2020-03-02T17:00:00", 16, "Bergamo", "Lombardia", 25),
            province(
                "2020-03-02T17:00:00",
                979,
                "In fase di definizione/aggiornamento",
                "Lombardia",
                3,
            ),
            province("2020-03-02T17:00:00", 17, "Brescia", "Lombardia", 4),
            province("2020-03-02T17:00:00", 19, "Cremona", "Lombardia", 2),
            province("2020-03-03T17:00:00", 17, "Brescia", "Lombardia", 9),
            province("2020-03-03T17:00:00", 19, "Cremona", "Lombardia", 2),
            province(
                "2020-03-03T17:00:00",
                979,
                "In fase di definizione/aggiornamento",
                "Lombardia",
                1,
            ),
            province("2020-03-03T17:00:00", 16, "Bergamo", "Lombardia", 20),
        ]
    }
}
