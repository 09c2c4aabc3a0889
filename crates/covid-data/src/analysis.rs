//! Full ingestion pipeline.
//!
//! Loads every published dataset from a data directory and returns a
//! [`DatasetBundle`] ready for lookup, extraction and ranking.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use covid_core::models::{DailyRecord, NationRecord, ProvinceRecord, RegionRecord};
use covid_core::{Result, SeriesError};
use tracing::{info, warn};

use crate::dataset::{CardinalityPolicy, Dataset, Ingested};
use crate::notes::NoteTable;
use crate::reader::{load_nation, load_notes, load_provinces, load_regions, resolve_data_path};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside a bundle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IngestionMetadata {
    /// RFC 3339 timestamp when the bundle was assembled.
    pub generated_at: String,
    /// Directory the files were read from.
    pub data_path: String,
    pub nation_records: usize,
    pub region_records: usize,
    pub province_records: usize,
    pub notes: usize,
    /// Regions per day when the regional stride was verified.
    pub regions_per_day: Option<usize>,
    /// Wall-clock seconds spent reading, decoding and deriving.
    pub load_time_seconds: f64,
}

/// Every granularity of one ingestion run.
#[derive(Debug, Clone)]
pub struct DatasetBundle {
    pub nation: Ingested<Dataset<NationRecord>>,
    pub regions: Ingested<Dataset<RegionRecord>>,
    /// New cases already derived.
    pub provinces: Ingested<Dataset<ProvinceRecord>>,
    /// Empty when the notes file is absent.
    pub notes: Ingested<NoteTable>,
    pub metadata: IngestionMetadata,
}

impl DatasetBundle {
    /// Most recent national reporting day.
    pub fn latest_day(&self) -> Result<NaiveDate> {
        self.nation
            .data
            .last()
            .ok_or_else(|| SeriesError::not_found("date", "latest reporting day"))?
            .report_day()
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full ingestion pipeline.
///
/// The national, regional and provincial files are required. A missing notes
/// file is logged and yields an empty [`NoteTable`]; any other notes error is
/// returned.
pub fn ingest_all(data_path: Option<&Path>) -> Result<DatasetBundle> {
    let path = resolve_data_path(data_path);
    let load_start = std::time::Instant::now();

    let nation = load_nation(&path)?;
    let regions = load_regions(&path)?;
    let provinces = load_provinces(&path)?;
    let notes = match load_notes(&path) {
        Ok(notes) => notes,
        Err(SeriesError::DatasetNotFound(missing)) => {
            warn!("Notes file not found at {}; continuing without notes", missing.display());
            Ingested::now(NoteTable::default())
        }
        Err(e) => return Err(e),
    };

    let regions_per_day = match regions.data.policy() {
        CardinalityPolicy::Fixed { per_day } => Some(per_day),
        CardinalityPolicy::Variable => None,
    };

    let metadata = IngestionMetadata {
        generated_at: Utc::now().to_rfc3339(),
        data_path: path.display().to_string(),
        nation_records: nation.data.len(),
        region_records: regions.data.len(),
        province_records: provinces.data.len(),
        notes: notes.data.len(),
        regions_per_day,
        load_time_seconds: load_start.elapsed().as_secs_f64(),
    };

    info!(
        nation = metadata.nation_records,
        regions = metadata.region_records,
        provinces = metadata.province_records,
        notes = metadata.notes,
        "Ingested datasets from {}",
        metadata.data_path
    );

    Ok(DatasetBundle {
        nation,
        regions,
        provinces,
        notes,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
