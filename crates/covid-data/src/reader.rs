//! Discovery and decoding of the published dataset files.
//!
//! Reads a local checkout of the Italian Civil Protection COVID-19
//! repository. The JSON arrays become typed records and the notes CSV
//! becomes a [`NoteTable`]. Nothing here touches the network.

use std::io::Read;
use std::path::{Path, PathBuf};

use covid_core::models::{DailyRecord, NationRecord, NoteRecord, ProvinceRecord, RegionRecord};
use covid_core::{Result, SeriesError};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, Ingested};
use crate::delta::compute_new_cases;
use crate::notes::NoteTable;

// ── Dataset files ─────────────────────────────────────────────────────────────

/// One of the published files, by canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFile {
    Nation,
    Regions,
    Provinces,
    Notes,
}

impl DatasetFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            DatasetFile::Nation => "dpc-covid19-ita-andamento-nazionale.json",
            DatasetFile::Regions => "dpc-covid19-ita-regioni.json",
            DatasetFile::Provinces => "dpc-covid19-ita-province.json",
            DatasetFile::Notes => "dpc-covid19-ita-note-it.csv",
        }
    }
}

/// Positional columns of the notes CSV.
const NOTE_CODE: usize = 0;
const NOTE_DATE: usize = 1;
const NOTE_REGION: usize = 5;
const NOTE_PROVINCE: usize = 7;
const NOTE_NOTICE_TYPE: usize = 9;
const NOTE_NOTICE: usize = 10;
const NOTE_TEXT: usize = 11;
const NOTE_MIN_COLUMNS: usize = NOTE_TEXT + 1;

// ── Public API ────────────────────────────────────────────────────────────────

/// Resolve the data directory: `data_path` when given, otherwise
/// `~/.covid-series/COVID-19`.
pub fn resolve_data_path(data_path: Option<&Path>) -> PathBuf {
    if let Some(p) = data_path {
        return p.to_path_buf();
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".covid-series").join("COVID-19")
}

/// Locate `file` anywhere under `data_path`.
///
/// When several copies exist (the upstream repository keeps daily snapshots
/// next to the latest file) the shallowest one wins, ties broken by path.
pub fn find_dataset_file(data_path: &Path, file: DatasetFile) -> Result<PathBuf> {
    let name = file.file_name();
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Err(SeriesError::DatasetNotFound(data_path.join(name)));
    }

    let mut matches: Vec<(usize, PathBuf)> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .map(|entry| (entry.depth(), entry.into_path()))
        .collect();

    matches.sort();
    matches
        .into_iter()
        .next()
        .map(|(_, path)| path)
        .ok_or_else(|| SeriesError::DatasetNotFound(data_path.join(name)))
}

/// Decode a JSON array of records.
pub fn decode_records<R: DeserializeOwned>(json: &str) -> Result<Vec<R>> {
    Ok(serde_json::from_str(json)?)
}

/// Decode the notes CSV. The header row is skipped and columns are read by
/// position.
pub fn decode_notes<T: Read>(input: T) -> Result<Vec<NoteRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut notes = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.len() < NOTE_MIN_COLUMNS {
            return Err(SeriesError::MalformedNote {
                line: row.position().map(|p| p.line()).unwrap_or_default(),
                expected: NOTE_MIN_COLUMNS,
                found: row.len(),
            });
        }
        let column = |i: usize| row.get(i).unwrap_or_default().to_string();
        notes.push(NoteRecord {
            code: column(NOTE_CODE),
            date: column(NOTE_DATE),
            region: column(NOTE_REGION),
            province: column(NOTE_PROVINCE),
            notice_type: column(NOTE_NOTICE_TYPE),
            notice: column(NOTE_NOTICE),
            note: column(NOTE_TEXT),
        });
    }
    Ok(notes)
}

/// Load the national dataset.
pub fn load_nation(data_path: &Path) -> Result<Ingested<Dataset<NationRecord>>> {
    load_dataset(data_path, DatasetFile::Nation)
}

/// Load the regional dataset.
pub fn load_regions(data_path: &Path) -> Result<Ingested<Dataset<RegionRecord>>> {
    load_dataset(data_path, DatasetFile::Regions)
}

/// Load the provincial dataset and derive its daily new cases.
pub fn load_provinces(data_path: &Path) -> Result<Ingested<Dataset<ProvinceRecord>>> {
    let mut ingested: Ingested<Dataset<ProvinceRecord>> =
        load_dataset(data_path, DatasetFile::Provinces)?;
    let summary = compute_new_cases(&mut ingested.data);
    info!(
        entities = summary.entities,
        placeholders = summary.placeholders,
        "Derived provincial new cases"
    );
    Ok(ingested)
}

/// Load the advisory notes.
pub fn load_notes(data_path: &Path) -> Result<Ingested<NoteTable>> {
    let path = find_dataset_file(data_path, DatasetFile::Notes)?;
    let file = std::fs::File::open(&path).map_err(|source| SeriesError::FileRead {
        path: path.clone(),
        source,
    })?;
    let notes = decode_notes(std::io::BufReader::new(file))?;
    debug!("Loaded {} notes from {}", notes.len(), path.display());
    Ok(Ingested::now(NoteTable::new(notes)))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn load_dataset<R>(data_path: &Path, file: DatasetFile) -> Result<Ingested<Dataset<R>>>
where
    R: DeserializeOwned + DailyRecord,
{
    let path = find_dataset_file(data_path, file)?;
    let json = read_file(&path)?;
    let records: Vec<R> = decode_records(&json)?;
    debug!("Decoded {} records from {}", records.len(), path.display());
    Ok(Ingested::now(Dataset::ingest(records)?))
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| SeriesError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
