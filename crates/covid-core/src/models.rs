use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::fields::{fold_text, Field, FieldRef};
use crate::metrics::Metric;
use crate::time_utils::{parse_report_date, report_day};

/// Value of [`ProvinceRecord::new_cases`] before the delta engine has run.
pub const NEW_CASES_UNRESOLVED: i64 = -1;

/// Provincial pseudo-entities that collect cases not (yet) attributed to a
/// real province. Compared with [`fold_text`].
pub const PLACEHOLDER_PROVINCES: [&str; 2] = [
    "Fuori Regione / Provincia Autonoma",
    "In fase di definizione/aggiornamento",
];

/// `true` when `name` is one of the [`PLACEHOLDER_PROVINCES`].
pub fn is_placeholder_name(name: &str) -> bool {
    let folded = fold_text(name.trim());
    PLACEHOLDER_PROVINCES
        .iter()
        .any(|placeholder| fold_text(placeholder) == folded)
}

// ── Granularity ───────────────────────────────────────────────────────────────

/// How many records a granularity publishes per reporting day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredCardinality {
    /// Same number of records every day, in a stable order.
    Fixed,
    /// Entities may appear on some days and not others.
    Variable,
}

/// The entity level of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Nation,
    Region,
    Province,
}

impl Granularity {
    pub fn declared_cardinality(&self) -> DeclaredCardinality {
        match self {
            Granularity::Nation | Granularity::Region => DeclaredCardinality::Fixed,
            Granularity::Province => DeclaredCardinality::Variable,
        }
    }

    /// Field holding the stable numeric code of an entity.
    pub fn code_field(&self) -> Option<Field> {
        match self {
            Granularity::Nation => None,
            Granularity::Region => Some(Field::RegionCode),
            Granularity::Province => Some(Field::ProvinceCode),
        }
    }

    /// Field holding the display name of an entity.
    pub fn name_field(&self) -> Option<Field> {
        match self {
            Granularity::Nation => None,
            Granularity::Region => Some(Field::RegionName),
            Granularity::Province => Some(Field::ProvinceName),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Nation => f.write_str("nation"),
            Granularity::Region => f.write_str("region"),
            Granularity::Province => f.write_str("province"),
        }
    }
}

// ── Record traits ─────────────────────────────────────────────────────────────

/// Anything the lookup index can search by [`Field`].
pub trait Searchable {
    /// Borrow the value of `field`, or `None` when this record type does not
    /// carry it.
    fn field(&self, field: Field) -> Option<FieldRef<'_>>;
}

/// One entity's published values for one reporting day.
pub trait DailyRecord: Searchable {
    const GRANULARITY: Granularity;

    /// Raw report timestamp as published.
    fn date(&self) -> &str;

    /// Stable numeric entity code; `None` for the national granularity.
    fn entity_code(&self) -> Option<i64>;

    /// Display name of the entity; `None` for the national granularity.
    fn entity_name(&self) -> Option<&str>;

    /// Value of `metric`, or `None` when this granularity does not publish it.
    fn metric(&self, metric: Metric) -> Option<i64>;

    /// `true` for pseudo-entities excluded from per-entity reconstruction.
    fn is_placeholder(&self) -> bool {
        false
    }

    fn report_date(&self) -> Result<NaiveDateTime> {
        parse_report_date(self.date())
    }

    /// Report date with the time-of-day discarded.
    fn report_day(&self) -> Result<NaiveDate> {
        report_day(self.date())
    }
}

/// Records that carry a `NewCases` value derived from their cumulative total.
pub trait DerivedNewCases: DailyRecord {
    fn total_cases(&self) -> i64;
    fn new_cases(&self) -> i64;
    fn set_new_cases(&mut self, value: i64);
}

// ── Counts ────────────────────────────────────────────────────────────────────

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Cumulative counts published for the national and regional granularities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeCounts {
    /// Hospitalised with symptoms.
    #[serde(rename = "ricoverati_con_sintomi", default, deserialize_with = "null_as_zero")]
    pub hospitalized_with_symptoms: i64,
    #[serde(rename = "terapia_intensiva", default, deserialize_with = "null_as_zero")]
    pub intensive_care: i64,
    #[serde(rename = "totale_ospedalizzati", default, deserialize_with = "null_as_zero")]
    pub total_hospitalized: i64,
    #[serde(rename = "isolamento_domiciliare", default, deserialize_with = "null_as_zero")]
    pub home_isolation: i64,
    /// Currently positive.
    #[serde(rename = "totale_positivi", default, deserialize_with = "null_as_zero")]
    pub total_positive: i64,
    #[serde(rename = "nuovi_positivi", default, deserialize_with = "null_as_zero")]
    pub new_positive: i64,
    #[serde(rename = "dimessi_guariti", default, deserialize_with = "null_as_zero")]
    pub recovered: i64,
    #[serde(rename = "deceduti", default, deserialize_with = "null_as_zero")]
    pub deaths: i64,
    #[serde(rename = "totale_casi", default, deserialize_with = "null_as_zero")]
    pub total_cases: i64,
    #[serde(rename = "tamponi", default, deserialize_with = "null_as_zero")]
    pub tests: i64,
}

impl CumulativeCounts {
    pub fn get(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::HospitalizedWithSymptoms => Some(self.hospitalized_with_symptoms),
            Metric::IntensiveCare => Some(self.intensive_care),
            Metric::TotalHospitalized => Some(self.total_hospitalized),
            Metric::HomeIsolation => Some(self.home_isolation),
            Metric::TotalPositive => Some(self.total_positive),
            Metric::NewPositive => Some(self.new_positive),
            Metric::Recovered => Some(self.recovered),
            Metric::Deaths => Some(self.deaths),
            Metric::TotalCases => Some(self.total_cases),
            Metric::Tests => Some(self.tests),
            Metric::NewCases => None,
        }
    }
}

// ── NationRecord ──────────────────────────────────────────────────────────────

/// One day of national figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationRecord {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "stato", default)]
    pub country: String,
    #[serde(flatten)]
    pub counts: CumulativeCounts,
    #[serde(rename = "note_it", default)]
    pub note: Option<String>,
}

impl Searchable for NationRecord {
    fn field(&self, field: Field) -> Option<FieldRef<'_>> {
        match field {
            Field::Date => Some(FieldRef::Text(&self.date)),
            Field::Metric(metric) => self.counts.get(metric).map(FieldRef::Integer),
            _ => None,
        }
    }
}

impl DailyRecord for NationRecord {
    const GRANULARITY: Granularity = Granularity::Nation;

    fn date(&self) -> &str {
        &self.date
    }

    fn entity_code(&self) -> Option<i64> {
        None
    }

    fn entity_name(&self) -> Option<&str> {
        None
    }

    fn metric(&self, metric: Metric) -> Option<i64> {
        self.counts.get(metric)
    }
}

// ── RegionRecord ──────────────────────────────────────────────────────────────

/// One region's figures for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "stato", default)]
    pub country: String,
    #[serde(rename = "codice_regione")]
    pub region_code: i64,
    #[serde(rename = "denominazione_regione")]
    pub region_name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub long: Option<f64>,
    #[serde(flatten)]
    pub counts: CumulativeCounts,
    #[serde(rename = "note_it", default)]
    pub note: Option<String>,
}

impl Searchable for RegionRecord {
    fn field(&self, field: Field) -> Option<FieldRef<'_>> {
        match field {
            Field::Date => Some(FieldRef::Text(&self.date)),
            Field::RegionCode => Some(FieldRef::Integer(self.region_code)),
            Field::RegionName => Some(FieldRef::Text(&self.region_name)),
            Field::Metric(metric) => self.counts.get(metric).map(FieldRef::Integer),
            _ => None,
        }
    }
}

impl DailyRecord for RegionRecord {
    const GRANULARITY: Granularity = Granularity::Region;

    fn date(&self) -> &str {
        &self.date
    }

    fn entity_code(&self) -> Option<i64> {
        Some(self.region_code)
    }

    fn entity_name(&self) -> Option<&str> {
        Some(&self.region_name)
    }

    fn metric(&self, metric: Metric) -> Option<i64> {
        self.counts.get(metric)
    }
}

// ── ProvinceRecord ────────────────────────────────────────────────────────────

fn unresolved_new_cases() -> i64 {
    NEW_CASES_UNRESOLVED
}

/// One province's cumulative case count for one day.
///
/// `new_cases` is not part of the published data; it stays at
/// [`NEW_CASES_UNRESOLVED`] until the delta engine fills it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvinceRecord {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "stato", default)]
    pub country: String,
    #[serde(rename = "codice_regione")]
    pub region_code: i64,
    #[serde(rename = "denominazione_regione")]
    pub region_name: String,
    #[serde(rename = "codice_provincia")]
    pub province_code: i64,
    #[serde(rename = "denominazione_provincia")]
    pub province_name: String,
    #[serde(rename = "sigla_provincia", default)]
    pub province_abbreviation: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub long: Option<f64>,
    #[serde(rename = "totale_casi", default, deserialize_with = "null_as_zero")]
    pub total_cases: i64,
    #[serde(rename = "note_it", default)]
    pub note: Option<String>,
    #[serde(rename = "nuovi_casi", skip_deserializing, default = "unresolved_new_cases")]
    pub new_cases: i64,
}

impl Searchable for ProvinceRecord {
    fn field(&self, field: Field) -> Option<FieldRef<'_>> {
        match field {
            Field::Date => Some(FieldRef::Text(&self.date)),
            Field::RegionCode => Some(FieldRef::Integer(self.region_code)),
            Field::RegionName => Some(FieldRef::Text(&self.region_name)),
            Field::ProvinceCode => Some(FieldRef::Integer(self.province_code)),
            Field::ProvinceName => Some(FieldRef::Text(&self.province_name)),
            Field::ProvinceAbbreviation => {
                Some(FieldRef::Text(self.province_abbreviation.as_deref().unwrap_or("")))
            }
            Field::Metric(metric) => self.metric(metric).map(FieldRef::Integer),
            _ => None,
        }
    }
}

impl DailyRecord for ProvinceRecord {
    const GRANULARITY: Granularity = Granularity::Province;

    fn date(&self) -> &str {
        &self.date
    }

    fn entity_code(&self) -> Option<i64> {
        Some(self.province_code)
    }

    fn entity_name(&self) -> Option<&str> {
        Some(&self.province_name)
    }

    fn metric(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::TotalCases => Some(self.total_cases),
            Metric::NewCases => Some(self.new_cases),
            _ => None,
        }
    }

    fn is_placeholder(&self) -> bool {
        is_placeholder_name(&self.province_name)
    }
}

impl DerivedNewCases for ProvinceRecord {
    fn total_cases(&self) -> i64 {
        self.total_cases
    }

    fn new_cases(&self) -> i64 {
        self.new_cases
    }

    fn set_new_cases(&mut self, value: i64) {
        self.new_cases = value;
    }
}

// ── NoteRecord ────────────────────────────────────────────────────────────────

/// An advisory note attached to a day and, optionally, a region or province.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub code: String,
    pub date: String,
    pub region: String,
    pub province: String,
    pub notice_type: String,
    pub notice: String,
    pub note: String,
}

impl Searchable for NoteRecord {
    fn field(&self, field: Field) -> Option<FieldRef<'_>> {
        match field {
            Field::NoteCode => Some(FieldRef::Text(&self.code)),
            Field::Date => Some(FieldRef::Text(&self.date)),
            Field::RegionName => Some(FieldRef::Text(&self.region)),
            Field::ProvinceName => Some(FieldRef::Text(&self.province)),
            Field::NoticeType => Some(FieldRef::Text(&self.notice_type)),
            Field::Notice => Some(FieldRef::Text(&self.notice)),
            Field::NoteText => Some(FieldRef::Text(&self.note)),
            _ => None,
        }
    }
}

// ── Regional groupings ────────────────────────────────────────────────────────

/// Geographic macro-area used to group regional charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionGroup {
    North,
    Centre,
    South,
}

impl RegionGroup {
    pub fn region_names(&self) -> &'static [&'static str] {
        match self {
            RegionGroup::North => &[
                "Piemonte",
                "Valle d'Aosta",
                "Liguria",
                "Lombardia",
                "P.A. Trento",
                "P.A. Bolzano",
                "Veneto",
                "Friuli Venezia Giulia",
                "Emilia-Romagna",
            ],
            RegionGroup::Centre => &["Toscana", "Umbria", "Marche", "Lazio"],
            RegionGroup::South => &[
                "Abruzzo",
                "Molise",
                "Campania",
                "Puglia",
                "Basilicata",
                "Calabria",
                "Sicilia",
                "Sardegna",
            ],
        }
    }

    /// Group containing `region_name`, compared with [`fold_text`].
    pub fn of(region_name: &str) -> Option<RegionGroup> {
        let folded = fold_text(region_name.trim());
        [RegionGroup::North, RegionGroup::Centre, RegionGroup::South]
            .into_iter()
            .find(|group| {
                group
                    .region_names()
                    .iter()
                    .any(|name| fold_text(name) == folded)
            })
    }
}
