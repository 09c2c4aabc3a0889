//! Closed set of searchable record fields and the values they are compared
//! against.

use std::fmt;
use std::str::FromStr;

use crate::error::SeriesError;
use crate::metrics::Metric;

// ── Field ─────────────────────────────────────────────────────────────────────

/// The declared type of a [`Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
}

/// A searchable column of a daily record or advisory note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    RegionCode,
    RegionName,
    ProvinceCode,
    ProvinceName,
    ProvinceAbbreviation,
    NoteCode,
    NoticeType,
    Notice,
    NoteText,
    Metric(Metric),
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::RegionCode | Field::ProvinceCode | Field::Metric(_) => FieldKind::Integer,
            Field::Date
            | Field::RegionName
            | Field::ProvinceName
            | Field::ProvinceAbbreviation
            | Field::NoteCode
            | Field::NoticeType
            | Field::Notice
            | Field::NoteText => FieldKind::Text,
        }
    }

    /// Published key of the field.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Date => "data",
            Field::RegionCode => "codice_regione",
            Field::RegionName => "denominazione_regione",
            Field::ProvinceCode => "codice_provincia",
            Field::ProvinceName => "denominazione_provincia",
            Field::ProvinceAbbreviation => "sigla_provincia",
            Field::NoteCode => "codice",
            Field::NoticeType => "tipologia_avviso",
            Field::Notice => "avviso",
            Field::NoteText => "note",
            Field::Metric(metric) => metric.key(),
        }
    }

    /// Fail with [`SeriesError::InvalidSelector`] when `value` is not of this
    /// field's declared type.
    pub fn check_value(&self, value: &FieldValue) -> Result<(), SeriesError> {
        match (self.kind(), value) {
            (FieldKind::Integer, FieldValue::Integer(_)) | (FieldKind::Text, FieldValue::Text(_)) => {
                Ok(())
            }
            (FieldKind::Integer, FieldValue::Text(s)) => Err(SeriesError::InvalidSelector(
                format!("{} expects an integer, got text \"{}\"", self, s),
            )),
            (FieldKind::Text, FieldValue::Integer(n)) => Err(SeriesError::InvalidSelector(
                format!("{} expects text, got integer {}", self, n),
            )),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = SeriesError;

    /// Accepts published keys (including the note CSV's `regione` and
    /// `provincia` headers), English snake_case names, and any metric name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let field = match lower.as_str() {
            "data" | "date" => Field::Date,
            "codice_regione" | "region_code" => Field::RegionCode,
            "denominazione_regione" | "regione" | "region_name" => Field::RegionName,
            "codice_provincia" | "province_code" => Field::ProvinceCode,
            "denominazione_provincia" | "provincia" | "province_name" => Field::ProvinceName,
            "sigla_provincia" | "province_abbreviation" => Field::ProvinceAbbreviation,
            "codice" | "note_code" => Field::NoteCode,
            "tipologia_avviso" | "notice_type" => Field::NoticeType,
            "avviso" | "notice" => Field::Notice,
            "note" | "note_text" => Field::NoteText,
            _ => match lower.parse::<Metric>() {
                Ok(metric) => Field::Metric(metric),
                Err(_) => {
                    return Err(SeriesError::InvalidSelector(format!(
                        "unknown field \"{}\"",
                        s
                    )))
                }
            },
        };
        Ok(field)
    }
}

// ── Values ────────────────────────────────────────────────────────────────────

/// A value a lookup compares a field against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    /// Compare against a borrowed field value. Text is compared after
    /// [`fold_text`] on both sides; integers compare exactly. Values of
    /// different kinds never match.
    pub fn matches(&self, other: FieldRef<'_>) -> bool {
        match (self, other) {
            (FieldValue::Integer(a), FieldRef::Integer(b)) => *a == b,
            (FieldValue::Text(a), FieldRef::Text(b)) => fold_text(a) == fold_text(b),
            _ => false,
        }
    }

    /// Return a copy whose text, if any, is already folded, so repeated
    /// comparisons only fold the record side.
    pub fn folded(&self) -> FieldValue {
        match self {
            FieldValue::Integer(n) => FieldValue::Integer(*n),
            FieldValue::Text(s) => FieldValue::Text(fold_text(s)),
        }
    }

    /// Like [`FieldValue::matches`] but assumes `self` was produced by
    /// [`FieldValue::folded`].
    pub fn matches_folded(&self, other: FieldRef<'_>) -> bool {
        match (self, other) {
            (FieldValue::Integer(a), FieldRef::Integer(b)) => *a == b,
            (FieldValue::Text(a), FieldRef::Text(b)) => *a == fold_text(b),
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Integer(i64::from(n))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// A field value borrowed from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef<'a> {
    Integer(i64),
    Text(&'a str),
}

/// Lowercase and treat `-` as a space, so `"Emilia-Romagna"` equals
/// `"emilia romagna"`.
pub fn fold_text(s: &str) -> String {
    s.to_lowercase().replace('-', " ")
}
