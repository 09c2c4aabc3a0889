use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// A countable quantity carried by a daily record.
///
/// All variants except [`Metric::NewCases`] are cumulative values published
/// as-is. `NewCases` is derived from `TotalCases` after ingestion and only
/// exists for provincial records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    HospitalizedWithSymptoms,
    IntensiveCare,
    TotalHospitalized,
    HomeIsolation,
    TotalPositive,
    NewPositive,
    Recovered,
    Deaths,
    TotalCases,
    Tests,
    NewCases,
}

impl Metric {
    /// Every metric, in published column order.
    pub const ALL: [Metric; 11] = [
        Metric::HospitalizedWithSymptoms,
        Metric::IntensiveCare,
        Metric::TotalHospitalized,
        Metric::HomeIsolation,
        Metric::TotalPositive,
        Metric::NewPositive,
        Metric::Recovered,
        Metric::Deaths,
        Metric::TotalCases,
        Metric::Tests,
        Metric::NewCases,
    ];

    /// The key used for this metric in the published JSON files.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::HospitalizedWithSymptoms => "ricoverati_con_sintomi",
            Metric::IntensiveCare => "terapia_intensiva",
            Metric::TotalHospitalized => "totale_ospedalizzati",
            Metric::HomeIsolation => "isolamento_domiciliare",
            Metric::TotalPositive => "totale_positivi",
            Metric::NewPositive => "nuovi_positivi",
            Metric::Recovered => "dimessi_guariti",
            Metric::Deaths => "deceduti",
            Metric::TotalCases => "totale_casi",
            Metric::Tests => "tamponi",
            Metric::NewCases => "nuovi_casi",
        }
    }

    /// `true` for values derived after ingestion rather than published.
    pub fn is_derived(&self) -> bool {
        matches!(self, Metric::NewCases)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = SeriesError;

    /// Accepts the published Italian key, its historical alias
    /// `attualmente_positivi`, or the snake_case English name. Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let metric = match lower.as_str() {
            "ricoverati_con_sintomi" | "hospitalized_with_symptoms" => {
                Metric::HospitalizedWithSymptoms
            }
            "terapia_intensiva" | "intensive_care" => Metric::IntensiveCare,
            "totale_ospedalizzati" | "total_hospitalized" => Metric::TotalHospitalized,
            "isolamento_domiciliare" | "home_isolation" => Metric::HomeIsolation,
            "totale_positivi" | "attualmente_positivi" | "total_positive" => {
                Metric::TotalPositive
            }
            "nuovi_positivi" | "new_positive" => Metric::NewPositive,
            "dimessi_guariti" | "recovered" => Metric::Recovered,
            "deceduti" | "deaths" => Metric::Deaths,
            "totale_casi" | "total_cases" => Metric::TotalCases,
            "tamponi" | "tests" => Metric::Tests,
            "nuovi_casi" | "new_cases" => Metric::NewCases,
            _ => {
                return Err(SeriesError::InvalidSelector(format!(
                    "unknown metric \"{}\"",
                    s
                )))
            }
        };
        Ok(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parse_published_keys() {
        for metric in Metric::ALL {
            assert_eq!(metric.key().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn test_metric_parse_aliases() {
        assert_eq!(
            "attualmente_positivi".parse::<Metric>().unwrap(),
            Metric::TotalPositive
        );
        assert_eq!("Total_Cases".parse::<Metric>().unwrap(), Metric::TotalCases);
        assert_eq!("new_cases".parse::<Metric>().unwrap(), Metric::NewCases);
    }

    #[test]
    fn test_metric_parse_unknown() {
        let err = "positivity_rate".parse::<Metric>().unwrap_err();
        assert!(matches!(err, SeriesError::InvalidSelector(_)));
    }

    #[test]
    fn test_metric_only_new_cases_is_derived() {
        let derived: Vec<Metric> = Metric::ALL.into_iter().filter(|m| m.is_derived()).collect();
        assert_eq!(derived, vec![Metric::NewCases]);
    }

    #[test]
    fn test_metric_serde_snake_case() {
        let json = serde_json::to_string(&Metric::IntensiveCare).unwrap();
        assert_eq!(json, r#""intensive_care""#);
    }
}
