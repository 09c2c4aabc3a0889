//! Text and JSON rendering of the report views.

use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use covid_core::formatting::{format_count, SignedDelta};
use covid_core::metrics::Metric;
use covid_core::models::{DailyRecord, Granularity, ProvinceRecord};
use covid_core::settings::Settings;
use covid_core::time_utils::report_day;
use covid_data::analysis::DatasetBundle;
use covid_data::dataset::Dataset;
use covid_data::extractor::{extract, EntitySelector};
use covid_data::notes::NoteTable;
use covid_data::window::{latest_provinces_in_region, leaderboard};

/// What to render, resolved from [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub view: View,
    pub granularity: Granularity,
    pub entity: Option<String>,
    pub metric: Metric,
    pub top: usize,
    pub since: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Leaderboard,
    Series,
    Provinces,
    Notes,
}

impl ReportRequest {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let view = match settings.view.as_str() {
            "leaderboard" => View::Leaderboard,
            "series" => View::Series,
            "provinces" => View::Provinces,
            "notes" => View::Notes,
            other => bail!("unknown view: {other}"),
        };
        let granularity = match settings.granularity.as_str() {
            "nation" => Granularity::Nation,
            "region" => Granularity::Region,
            "province" => Granularity::Province,
            other => bail!("unknown granularity: {other}"),
        };
        let metric = Metric::from_str(&settings.metric)?;
        let since = settings
            .since
            .as_deref()
            .map(report_day)
            .transpose()
            .context("invalid --since date")?;

        Ok(Self {
            view,
            granularity,
            entity: settings.entity.clone(),
            metric,
            top: settings.top as usize,
            since,
        })
    }
}

/// Render `request` against `bundle`.
pub fn render(bundle: &DatasetBundle, request: &ReportRequest) -> Result<String> {
    match request.view {
        View::Leaderboard => match request.granularity {
            Granularity::Nation => render_leaderboard(&bundle.nation.data, request),
            Granularity::Region => render_leaderboard(&bundle.regions.data, request),
            Granularity::Province => render_leaderboard(&bundle.provinces.data, request),
        },
        View::Series => match request.granularity {
            Granularity::Nation => render_series(&bundle.nation.data, request),
            Granularity::Region => render_series(&bundle.regions.data, request),
            Granularity::Province => render_series(&bundle.provinces.data, request),
        },
        View::Provinces => {
            let region = request
                .entity
                .as_deref()
                .context("the provinces view needs --entity <region name>")?;
            render_provinces(&bundle.provinces.data, region)
        }
        View::Notes => render_notes(&bundle.notes.data, request.entity.as_deref()),
    }
}

/// Ranked table of the latest reporting day.
pub fn render_leaderboard<R: DailyRecord>(
    dataset: &Dataset<R>,
    request: &ReportRequest,
) -> Result<String> {
    let rows = leaderboard(dataset, request.metric, request.top)?;
    let mut out = String::new();
    writeln!(out, "{} by {}", R::GRANULARITY, request.metric)?;
    for row in rows {
        writeln!(
            out,
            "{:>3}. {:<36} {:>14}",
            row.rank,
            row.name.as_deref().unwrap_or("Italia"),
            format_count(row.value)
        )?;
    }
    Ok(out)
}

/// Pretty-printed JSON [`TimeSeries`](covid_data::extractor::TimeSeries).
pub fn render_series<R: DailyRecord>(
    dataset: &Dataset<R>,
    request: &ReportRequest,
) -> Result<String> {
    let selector = match (&request.entity, R::GRANULARITY) {
        (_, Granularity::Nation) => EntitySelector::Whole,
        (Some(entity), _) => EntitySelector::parse(entity),
        (None, granularity) => bail!("the series view needs --entity for {granularity} data"),
    };

    let mut series = extract(dataset, &selector)?;
    if let Some(since) = request.since {
        series = series.starting_at(since);
    }
    let ts = series.time_series(request.metric)?;
    Ok(serde_json::to_string_pretty(&ts)?)
}

/// Latest provincial totals of one region with their daily new cases.
pub fn render_provinces(dataset: &Dataset<ProvinceRecord>, region: &str) -> Result<String> {
    let mut provinces = latest_provinces_in_region(dataset, region)?;
    provinces.sort_by(|a, b| b.total_cases.cmp(&a.total_cases));

    let mut out = String::new();
    writeln!(out, "{region}")?;
    for p in provinces {
        let change = latest_change(dataset, p)?;
        writeln!(
            out,
            "  {:<4} {:<28} {:>12} {:>8}",
            p.province_abbreviation.as_deref().unwrap_or("--"),
            p.province_name,
            format_count(p.total_cases),
            change.label()
        )?;
    }
    Ok(out)
}

/// Signed change of `province`'s total since its previous report. The
/// stored `new_cases` is the magnitude of this same value.
fn latest_change(
    dataset: &Dataset<ProvinceRecord>,
    province: &ProvinceRecord,
) -> Result<SignedDelta> {
    let series = extract(dataset, &EntitySelector::Code(province.province_code))?;
    let change = match series.points() {
        [.., previous, current] => {
            SignedDelta::between(previous.record.total_cases, current.record.total_cases)
        }
        _ => SignedDelta::between(0, province.total_cases),
    };
    Ok(change)
}

/// Advisory notes, filtered to a region or province when `entity` is given.
pub fn render_notes(notes: &NoteTable, entity: Option<&str>) -> Result<String> {
    let selected: Vec<_> = match entity {
        Some(name) => {
            let by_region = notes.for_region(name);
            if by_region.is_empty() {
                notes.for_province(name)
            } else {
                by_region
            }
        }
        None => notes.iter().collect(),
    };

    let mut out = String::new();
    for note in selected {
        let place = [note.region.as_str(), note.province.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" / ");
        writeln!(out, "[{}] {} {}", note.date, note.code, place)?;
        if !note.notice.is_empty() {
            writeln!(out, "    {}", note.notice)?;
        }
        if !note.note.is_empty() {
            writeln!(out, "    {}", note.note)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use covid_core::models::{CumulativeCounts, NoteRecord, RegionRecord, NEW_CASES_UNRESOLVED};
    use covid_data::delta::compute_new_cases;

    fn request(view: View, granularity: Granularity, entity: Option<&str>) -> ReportRequest {
        ReportRequest {
            view,
            granularity,
            entity: entity.map(str::to_string),
            metric: Metric::TotalCases,
            top: 10,
            since: None,
        }
    }

    fn region(date: &str, code: i64, name: &str, total_cases: i64) -> RegionRecord {
        RegionRecord {
            date: date.to_string(),
            country: "ITA".to_string(),
            region_code: code,
            region_name: name.to_string(),
            lat: None,
            long: None,
            counts: CumulativeCounts {
                total_cases,
                ..Default::default()
            },
            note: None,
        }
    }

    fn province(date: &str, code: i64, name: &str, abbr: &str, total: i64) -> ProvinceRecord {
        ProvinceRecord {
            date: date.to_string(),
            country: "ITA".to_string(),
            region_code: 3,
            region_name: "Lombardia".to_string(),
            province_code: code,
            province_name: name.to_string(),
            province_abbreviation: Some(abbr.to_string()),
            lat: None,
            long: None,
            total_cases: total,
            note: None,
            new_cases: NEW_CASES_UNRESOLVED,
        }
    }

    fn regions() -> Dataset<RegionRecord> {
        Dataset::ingest(vec![
            region("2020-03-01T18:00:00", 1, "Alpha", 10),
            region("2020-03-01T18:00:00", 2, "Beta", 5),
            region("2020-03-02T18:00:00", 1, "Alpha", 1500),
            region("2020-03-02T18:00:00", 2, "Beta", 9),
        ])
        .unwrap()
    }

    // ── ReportRequest ─────────────────────────────────────────────────────────

    #[test]
    fn test_request_from_settings() {
        let settings = Settings::try_parse_from([
            "covid-series",
            "--view",
            "series",
            "--granularity",
            "province",
            "--entity",
            "Bergamo",
            "--metric",
            "nuovi_casi",
            "--since",
            "2020-03-10",
        ])
        .unwrap();
        let req = ReportRequest::from_settings(&settings).unwrap();
        assert_eq!(req.view, View::Series);
        assert_eq!(req.granularity, Granularity::Province);
        assert_eq!(req.metric, Metric::NewCases);
        assert_eq!(req.since, NaiveDate::from_ymd_opt(2020, 3, 10));
    }

    #[test]
    fn test_request_rejects_bad_since() {
        let settings =
            Settings::try_parse_from(["covid-series", "--since", "10/03/2020"]).unwrap();
        assert!(ReportRequest::from_settings(&settings).is_err());
    }

    // ── Views ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_leaderboard() {
        let out = render_leaderboard(
            &regions(),
            &request(View::Leaderboard, Granularity::Region, None),
        )
        .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "region by totale_casi");
        assert!(lines[1].contains("Alpha") && lines[1].contains("1,500"));
        assert!(lines[2].starts_with("  2. Beta"));
    }

    #[test]
    fn test_render_series_json() {
        let mut req = request(View::Series, Granularity::Region, Some("2"));
        req.since = NaiveDate::from_ymd_opt(2020, 3, 1);
        let out = render_series(&regions(), &req).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["entity"], "Beta");
        assert_eq!(value["points"][1]["value"], 9);
        assert_eq!(value["annotations"][0]["label"], "+4");
    }

    #[test]
    fn test_render_series_requires_entity() {
        let req = request(View::Series, Granularity::Region, None);
        assert!(render_series(&regions(), &req).is_err());
    }

    #[test]
    fn test_render_provinces_sorted_with_new_cases() {
        let mut dataset = Dataset::ingest(vec![
            province("2020-03-01T17:00:00", 16, "Bergamo", "BG", 10),
            province("2020-03-01T17:00:00", 98, "Lodi", "LO", 40),
            province("2020-03-02T17:00:00", 16, "Bergamo", "BG", 60),
            province("2020-03-02T17:00:00", 98, "Lodi", "LO", 45),
        ])
        .unwrap();
        compute_new_cases(&mut dataset);

        let out = render_provinces(&dataset, "lombardia").unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "lombardia");
        assert!(lines[1].contains("Bergamo") && lines[1].trim_end().ends_with("+50"));
        assert!(lines[2].contains("Lodi") && lines[2].trim_end().ends_with("+5"));
    }

    #[test]
    fn test_render_provinces_downward_correction_is_negative() {
        let mut dataset = Dataset::ingest(vec![
            province("2020-03-01T17:00:00", 16, "Bergamo", "BG", 25),
            province("2020-03-02T17:00:00", 16, "Bergamo", "BG", 20),
        ])
        .unwrap();
        compute_new_cases(&mut dataset);
        assert_eq!(dataset.records()[1].new_cases, 5);

        let out = render_provinces(&dataset, "Lombardia").unwrap();
        let line = out.lines().nth(1).unwrap();
        assert!(line.trim_end().ends_with("-5"), "got {line:?}");
    }

    #[test]
    fn test_render_provinces_first_report_uses_own_total() {
        let dataset =
            Dataset::ingest(vec![province("2020-02-24T17:00:00", 16, "Bergamo", "BG", 3)]).unwrap();
        let out = render_provinces(&dataset, "Lombardia").unwrap();
        assert!(out.lines().nth(1).unwrap().trim_end().ends_with("+3"));
    }

    #[test]
    fn test_render_notes_filtered() {
        let notes = NoteTable::new(vec![
            NoteRecord {
                code: "ITA-1".to_string(),
                date: "2020-03-10".to_string(),
                region: "Lombardia".to_string(),
                notice: "Ricalcolo".to_string(),
                ..Default::default()
            },
            NoteRecord {
                code: "ITA-2".to_string(),
                date: "2020-03-11".to_string(),
                region: "Lazio".to_string(),
                province: "Roma".to_string(),
                note: "ritardo".to_string(),
                ..Default::default()
            },
        ]);

        let all = render_notes(&notes, None).unwrap();
        assert!(all.contains("ITA-1") && all.contains("ITA-2"));

        let roma = render_notes(&notes, Some("roma")).unwrap();
        assert!(roma.contains("Lazio / Roma"));
        assert!(roma.contains("ritardo"));
        assert!(!roma.contains("ITA-1"));
    }
}
