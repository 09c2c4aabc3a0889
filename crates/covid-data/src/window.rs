//! The most recent reporting day's slice of a dataset and rankings over it.

use covid_core::fields::fold_text;
use covid_core::metrics::Metric;
use covid_core::models::{DailyRecord, ProvinceRecord, RegionGroup, RegionRecord};
use covid_core::time_utils::same_calendar_day;
use covid_core::{Result, SeriesError};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Records of the most recent reporting day.
///
/// Scans backward from the last record while the full calendar date (year,
/// month and day) matches the last record's, so `01-31` and `02-01` are
/// always distinct days.
pub fn latest_window<R: DailyRecord>(dataset: &Dataset<R>) -> Result<&[R]> {
    let records = dataset.records();
    let Some(last) = records.last() else {
        return Err(SeriesError::not_found("date", "latest reporting day"));
    };
    let latest = last.report_date()?;

    let mut start = records.len() - 1;
    while start > 0 {
        if !same_calendar_day(records[start - 1].report_date()?, latest) {
            break;
        }
        start -= 1;
    }
    Ok(&records[start..])
}

/// The `n` entities of the latest window with the highest `metric`,
/// descending. Placeholders are left out and ties keep dataset order.
pub fn top_n<R: DailyRecord>(dataset: &Dataset<R>, metric: Metric, n: usize) -> Result<Vec<&R>> {
    let mut ranked = Vec::new();
    for record in latest_window(dataset)? {
        if record.is_placeholder() {
            continue;
        }
        let value = record.metric(metric).ok_or_else(|| {
            SeriesError::InvalidSelector(format!(
                "{} is not published for {} data",
                metric,
                R::GRANULARITY
            ))
        })?;
        ranked.push((value, record));
    }
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(ranked.into_iter().take(n).map(|(_, record)| record).collect())
}

/// One row of a ranked leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based.
    pub rank: usize,
    pub code: Option<i64>,
    pub name: Option<String>,
    pub value: i64,
}

/// [`top_n`] as serialisable rows.
pub fn leaderboard<R: DailyRecord>(
    dataset: &Dataset<R>,
    metric: Metric,
    n: usize,
) -> Result<Vec<LeaderboardEntry>> {
    Ok(top_n(dataset, metric, n)?
        .into_iter()
        .enumerate()
        .map(|(i, record)| LeaderboardEntry {
            rank: i + 1,
            code: record.entity_code(),
            name: record.entity_name().map(str::to_string),
            value: record.metric(metric).unwrap_or_default(),
        })
        .collect())
}

/// Display names of the entities in the latest window, in dataset order.
pub fn entity_names<R: DailyRecord>(dataset: &Dataset<R>) -> Result<Vec<&str>> {
    Ok(latest_window(dataset)?
        .iter()
        .filter(|r| !r.is_placeholder())
        .filter_map(|r| r.entity_name())
        .collect())
}

/// Latest provincial records of one region, placeholders excluded.
pub fn latest_provinces_in_region<'a>(
    dataset: &'a Dataset<ProvinceRecord>,
    region_name: &str,
) -> Result<Vec<&'a ProvinceRecord>> {
    let wanted = fold_text(region_name.trim());
    let provinces: Vec<_> = latest_window(dataset)?
        .iter()
        .filter(|r| !r.is_placeholder() && fold_text(&r.region_name) == wanted)
        .collect();
    if provinces.is_empty() {
        return Err(SeriesError::not_found("region", region_name));
    }
    Ok(provinces)
}

/// Latest regional records belonging to `group`.
pub fn region_group_window(
    dataset: &Dataset<RegionRecord>,
    group: RegionGroup,
) -> Result<Vec<&RegionRecord>> {
    Ok(latest_window(dataset)?
        .iter()
        .filter(|r| RegionGroup::of(&r.region_name) == Some(group))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::*;

    // ── latest_window ─────────────────────────────────────────────────────────

    #[test]
    fn test_latest_window_scenario() {
        let dataset = Dataset::ingest(alpha_beta_regions()).unwrap();
        let window = latest_window(&dataset).unwrap();
        let values: Vec<(&str, i64)> = window
            .iter()
            .map(|r| (r.region_name.as_str(), r.counts.total_cases))
            .collect();
        assert_eq!(values, vec![("Alpha", 15), ("Beta", 9)]);
    }

    #[test]
    fn test_latest_window_across_month_boundary() {
        let records = vec![
            region("2020-01-31T18:00:00", 1, "Alpha", 1),
            region("2020-01-31T18:00:00", 2, "Beta", 1),
            region("2020-02-01T18:00:00", 1, "Alpha", 2),
            region("2020-02-01T18:00:00", 2, "Beta", 2),
        ];
        let dataset = Dataset::ingest(records).unwrap();
        let window = latest_window(&dataset).unwrap();
        assert_eq!(window.len(), 2);
        assert!(window.iter().all(|r| r.date.starts_with("2020-02-01")));
    }

    #[test]
    fn test_latest_window_same_day_of_month_different_month() {
        // Same day-of-month one month apart must not merge.
        let records = vec![
            province("2020-03-01T17:00:00", 16, "Bergamo", "Lombardia", 1),
            province("2020-04-01T17:00:00", 16, "Bergamo", "Lombardia", 9),
            province("2020-04-01T17:00:00", 17, "Brescia", "Lombardia", 3),
        ];
        let dataset = Dataset::ingest(records).unwrap();
        assert_eq!(latest_window(&dataset).unwrap().len(), 2);
    }

    #[test]
    fn test_latest_window_single_day_dataset() {
        let records = alpha_beta_regions().into_iter().take(2).collect();
        let dataset = Dataset::ingest(records).unwrap();
        assert_eq!(latest_window(&dataset).unwrap().len(), 2);
    }

    #[test]
    fn test_latest_window_empty_dataset() {
        let dataset: Dataset<RegionRecord> = Dataset::ingest(Vec::new()).unwrap();
        assert!(matches!(
            latest_window(&dataset),
            Err(SeriesError::NotFound { .. })
        ));
    }

    #[test]
    fn test_latest_window_malformed_date() {
        let mut records = irregular_provinces();
        records[7].date = "yesterday".to_string();
        let dataset = Dataset::ingest(records).unwrap();
        assert!(matches!(
            latest_window(&dataset),
            Err(SeriesError::MalformedDate(_))
        ));
    }

    // ── top_n ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_top_n_scenario() {
        let dataset = Dataset::ingest(alpha_beta_regions()).unwrap();
        let top = top_n(&dataset, Metric::TotalCases, 1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].region_name, "Alpha");
    }

    #[test]
    fn test_top_n_excludes_placeholders() {
        let dataset = Dataset::ingest(irregular_provinces()).unwrap();
        let top = top_n(&dataset, Metric::TotalCases, 10).unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.province_name.as_str()).collect();
        assert_eq!(names, vec!["Bergamo", "Brescia", "Cremona"]);
    }

    #[test]
    fn test_top_n_ties_keep_dataset_order() {
        let records = vec![
            region("2020-03-01T18:00:00", 1, "Alpha", 5),
            region("2020-03-01T18:00:00", 2, "Beta", 7),
            region("2020-03-01T18:00:00", 3, "Gamma", 5),
        ];
        let dataset = Dataset::ingest(records).unwrap();
        let top = top_n(&dataset, Metric::TotalCases, 3).unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.region_name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha", "Gamma"]);
    }

    #[test]
    fn test_top_n_by_other_metric() {
        let dataset = Dataset::ingest(alpha_beta_regions()).unwrap();
        // Deaths are total / 10 in the fixture: Alpha 1, Beta 0.
        let top = top_n(&dataset, Metric::Deaths, 2).unwrap();
        assert_eq!(top[0].region_name, "Alpha");
    }

    #[test]
    fn test_top_n_unpublished_metric() {
        let dataset = Dataset::ingest(irregular_provinces()).unwrap();
        let err = top_n(&dataset, Metric::Recovered, 3).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidSelector(_)));
    }

    #[test]
    fn test_leaderboard_ranks() {
        let dataset = Dataset::ingest(alpha_beta_regions()).unwrap();
        let board = leaderboard(&dataset, Metric::TotalCases, 5).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].code, Some(1));
        assert_eq!(board[1].name.as_deref(), Some("Beta"));
        assert_eq!(board[1].value, 9);
    }

    // ── Supplementary views ───────────────────────────────────────────────────

    #[test]
    fn test_entity_names_skip_placeholders() {
        let dataset = Dataset::ingest(irregular_provinces()).unwrap();
        assert_eq!(
            entity_names(&dataset).unwrap(),
            vec!["Brescia", "Cremona", "Bergamo"]
        );
    }

    #[test]
    fn test_latest_provinces_in_region() {
        let mut records = irregular_provinces();
        records.push(province("2020-03-03T17:00:00", 58, "Roma", "Lazio", 50));
        let dataset = Dataset::ingest(records).unwrap();

        let lombardia = latest_provinces_in_region(&dataset, "lombardia").unwrap();
        assert_eq!(lombardia.len(), 3);
        let lazio = latest_provinces_in_region(&dataset, "Lazio").unwrap();
        assert_eq!(lazio[0].province_name, "Roma");
        assert!(matches!(
            latest_provinces_in_region(&dataset, "Molise"),
            Err(SeriesError::NotFound { .. })
        ));
    }

    #[test]
    fn test_region_group_window() {
        let records = vec![
            region("2020-03-01T18:00:00", 3, "Lombardia", 10),
            region("2020-03-01T18:00:00", 12, "Lazio", 4),
            region("2020-03-01T18:00:00", 8, "Emilia-Romagna", 6),
        ];
        let dataset = Dataset::ingest(records).unwrap();
        let north = region_group_window(&dataset, RegionGroup::North).unwrap();
        let names: Vec<&str> = north.iter().map(|r| r.region_name.as_str()).collect();
        assert_eq!(names, vec!["Lombardia", "Emilia-Romagna"]);
        assert_eq!(
            region_group_window(&dataset, RegionGroup::South).unwrap().len(),
            0
        );
    }
}
