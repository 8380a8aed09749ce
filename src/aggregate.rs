//! Aggregate views over a record collection: studies per country and per start year.

use crate::country::canonicalize_optional;
use crate::record::TrialRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const COUNTRY_COLUMNS: &[&str] = &["country", "count"];
pub const TREND_COLUMNS: &[&str] = &["start_year", "count"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub start_year: i32,
    pub count: usize,
}

/// Studies per canonical country, largest first (ties by name).
///
/// Records without a country are left out.
pub fn country_counts(records: &[TrialRecord]) -> Vec<CountryCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for country in records
        .iter()
        .filter_map(|r| canonicalize_optional(r.country.as_deref()))
    {
        *counts.entry(country).or_default() += 1;
    }

    let mut rows: Vec<CountryCount> = counts
        .into_iter()
        .map(|(country, count)| CountryCount { country, count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.country.cmp(&b.country)));
    rows
}

/// Studies per start year in ascending year order; records without a year are dropped.
pub fn year_trend(records: &[TrialRecord]) -> Vec<YearCount> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for year in records.iter().filter_map(|r| r.start_year) {
        *counts.entry(year).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(start_year, count)| YearCount { start_year, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: Option<i32>, country: Option<&str>) -> TrialRecord {
        TrialRecord {
            start_year: year,
            country: country.map(str::to_string),
            ..TrialRecord::new("NCT0")
        }
    }

    #[test]
    fn test_country_counts() {
        let records = vec![
            record(None, Some("USA")),
            record(None, Some("United States")),
            record(None, Some("germany")),
            record(None, Some("France")),
            record(None, None),
        ];
        let counts = country_counts(&records);
        assert_eq!(
            counts,
            vec![
                CountryCount { country: "United States".into(), count: 2 },
                CountryCount { country: "France".into(), count: 1 },
                CountryCount { country: "Germany".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(country_counts(&[]).is_empty());
        assert!(country_counts(&[record(Some(2020), None)]).is_empty());
        assert!(year_trend(&[]).is_empty());
    }

    #[test]
    fn test_year_trend_ascending() {
        let records = vec![
            record(Some(2021), None),
            record(Some(2014), None),
            record(None, None),
            record(Some(2021), None),
        ];
        assert_eq!(
            year_trend(&records),
            vec![
                YearCount { start_year: 2014, count: 1 },
                YearCount { start_year: 2021, count: 2 },
            ]
        );
    }
}
