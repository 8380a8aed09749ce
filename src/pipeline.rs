//! Browser extraction pipeline.
//!
//! Walks the registry's search results for a condition, collects distinct
//! trial identifiers up to a target count, visits each study page for its
//! title and start year, and persists the records as a run artifact.
//!
//! Every browser interaction is awaited in sequence. Misses on a single study
//! degrade that study only; a missing pagination control just ends the scan.

use crate::browser::{ChromeBrowser, PageAdvance, StudyBrowser};
use crate::error::{Result, TrialsError};
use crate::extract::{result_rows, study_detail, StudyDetail};
use crate::record::{write_artifact, TrialRecord};
use rand::Rng;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Public search view
pub const SEARCH_URL: &str = "https://clinicaltrials.gov/search";

/// Titles containing this (case-insensitive) are excluded from the output.
pub const UNKNOWN_STATUS_MARKER: &str = "unknown status";

/// Default per-wait timeout in milliseconds
pub const DEFAULT_WAIT_MS: u64 = 30_000;

/// Knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Upper bound on any single browser wait
    pub wait: Duration,
    pub headless: bool,
    /// Chrome/Chromium executable; autodetected when `None`
    pub chrome: Option<PathBuf>,
    /// Base of the randomized pause between study pages, 0 disables it
    pub detail_delay_ms: u64,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(DEFAULT_WAIT_MS),
            headless: true,
            chrome: None,
            detail_delay_ms: 500,
        }
    }
}

/// A result-list entry selected for detail resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub nct_id: String,
    pub url: Option<Url>,
    pub list_title: Option<String>,
    pub country: Option<String>,
}

/// Search URL for `disease`.
pub fn search_url(disease: &str) -> Result<Url> {
    let disease = disease.trim();
    if disease.is_empty() {
        return Err(TrialsError::Validation("Disease query must not be empty".to_string()));
    }
    let mut url = Url::parse(SEARCH_URL).map_err(|e| TrialsError::Config(e.to_string()))?;
    url.query_pairs_mut().append_pair("cond", disease);
    Ok(url)
}

/// Scan result pages until `max` distinct identifiers are collected or the
/// results run out.
pub async fn collect_candidates<B: StudyBrowser>(
    browser: &mut B,
    base: &Url,
    max: usize,
) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();
    let mut page = 1;

    while candidates.len() < max {
        let Some(html) = browser.results_snapshot().await else {
            info!(page, "No results rendered, stopping scan");
            break;
        };

        let mut fresh = 0;
        for row in result_rows(&html, base) {
            if candidates.len() >= max {
                break;
            }
            let Some(nct_id) = row.nct_id else { continue };
            if !seen.insert(nct_id.clone()) {
                continue;
            }
            fresh += 1;
            candidates.push(Candidate {
                nct_id,
                url: row.url,
                list_title: row.brief_title,
                country: row.country,
            });
        }
        debug!(page, fresh, total = candidates.len(), "Scanned results page");

        if candidates.len() >= max {
            break;
        }
        if fresh == 0 {
            info!(page, "Results page added nothing new, stopping scan");
            break;
        }

        match browser.next_page().await {
            PageAdvance::Advanced => page += 1,
            PageAdvance::NoControl => {
                debug!(page, "No next-page control");
                break;
            }
            PageAdvance::Disabled => {
                debug!(page, "Next-page control disabled");
                break;
            }
            PageAdvance::Failed(e) => {
                warn!(page, error = %e, "Failed to advance results page");
                break;
            }
        }
    }

    info!(count = candidates.len(), pages = page, "Collected candidates");
    candidates
}

/// Random pause in `base_ms..=3 * base_ms`.
fn polite_delay_ms(base_ms: u64) -> u64 {
    rand::thread_rng().gen_range(base_ms..=base_ms.saturating_mul(3))
}

async fn polite_delay(base_ms: u64) {
    if base_ms == 0 {
        return;
    }
    tokio::time::sleep(Duration::from_millis(polite_delay_ms(base_ms))).await;
}

/// Visit each candidate's study page and build the output records.
///
/// Candidates without a study link are dropped. Only a title read from the
/// study page can exclude a study as unknown-status; the list title is a
/// fallback for the output only.
pub async fn resolve_records<B: StudyBrowser>(
    browser: &mut B,
    candidates: Vec<Candidate>,
    max: usize,
    detail_delay_ms: u64,
) -> Vec<TrialRecord> {
    let mut records = Vec::new();
    let mut visited = 0usize;

    for candidate in candidates.into_iter().take(max) {
        let Some(url) = candidate.url else {
            debug!(nct_id = %candidate.nct_id, "No study link, dropping candidate");
            continue;
        };

        if visited > 0 {
            polite_delay(detail_delay_ms).await;
        }
        visited += 1;

        let detail = match browser.study_snapshot(&url).await {
            Ok(html) => study_detail(&html),
            Err(e) => {
                warn!(nct_id = %candidate.nct_id, error = %e, "Failed to load study page");
                StudyDetail::default()
            }
        };

        if let Some(title) = &detail.title {
            if title.to_lowercase().contains(UNKNOWN_STATUS_MARKER) {
                info!(nct_id = %candidate.nct_id, "Excluding study with unknown status");
                continue;
            }
        }

        let title = detail.title.or(candidate.list_title);
        if title.is_none() {
            warn!("WARN_TITLE_NONE nctId={} url={}", candidate.nct_id, url);
        }

        records.push(TrialRecord {
            nct_id: candidate.nct_id,
            brief_title: title,
            start_year: detail.start_year,
            country: candidate.country,
        });
    }

    records
}

/// Full pipeline against an already launched browser.
pub async fn run_pipeline<B: StudyBrowser>(
    browser: &mut B,
    disease: &str,
    max: usize,
    detail_delay_ms: u64,
) -> Result<Vec<TrialRecord>> {
    let url = search_url(disease)?;
    if max == 0 {
        return Ok(Vec::new());
    }
    browser.open_search(&url).await?;
    let candidates = collect_candidates(browser, &url, max).await;
    Ok(resolve_records(browser, candidates, max, detail_delay_ms).await)
}

/// Launch a browser, run the pipeline and write the artifact to `output`.
///
/// Returns the number of records written.
pub async fn scrape(disease: &str, max: usize, output: &Path, options: &ScrapeOptions) -> Result<usize> {
    let mut browser = ChromeBrowser::launch(options).await?;
    let result = run_pipeline(&mut browser, disease, max, options.detail_delay_ms).await;
    browser.shutdown().await;

    let records = result?;
    write_artifact(output, &records)?;
    info!(disease, count = records.len(), output = %output.display(), "Pipeline finished");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Serves canned result pages and study pages.
    struct FakeBrowser {
        pages: Vec<String>,
        current: usize,
        studies: HashMap<String, String>,
        last_page: PageAdvance,
        opened: Vec<Url>,
    }

    impl FakeBrowser {
        fn new(pages: Vec<String>) -> Self {
            Self {
                pages,
                current: 0,
                studies: HashMap::new(),
                last_page: PageAdvance::Disabled,
                opened: Vec::new(),
            }
        }

        fn study(mut self, id: &str, html: &str) -> Self {
            self.studies
                .insert(format!("https://clinicaltrials.gov/study/{id}"), html.to_string());
            self
        }
    }

    impl StudyBrowser for FakeBrowser {
        async fn open_search(&mut self, _url: &Url) -> Result<()> {
            Ok(())
        }

        async fn results_snapshot(&mut self) -> Option<String> {
            self.pages.get(self.current).cloned()
        }

        async fn next_page(&mut self) -> PageAdvance {
            if self.current + 1 < self.pages.len() {
                self.current += 1;
                PageAdvance::Advanced
            } else {
                self.last_page.clone()
            }
        }

        async fn study_snapshot(&mut self, url: &Url) -> Result<String> {
            self.opened.push(url.clone());
            self.studies
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| TrialsError::Browser(format!("navigation failed: {url}")))
        }
    }

    fn card(id: &str, title: &str, location: &str) -> String {
        format!(
            r#"<div class="card"><header><a href="/study/{id}">{title}</a></header>
               <div><span class="nct-id">{id}</span></div>
               <div class="cities-grid"><div class="location-text"><span>{location}</span></div></div></div>"#
        )
    }

    fn page(cards: &[String]) -> String {
        format!("<html><body><div class=\"list\">{}</div></body></html>", cards.concat())
    }

    fn detail(title: &str, start: &str) -> String {
        format!(
            r#"<html><body><h2 class="brief-title">{title}</h2>
               <div class="overview-col-wide"><span class="study-overview-item-text">{start}</span></div></body></html>"#
        )
    }

    #[test]
    fn test_search_url() -> Result<()> {
        let url = search_url("  lung cancer ")?;
        assert_eq!(url.as_str(), "https://clinicaltrials.gov/search?cond=lung+cancer");
        assert!(matches!(search_url(" "), Err(TrialsError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_pipeline_dedups_and_paginates() -> Result<()> {
        let pages = vec![
            page(&[card("NCT00000001", "One", "Paris, France"), card("NCT00000002", "Two", "Berlin, Germany")]),
            page(&[card("NCT00000002", "Two", "Berlin, Germany"), card("NCT00000003", "Three", "Lima, Peru")]),
        ];
        let mut browser = FakeBrowser::new(pages)
            .study("NCT00000001", &detail("Study One", "January 2015"))
            .study("NCT00000002", &detail("Study Two", "2018-04"))
            .study("NCT00000003", &detail("Study Three", "unknown"));

        let records = run_pipeline(&mut browser, "asthma", 10, 0).await?;
        let ids: Vec<&str> = records.iter().map(|r| r.nct_id.as_str()).collect();
        assert_eq!(ids, vec!["NCT00000001", "NCT00000002", "NCT00000003"]);
        assert_eq!(records[0].brief_title.as_deref(), Some("Study One"));
        assert_eq!(records[0].start_year, Some(2015));
        assert_eq!(records[0].country.as_deref(), Some("France"));
        assert_eq!(records[1].start_year, Some(2018));
        assert_eq!(records[2].start_year, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_pipeline_respects_max() -> Result<()> {
        let pages = vec![page(&[
            card("NCT00000001", "One", "France"),
            card("NCT00000002", "Two", "France"),
            card("NCT00000003", "Three", "France"),
        ])];
        let mut browser = FakeBrowser::new(pages);

        let records = run_pipeline(&mut browser, "asthma", 2, 0).await?;
        assert_eq!(records.len(), 2);
        assert_eq!(browser.opened.len(), 2);

        let none = run_pipeline(&mut browser, "asthma", 0, 0).await?;
        assert!(none.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_excluded() -> Result<()> {
        let pages = vec![page(&[
            card("NCT00000001", "One", "France"),
            card("NCT00000002", "Two", "France"),
        ])];
        let mut browser = FakeBrowser::new(pages)
            .study("NCT00000001", &detail("Drug A (UNKNOWN STATUS)", "2010"))
            .study("NCT00000002", &detail("Drug B", "2011"));

        let records = run_pipeline(&mut browser, "asthma", 5, 0).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].nct_id, "NCT00000002");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_detail_falls_back_to_list_title() -> Result<()> {
        let pages = vec![page(&[card("NCT00000001", "List Title", "Japan")])];
        let mut browser = FakeBrowser::new(pages);

        let records = run_pipeline(&mut browser, "asthma", 5, 0).await?;
        assert_eq!(
            records,
            vec![TrialRecord {
                nct_id: "NCT00000001".into(),
                brief_title: Some("List Title".into()),
                start_year: None,
                country: Some("Japan".into()),
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_candidate_without_link_is_dropped() -> Result<()> {
        let html = r#"<html><body><div class="card">
            <div><span class="nct-id">NCT00000009</span></div>
            <div class="cities-grid"><div class="location-text"><span>Paris, France</span></div></div>
            </div></body></html>"#;
        let mut browser = FakeBrowser::new(vec![html.to_string()]);

        let records = run_pipeline(&mut browser, "asthma", 5, 0).await?;
        assert!(records.is_empty());
        assert!(browser.opened.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_untitled_study_is_kept() -> Result<()> {
        let html = r#"<html><body><div class="card">
            <header><a href="/study/NCT00000010"></a></header>
            <div><span class="nct-id">NCT00000010</span></div>
            </div></body></html>"#;
        let mut browser = FakeBrowser::new(vec![html.to_string()])
            .study("NCT00000010", "<html><body><p>Loading</p></body></html>");

        let records = run_pipeline(&mut browser, "asthma", 5, 0).await?;
        assert_eq!(records, vec![TrialRecord::new("NCT00000010")]);
        assert_eq!(browser.opened.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_title_does_not_exclude() -> Result<()> {
        let pages = vec![page(&[card("NCT00000001", "Old Trial (Unknown status)", "Chile")])];
        let mut browser = FakeBrowser::new(pages);

        let records = run_pipeline(&mut browser, "asthma", 5, 0).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].brief_title.as_deref(), Some("Old Trial (Unknown status)"));
        Ok(())
    }

    #[test]
    fn test_polite_delay_bounds() {
        for base in [1, 500, u64::MAX / 2, u64::MAX] {
            let delay = polite_delay_ms(base);
            assert!(delay >= base, "{delay} < {base}");
        }
        assert!(polite_delay_ms(500) <= 1500);
    }

    #[tokio::test]
    async fn test_scan_stops_on_repeated_page() -> Result<()> {
        let same = page(&[card("NCT00000001", "One", "France")]);
        let mut browser = FakeBrowser::new(vec![same.clone(), same]);
        browser.last_page = PageAdvance::Advanced;

        let base = search_url("asthma")?;
        let candidates = collect_candidates(&mut browser, &base, 10).await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(browser.current, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_results() -> Result<()> {
        let mut browser = FakeBrowser::new(Vec::new());
        assert!(run_pipeline(&mut browser, "asthma", 5, 0).await?.is_empty());
        Ok(())
    }
}
