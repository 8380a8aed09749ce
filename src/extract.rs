//! Field extraction from rendered search and study pages.
//!
//! The browser hands over HTML snapshots; everything that depends on the
//! site's markup lives here. Selectors drift, so each field is found through
//! an ordered list of strategies and a miss is just `None`.

use crate::text::{canonical_nct, clean_non_empty, clean_optional, extract_year};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Identifier cell of a search result card
pub const RESULT_ID: &str = ".nct-id";
/// Pagination control
pub const NEXT_PAGE: &str = r#"[aria-label="Next page"]"#;
/// Title heading on a study page
pub const BRIEF_TITLE: &str = "h2.brief-title";
/// Overview value holding the start date
pub const START_DATE: &str = "div.overview-col-wide span.study-overview-item-text";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

struct Selectors {
    result_id: Selector,
    study_link: Selector,
    any_link: Selector,
    location: Selector,
    brief_title: Selector,
    og_title: Selector,
    twitter_title: Selector,
    document_title: Selector,
    main_heading: Selector,
    heading: Selector,
    start_date: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    result_id: selector(RESULT_ID),
    study_link: selector(r#"a[href^="/study/"], a[href*="/study/"]"#),
    any_link: selector("header a, h1 a, h2 a, h3 a, a"),
    location: selector(".cities-grid .location-text span"),
    brief_title: selector(BRIEF_TITLE),
    og_title: selector(r#"meta[property="og:title"]"#),
    twitter_title: selector(r#"meta[name="twitter:title"]"#),
    document_title: selector("title"),
    main_heading: selector("main h1"),
    heading: selector("h1"),
    start_date: selector(START_DATE),
});

static SITE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+-\s+ClinicalTrials\.gov\s*$").expect("valid suffix regex")
});

static FULL_TEXT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+-\s+Full Text View\s*$").expect("valid suffix regex"));

/// One card from the search results list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultRow {
    pub nct_id: Option<String>,
    pub url: Option<Url>,
    pub brief_title: Option<String>,
    pub country: Option<String>,
}

/// Fields read from a study's detail view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudyDetail {
    pub title: Option<String>,
    pub start_year: Option<i32>,
}

fn element_text(el: ElementRef<'_>) -> Option<String> {
    clean_non_empty(&el.text().collect::<String>())
}

/// Scan a results page snapshot.
///
/// Each identifier cell is paired with the nearest enclosing container, from
/// the closest `div` outwards, that holds a study link or a location. Relative
/// links resolve against `base`.
pub fn result_rows(html: &str, base: &Url) -> Vec<ResultRow> {
    let document = Html::parse_document(html);
    let s = &*SELECTORS;

    document
        .select(&s.result_id)
        .map(|id_cell| {
            let nct_id = element_text(id_cell).and_then(|t| canonical_nct(&t));
            let mut row = ResultRow {
                nct_id,
                ..ResultRow::default()
            };

            let containers = std::iter::once(id_cell)
                .chain(id_cell.ancestors().filter_map(ElementRef::wrap))
                .skip_while(|el| el.value().name() != "div");

            for container in containers {
                let link = container
                    .select(&s.study_link)
                    .next()
                    .or_else(|| container.select(&s.any_link).next());
                let location = container.select(&s.location).next();
                if link.is_none() && location.is_none() {
                    continue;
                }

                if let Some(link) = link {
                    row.url = link.value().attr("href").and_then(|href| base.join(href).ok());
                    row.brief_title = element_text(link);
                }
                row.country = location
                    .and_then(element_text)
                    .and_then(|loc| clean_optional(loc.rsplit(',').next()));
                break;
            }
            row
        })
        .collect()
}

type TitleStrategy = fn(&Html) -> Option<String>;

/// Title sources on a study page, most authoritative first.
const TITLE_STRATEGIES: &[(&str, TitleStrategy)] = &[
    ("brief-title", brief_title_heading),
    ("meta", meta_title),
    ("document-title", document_title),
    ("heading", page_heading),
];

fn strip_site_suffix(title: &str) -> Option<String> {
    clean_non_empty(&SITE_SUFFIX.replace(title, ""))
}

fn brief_title_heading(doc: &Html) -> Option<String> {
    doc.select(&SELECTORS.brief_title)
        .next()
        .and_then(element_text)
        .and_then(|t| strip_site_suffix(&t))
}

fn meta_title(doc: &Html) -> Option<String> {
    [&SELECTORS.og_title, &SELECTORS.twitter_title]
        .into_iter()
        .find_map(|sel| {
            doc.select(sel)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .and_then(strip_site_suffix)
        })
}

fn document_title(doc: &Html) -> Option<String> {
    let title = doc.select(&SELECTORS.document_title).next().and_then(element_text)?;
    let title = SITE_SUFFIX.replace(&title, "");
    clean_non_empty(&FULL_TEXT_SUFFIX.replace(&title, ""))
}

/// First top-level heading, unless it is the site's own banner.
fn page_heading(doc: &Html) -> Option<String> {
    let heading = doc
        .select(&SELECTORS.main_heading)
        .next()
        .or_else(|| doc.select(&SELECTORS.heading).next())
        .and_then(element_text)?;
    (!heading.to_lowercase().contains("clinicaltrials")).then_some(heading)
}

/// Resolve the title through [`TITLE_STRATEGIES`]; first hit wins.
pub fn resolve_title(doc: &Html) -> Option<String> {
    TITLE_STRATEGIES.iter().find_map(|(name, strategy)| {
        let title = strategy(doc)?;
        debug!(strategy = *name, "Resolved study title");
        Some(title)
    })
}

/// Title and start year from a study page snapshot.
pub fn study_detail(html: &str) -> StudyDetail {
    let document = Html::parse_document(html);
    let start_year = document
        .select(&SELECTORS.start_date)
        .next()
        .and_then(element_text)
        .and_then(|t| extract_year(&t));

    StudyDetail {
        title: resolve_title(&document),
        start_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://clinicaltrials.gov/search?cond=asthma").expect("valid base URL")
    }

    const RESULTS: &str = r#"
        <html><body><div class="results">
          <div class="card">
            <header><a href="/study/NCT00000001?cond=asthma">First  <mark>asthma</mark> study</a></header>
            <div class="meta"><span class="nct-id">NCT00000001</span></div>
            <div class="cities-grid"><div class="location-text"><span>Boston, Massachusetts, United States</span></div></div>
          </div>
          <div class="card">
            <div class="meta"><span class="nct-id"> nct 00000002 </span></div>
            <div class="cities-grid"><div class="location-text"><span>Lyon</span></div></div>
          </div>
          <section><span class="nct-id">NCT00000003</span></section>
        </div></body></html>
    "#;

    #[test]
    fn test_result_rows() {
        let rows = result_rows(RESULTS, &base());
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].nct_id.as_deref(), Some("NCT00000001"));
        assert_eq!(
            rows[0].url.as_ref().map(Url::as_str),
            Some("https://clinicaltrials.gov/study/NCT00000001?cond=asthma")
        );
        assert_eq!(rows[0].brief_title.as_deref(), Some("First asthma study"));
        assert_eq!(rows[0].country.as_deref(), Some("United States"));

        assert_eq!(rows[1].nct_id.as_deref(), Some("NCT00000002"));
        assert_eq!(rows[1].url, None);
        assert_eq!(rows[1].country.as_deref(), Some("Lyon"));
    }

    #[test]
    fn test_result_row_without_container_fields() {
        let html = r#"<html><body><div><span class="nct-id">NCT5</span></div></body></html>"#;
        let rows = result_rows(html, &base());
        assert_eq!(rows, vec![ResultRow { nct_id: Some("NCT5".into()), ..ResultRow::default() }]);
    }

    #[test]
    fn test_empty_results_page() {
        assert!(result_rows("<html><body><p>No studies found</p></body></html>", &base()).is_empty());
    }

    #[test]
    fn test_title_from_brief_title() {
        let detail = study_detail(
            r#"<html><head><title>Other - ClinicalTrials.gov</title></head><body>
               <h2 class="brief-title">Effect of <mark>Drug</mark> X</h2>
               <div class="overview-col-wide"><span class="study-overview-item-text">Study start: March 2014 (estimated)</span></div>
               </body></html>"#,
        );
        assert_eq!(detail.title.as_deref(), Some("Effect of Drug X"));
        assert_eq!(detail.start_year, Some(2014));
    }

    #[test]
    fn test_title_from_meta() {
        let detail = study_detail(
            r#"<html><head>
               <meta property="og:title" content="  ">
               <meta name="twitter:title" content="Twitter Title - ClinicalTrials.gov">
               </head><body></body></html>"#,
        );
        assert_eq!(detail.title.as_deref(), Some("Twitter Title"));
        assert_eq!(detail.start_year, None);
    }

    #[test]
    fn test_title_from_document_title() {
        let detail = study_detail(
            "<html><head><title>Doc Title - Full Text View - ClinicalTrials.gov</title></head><body></body></html>",
        );
        assert_eq!(detail.title.as_deref(), Some("Doc Title"));
    }

    #[test]
    fn test_title_from_heading_rejects_site_banner() {
        let banner = study_detail("<html><body><main><h1>ClinicalTrials.gov</h1></main></body></html>");
        assert_eq!(banner.title, None);

        let heading = study_detail("<html><body><h1>Heading Title</h1></body></html>");
        assert_eq!(heading.title.as_deref(), Some("Heading Title"));
    }
}
