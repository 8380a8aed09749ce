//! ClinicalTrials.gov v2 API client.
//!
//! Issues a single `GET /api/v2/studies` request and maps each study onto a
//! [`TrialRecord`]. Every nested field is optional in practice, so extraction
//! walks the payload with JSON pointers and treats anything of the wrong shape
//! as absent instead of failing the whole page.
//!
//! No pagination beyond the one request and no retries: a non-2xx answer is
//! returned to the caller as an error.

use crate::error::{Result, TrialsError};
use crate::record::{value_text, TrialRecord};
use crate::text::extract_year;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Studies endpoint of the v2 API
pub const DEFAULT_API_URL: &str = "https://clinicaltrials.gov/api/v2/studies";

/// Upper bound the API accepts for `pageSize`
pub const MAX_PAGE_SIZE: u32 = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback wait when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Client for the registry's structured query API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Client against the public endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL)
    }

    /// Client against a mirror or test server.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TrialsError::Config(format!("Invalid API URL '{}': {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("trialharvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TrialsError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Fetch one page of studies for `condition`.
    ///
    /// `overrides` are raw query parameters applied last; a key already set
    /// (`query.cond`, `pageSize`) is replaced rather than repeated.
    pub async fn fetch(
        &self,
        condition: &str,
        page_size: u32,
        overrides: &[(String, String)],
    ) -> Result<Vec<TrialRecord>> {
        let url = build_request_url(&self.base_url, condition, page_size, overrides);
        info!(condition, page_size, "Querying ClinicalTrials.gov API");
        debug!(url = %url, "API request");

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(TrialsError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            warn!(status = status.as_u16(), "API error");
            return Err(TrialsError::Api {
                code: status.as_u16(),
                message: format!("ClinicalTrials.gov API error: {} {}", status, excerpt.trim()),
            });
        }

        let payload: Value = response.json().await?;
        let records = parse_studies(&payload);
        info!(count = records.len(), "Parsed API studies");
        Ok(records)
    }
}

/// Request URL with base parameters and overrides merged.
fn build_request_url(
    base: &Url,
    condition: &str,
    page_size: u32,
    overrides: &[(String, String)],
) -> Url {
    let mut params: Vec<(String, String)> = vec![
        ("query.cond".to_string(), condition.to_string()),
        ("pageSize".to_string(), page_size.to_string()),
    ];
    for (key, value) in overrides {
        match params.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => params.push((key.clone(), value.clone())),
        }
    }

    let mut url = base.clone();
    url.query_pairs_mut().extend_pairs(params.iter());
    url
}

/// Map a `studies` payload to records.
///
/// A missing or non-array `studies` yields no records.
pub fn parse_studies(payload: &Value) -> Vec<TrialRecord> {
    let Some(studies) = payload.get("studies").and_then(Value::as_array) else {
        warn!("API payload has no studies array");
        return Vec::new();
    };

    studies
        .iter()
        .enumerate()
        .filter_map(|(idx, study)| {
            let record = parse_study(study);
            if record.is_none() {
                warn!(index = idx, "Skipping study without an identifier");
            }
            record
        })
        .collect()
}

/// One study; `None` only when neither identifier field is usable.
fn parse_study(study: &Value) -> Option<TrialRecord> {
    let nct_id = text_at(study, "/protocolSection/identificationModule/nctId")
        .or_else(|| text_at(study, "/protocolSection/identificationModule/id"))?;

    let brief_title = text_at(study, "/protocolSection/identificationModule/briefTitle")
        .or_else(|| text_at(study, "/protocolSection/identificationModule/officialTitle"));

    let country = study
        .pointer("/protocolSection/contactsLocationsModule/locations")
        .and_then(Value::as_array)
        .and_then(|locations| locations.first())
        .filter(|first| first.is_object())
        .and_then(|first| first.get("country"))
        .and_then(value_text);

    let start_year = study
        .pointer("/protocolSection/statusModule/startDateStruct/date")
        .and_then(start_year_from);

    Some(TrialRecord {
        nct_id,
        brief_title,
        start_year,
        country,
    })
}

fn text_at(study: &Value, pointer: &str) -> Option<String> {
    study.pointer(pointer).and_then(value_text)
}

/// Year from a date value; for a list only the first element counts.
fn start_year_from(value: &Value) -> Option<i32> {
    let value = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    extract_year(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    fn study(ident: Value, rest: Value) -> Value {
        let mut protocol = rest;
        protocol["identificationModule"] = ident;
        json!({ "protocolSection": protocol })
    }

    #[test]
    fn test_build_request_url_overrides_replace() -> Result<()> {
        let base = Url::parse(DEFAULT_API_URL).map_err(|e| TrialsError::Config(e.to_string()))?;
        let overrides = vec![
            ("pageSize".to_string(), "5".to_string()),
            ("filter.overallStatus".to_string(), "RECRUITING".to_string()),
        ];
        let url = build_request_url(&base, "Type 2 Diabetes", 100, &overrides);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("query.cond".to_string(), "Type 2 Diabetes".to_string()),
                ("pageSize".to_string(), "5".to_string()),
                ("filter.overallStatus".to_string(), "RECRUITING".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_parse_full_study() {
        let payload = json!({ "studies": [study(
            json!({ "nctId": "NCT01234567", "briefTitle": "Metformin Study" }),
            json!({
                "statusModule": { "startDateStruct": { "date": "2014-03" } },
                "contactsLocationsModule": { "locations": [
                    { "city": "Berlin", "country": "Germany" },
                    { "city": "Paris", "country": "France" }
                ]}
            }),
        )]});

        let records = parse_studies(&payload);
        assert_eq!(
            records,
            vec![TrialRecord {
                nct_id: "NCT01234567".into(),
                brief_title: Some("Metformin Study".into()),
                start_year: Some(2014),
                country: Some("Germany".into()),
            }]
        );
    }

    #[test]
    fn test_missing_locations_module_gives_no_country() {
        let payload = json!({ "studies": [study(json!({ "nctId": "NCT1" }), json!({}))] });
        let records = parse_studies(&payload);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country, None);
        assert_eq!(records[0].start_year, None);
        assert_eq!(records[0].brief_title, None);
    }

    #[test]
    fn test_fallback_fields_and_malformed_values() {
        let payload = json!({ "studies": [
            study(
                json!({ "id": "NCT2", "briefTitle": "", "officialTitle": "Official" }),
                json!({
                    "statusModule": { "startDateStruct": { "date": ["March 2019", "2020"] } },
                    "contactsLocationsModule": { "locations": ["Germany"] }
                }),
            ),
            study(
                json!({ "nctId": "NCT3" }),
                json!({
                    "statusModule": { "startDateStruct": "2018" },
                    "contactsLocationsModule": { "locations": {} }
                }),
            ),
            study(json!({ "briefTitle": "No id" }), json!({})),
            json!("not an object"),
        ]});

        let records = parse_studies(&payload);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].nct_id, "NCT2");
        assert_eq!(records[0].brief_title.as_deref(), Some("Official"));
        assert_eq!(records[0].start_year, Some(2019));
        assert_eq!(records[0].country, None);
        assert_eq!(records[1].start_year, None);
        assert_eq!(records[1].country, None);
    }

    #[test]
    fn test_payload_without_studies() {
        assert!(parse_studies(&json!({})).is_empty());
        assert!(parse_studies(&json!({ "studies": {} })).is_empty());
    }

    async fn serve(app: Router) -> std::io::Result<String> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{}/api/v2/studies", addr))
    }

    #[tokio::test]
    async fn test_fetch_against_local_server() -> Result<()> {
        let app = Router::new().route(
            "/api/v2/studies",
            get(|| async {
                Json(json!({ "studies": [
                    { "protocolSection": { "identificationModule": { "nctId": "NCT9" } } }
                ]}))
            }),
        );
        let client = ApiClient::with_base_url(&serve(app).await?)?;
        let records = client.fetch("asthma", 10, &[]).await?;
        assert_eq!(records, vec![TrialRecord::new("NCT9")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_fails_on_server_error() -> Result<()> {
        let app = Router::new().route(
            "/api/v2/studies",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = ApiClient::with_base_url(&serve(app).await?)?;
        let err = client.fetch("asthma", 10, &[]).await;
        assert!(matches!(err, Err(TrialsError::Api { code: 500, .. })));
        Ok(())
    }
}
