//! Canonical trial record and the newline-delimited run artifact.

use crate::country::canonicalize_optional;
use crate::error::{Result, TrialsError};
use crate::text::{canonical_nct, clean_optional};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Column order shared by every record table.
pub const RECORD_COLUMNS: &[&str] = &["nctId", "briefTitle", "startYear", "country"];

/// One clinical trial in the schema both sources are reconciled into.
///
/// Absent fields serialize as `null`, never as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub nct_id: String,
    #[serde(default)]
    pub brief_title: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub country: Option<String>,
}

impl TrialRecord {
    pub fn new(nct_id: impl Into<String>) -> Self {
        Self {
            nct_id: nct_id.into(),
            brief_title: None,
            start_year: None,
            country: None,
        }
    }
}

/// Re-canonicalize identifiers, titles and countries.
///
/// Records whose identifier cleans down to nothing keep their raw identifier.
pub fn canonicalize_records(records: Vec<TrialRecord>) -> Vec<TrialRecord> {
    records
        .into_iter()
        .map(|record| TrialRecord {
            nct_id: canonical_nct(&record.nct_id).unwrap_or(record.nct_id),
            brief_title: clean_optional(record.brief_title.as_deref()),
            start_year: record.start_year,
            country: canonicalize_optional(record.country.as_deref()),
        })
        .collect()
}

/// Per-process sequence keeping artifact names distinct within one timestamp
static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

/// `<source>_<condition>_<timestamp>_<pid>-<seq>.jsonl` under `dir`.
///
/// The condition keeps only alphanumerics, `-` and `_`; whitespace runs become
/// `_`. Every call returns a fresh name, so concurrent runs never share a file.
pub fn artifact_path(dir: &Path, source: &str, condition: &str) -> PathBuf {
    let safe: String = condition
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    let slug = safe.split_whitespace().collect::<Vec<_>>().join("_");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S_%6f");
    let seq = ARTIFACT_SEQ.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "{}_{}_{}_{}-{}.jsonl",
        source,
        slug,
        timestamp,
        std::process::id(),
        seq
    ))
}

/// Write `records` as JSON lines at `path`.
///
/// The lines go to a temporary file in the destination directory that is then
/// renamed over `path`, so readers see either the previous artifact or the
/// complete new one.
pub fn write_artifact(path: &Path, records: &[TrialRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| TrialsError::Io(e.error))?;

    info!(path = %path.display(), count = records.len(), "Wrote run artifact");
    Ok(())
}

/// Artifact line as found on disk; every field is optional and loosely typed.
#[derive(Debug, Deserialize)]
struct ArtifactLine {
    #[serde(rename = "nctId", alias = "nct_id", default)]
    nct_id: Option<Value>,
    #[serde(rename = "briefTitle", alias = "brief_title", default)]
    brief_title: Option<Value>,
    #[serde(rename = "startYear", alias = "start_year", default)]
    start_year: Option<Value>,
    #[serde(default)]
    country: Option<Value>,
}

/// Read a run artifact back into records.
///
/// Blank lines are ignored; lines that are not JSON objects or carry no
/// identifier are skipped with a warning.
pub fn load_artifact(path: &Path) -> Result<Vec<TrialRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: ArtifactLine = match serde_json::from_str(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Skipping malformed artifact line");
                continue;
            }
        };
        let Some(nct_id) = parsed.nct_id.as_ref().and_then(value_text) else {
            warn!(line = idx + 1, "Skipping artifact line without nctId");
            continue;
        };
        records.push(TrialRecord {
            nct_id,
            brief_title: parsed.brief_title.as_ref().and_then(value_text),
            start_year: parsed.start_year.as_ref().and_then(coerce_year),
            country: parsed.country.as_ref().and_then(value_text),
        });
    }

    debug!(path = %path.display(), count = records.len(), "Loaded run artifact");
    Ok(records)
}

/// Non-empty string content of a scalar JSON value.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Numeric coercion: integers, integral floats and numeric strings; anything
/// else is absent.
fn coerce_year(value: &Value) -> Option<i32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if number.fract() != 0.0 || number < i32::MIN as f64 || number > i32::MAX as f64 {
        return None;
    }
    Some(number as i32)
}
