//! # trialharvest
//!
//! Clinical trial acquisition from ClinicalTrials.gov, by structured API or by
//! driving the public search UI in a headless browser, reconciled into one
//! canonical record schema.
//!
//! ## Modules
//!
//! - [`clinicaltrials`] - v2 API client
//! - [`pipeline`] - Browser extraction pipeline over a [`browser::StudyBrowser`]
//! - [`browser`] - Chromium over CDP
//! - [`extract`] - Field extraction from rendered HTML
//! - [`runner`] - Bounded child-process supervision
//! - [`record`] - Canonical record and run artifacts
//! - [`text`], [`country`] - Canonicalization
//! - [`aggregate`] - Per-country and per-year views
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trialharvest::{aggregate, clinicaltrials::ApiClient, record};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApiClient::new()?;
//!     let records = record::canonicalize_records(client.fetch("asthma", 100, &[]).await?);
//!     for row in aggregate::country_counts(&records) {
//!         println!("{}: {}", row.country, row.count);
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod browser;
pub mod clinicaltrials;
mod countries;
pub mod country;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod text;

pub use error::{Result, TrialsError};
