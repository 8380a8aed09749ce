//! trialharvest - ClinicalTrials.gov acquisition and normalization
//!
//! Fetches trials for a condition through the v2 API or through the public
//! search UI in a headless browser, canonicalizes them into one schema and
//! exports per-country and per-year views.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! trialharvest api "type 2 diabetes" --page-size 200
//! trialharvest browser "asthma" --max-results 25 --show-logs
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! trialharvest serve --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};
use trialharvest::{
    aggregate::{self, CountryCount, YearCount, COUNTRY_COLUMNS, TREND_COLUMNS},
    clinicaltrials::{ApiClient, MAX_PAGE_SIZE},
    pipeline::{self, ScrapeOptions, DEFAULT_WAIT_MS},
    record::{self, TrialRecord, RECORD_COLUMNS},
    runner::{self, DEFAULT_PIPELINE_TIMEOUT},
};

// ============================================================================
// CLI Definition
// ============================================================================

/// ClinicalTrials.gov acquisition and normalization
#[derive(Parser)]
#[command(name = "trialharvest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch trials through the structured API
    Api {
        /// Condition or disease query
        condition: String,

        /// Studies to request (1-1000)
        #[arg(long, default_value = "100")]
        page_size: u32,

        /// Extra query parameter (e.g., filter.overallStatus=RECRUITING), repeatable
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Output directory
        #[arg(short, long, default_value = "./data")]
        output: PathBuf,

        /// API endpoint override
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Run the browser extraction pipeline in this process
    Scrape {
        /// Condition or disease query
        #[arg(long)]
        disease: String,

        /// Maximum records to write
        #[arg(long)]
        max_results: usize,

        /// Artifact path (.jsonl)
        #[arg(long)]
        output: PathBuf,

        /// Run the browser without a window (default)
        #[arg(long, overrides_with = "no_headless")]
        headless: bool,

        /// Show the browser window
        #[arg(long, overrides_with = "headless")]
        no_headless: bool,

        /// Per-wait timeout in milliseconds
        #[arg(long, default_value_t = DEFAULT_WAIT_MS)]
        timeout: u64,

        /// Chrome/Chromium executable
        #[arg(long)]
        chrome: Option<PathBuf>,

        /// Base pause between study pages in milliseconds (0 disables)
        #[arg(long, default_value = "500")]
        delay_ms: u64,
    },

    /// Run the browser pipeline as a supervised child process
    Browser {
        /// Condition or disease query
        condition: String,

        /// Maximum records to collect
        #[arg(long, default_value = "50")]
        max_results: usize,

        /// Kill the pipeline after this many seconds
        #[arg(long, default_value_t = DEFAULT_PIPELINE_TIMEOUT.as_secs())]
        timeout_secs: u64,

        /// Output directory
        #[arg(short, long, default_value = "./data")]
        output: PathBuf,

        /// Print the pipeline's log lines
        #[arg(long)]
        show_logs: bool,
    },

    /// Time the API path against the browser path
    Benchmark {
        /// Condition or disease query
        condition: String,

        /// API page size
        #[arg(long, default_value = "100")]
        page_size: u32,

        /// Browser record target
        #[arg(long, default_value = "20")]
        max_results: usize,

        /// Browser run deadline in seconds
        #[arg(long, default_value_t = DEFAULT_PIPELINE_TIMEOUT.as_secs())]
        timeout_secs: u64,

        /// Output directory
        #[arg(short, long, default_value = "./data")]
        output: PathBuf,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory for run artifacts
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

/// Parse a `key=value` query parameter
fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Api {
            condition,
            page_size,
            params,
            output,
            api_url,
        } => run_api(condition, page_size, params, output, api_url).await,
        Commands::Scrape {
            disease,
            max_results,
            output,
            headless: _,
            no_headless,
            timeout,
            chrome,
            delay_ms,
        } => {
            let options = ScrapeOptions {
                wait: Duration::from_millis(timeout),
                headless: !no_headless,
                chrome,
                detail_delay_ms: delay_ms,
            };
            run_scrape(disease, max_results, output, options).await
        }
        Commands::Browser {
            condition,
            max_results,
            timeout_secs,
            output,
            show_logs,
        } => run_browser(condition, max_results, timeout_secs, output, show_logs).await,
        Commands::Benchmark {
            condition,
            page_size,
            max_results,
            timeout_secs,
            output,
        } => run_benchmark(condition, page_size, max_results, timeout_secs, output).await,
        Commands::Serve { port, host, data_dir } => run_server(host, port, data_dir).await,
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run_api(
    condition: String,
    page_size: u32,
    params: Vec<(String, String)>,
    output_dir: PathBuf,
    api_url: Option<String>,
) -> Result<()> {
    let client = match api_url {
        Some(url) => ApiClient::with_base_url(&url)?,
        None => ApiClient::new()?,
    };
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

    println!("\n--- ClinicalTrials.gov API: {} ---", condition);
    let started = Instant::now();
    let records = record::canonicalize_records(
        client
            .fetch(&condition, page_size, &params)
            .await
            .context("API request failed")?,
    );
    println!("Fetched {} studies in {:.2}s", records.len(), started.elapsed().as_secs_f64());

    let artifact = record::artifact_path(&output_dir, "api", &condition);
    record::write_artifact(&artifact, &records).context("Failed to write artifact")?;
    println!("Saved: {:?}", artifact);

    export_views(&artifact, &records)?;
    print_summary(&records);
    Ok(())
}

async fn run_scrape(disease: String, max_results: usize, output: PathBuf, options: ScrapeOptions) -> Result<()> {
    match pipeline::scrape(&disease, max_results, &output, &options).await {
        Ok(count) => {
            println!("SCRAPED_ITEMS={}", count);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Pipeline failed");
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_browser(
    condition: String,
    max_results: usize,
    timeout_secs: u64,
    output_dir: PathBuf,
    show_logs: bool,
) -> Result<()> {
    let exe = std::env::current_exe().context("Failed to locate own executable")?;

    println!("\n--- Browser pipeline: {} (max {}) ---", condition, max_results);
    let run = runner::run_browser_pipeline(
        &exe,
        &condition,
        max_results,
        &output_dir,
        Some(Duration::from_secs(timeout_secs)),
    )
    .await
    .context("Failed to read browser artifact")?;

    if show_logs || !run.outcome.success() {
        println!("\n--- Pipeline logs ---");
        for line in &run.outcome.logs {
            println!("{}", line);
        }
    }

    if !run.outcome.success() {
        anyhow::bail!(
            "Browser pipeline failed (status {}, timed out: {}); rerun with --show-logs for details",
            run.outcome.status,
            run.outcome.timed_out
        );
    }

    println!(
        "Loaded {} records in {:.1}s (saved to {:?})",
        run.records.len(),
        run.outcome.elapsed.as_secs_f64(),
        run.artifact
    );
    export_views(&run.artifact, &run.records)?;
    print_summary(&run.records);
    Ok(())
}

#[derive(Debug, Serialize)]
struct BenchmarkRow {
    method: &'static str,
    seconds: f64,
    records: usize,
    ok: bool,
}

async fn run_benchmark(
    condition: String,
    page_size: u32,
    max_results: usize,
    timeout_secs: u64,
    output_dir: PathBuf,
) -> Result<()> {
    let client = ApiClient::new()?;
    let mut rows = Vec::new();

    println!("\n--- Benchmark: API ---");
    let started = Instant::now();
    let api = client.fetch(&condition, page_size.clamp(1, MAX_PAGE_SIZE), &[]).await;
    rows.push(BenchmarkRow {
        method: "api",
        seconds: started.elapsed().as_secs_f64(),
        records: api.as_ref().map(Vec::len).unwrap_or(0),
        ok: api.is_ok(),
    });
    if let Err(e) = &api {
        println!("API failed: {}", e);
    }

    println!("\n--- Benchmark: browser (this may take minutes) ---");
    let exe = std::env::current_exe().context("Failed to locate own executable")?;
    let run = runner::run_browser_pipeline(
        &exe,
        &condition,
        max_results,
        &output_dir,
        Some(Duration::from_secs(timeout_secs)),
    )
    .await
    .context("Failed to read browser artifact")?;
    rows.push(BenchmarkRow {
        method: "browser",
        seconds: run.outcome.elapsed.as_secs_f64(),
        records: run.records.len(),
        ok: run.outcome.success(),
    });

    println!();
    for row in &rows {
        println!(
            "{:<8} {:>8.2}s  {:>5} records  {}",
            row.method,
            row.seconds,
            row.records,
            if row.ok { "ok" } else { "failed" }
        );
    }

    let report = output_dir.join(format!("benchmark_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S")));
    save_csv(&report, &rows, &["method", "seconds", "records", "ok"])?;
    Ok(())
}

/// Write the country and trend tables next to `artifact`.
fn export_views(artifact: &Path, records: &[TrialRecord]) -> Result<()> {
    save_csv(
        &artifact.with_extension("countries.csv"),
        &aggregate::country_counts(records),
        COUNTRY_COLUMNS,
    )?;
    save_csv(
        &artifact.with_extension("trend.csv"),
        &aggregate::year_trend(records),
        TREND_COLUMNS,
    )?;
    Ok(())
}

fn print_summary(records: &[TrialRecord]) {
    let countries = aggregate::country_counts(records);
    let trend = aggregate::year_trend(records);

    println!("\nTop countries:");
    for row in countries.iter().take(10) {
        println!("  {:<30} {}", row.country, row.count);
    }
    if let (Some(first), Some(last)) = (trend.first(), trend.last()) {
        println!("Start years: {}-{} ({} distinct)", first.start_year, last.start_year, trend.len());
    }
    let missing_title = records.iter().filter(|r| r.brief_title.is_none()).count();
    if missing_title > 0 {
        println!("{} of {} records have no title", missing_title, records.len());
    }
    println!("Columns: {}", RECORD_COLUMNS.join(", "));
}

/// Save data to CSV file; the header row is written even when `data` is empty
fn save_csv<T: Serialize>(path: &Path, data: &[T], columns: &[&str]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context("Failed to create CSV writer")?;

    wtr.write_record(columns).context("Failed to write CSV header")?;
    for item in data {
        wtr.serialize(item).context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV")?;
    println!("Saved: {:?}", path);
    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(host: String, port: u16, data_dir: PathBuf) -> Result<()> {
    info!(host = %host, port = port, data_dir = %data_dir.display(), "Starting HTTP server");
    println!("Starting server at http://{}:{}", host, port);

    let app_state = Arc::new(AppState {
        data_dir,
        exe: std::env::current_exe().context("Failed to locate own executable")?,
        api: ApiClient::new()?,
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/trials/api", post(api_handler))
        .route("/trials/browser", post(browser_handler))
        .route("/trials/canonicalize", post(canonicalize_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

struct AppState {
    data_dir: PathBuf,
    /// This binary, re-invoked for browser runs
    exe: PathBuf,
    api: ApiClient,
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Records plus their aggregate views
#[derive(Debug, Serialize)]
struct TrialsResponse {
    status: String,
    source: &'static str,
    count: usize,
    elapsed_ms: u64,
    records: Vec<TrialRecord>,
    countries: Vec<CountryCount>,
    trend: Vec<YearCount>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    logs: Vec<String>,
}

impl TrialsResponse {
    fn success(source: &'static str, elapsed: Duration, records: Vec<TrialRecord>) -> Self {
        Self {
            status: "success".to_string(),
            source,
            count: records.len(),
            elapsed_ms: elapsed.as_millis() as u64,
            countries: aggregate::country_counts(&records),
            trend: aggregate::year_trend(&records),
            records,
            logs: Vec::new(),
        }
    }

    fn failure(source: &'static str, elapsed: Duration, message: String) -> Self {
        Self {
            status: format!("error: {}", message),
            source,
            count: 0,
            elapsed_ms: elapsed.as_millis() as u64,
            records: Vec::new(),
            countries: Vec::new(),
            trend: Vec::new(),
            logs: Vec::new(),
        }
    }
}

/// API request body
#[derive(Debug, Deserialize)]
struct ApiRequest {
    condition: String,
    #[serde(default = "default_page_size")]
    page_size: u32,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

fn default_page_size() -> u32 {
    100
}

/// API endpoint handler
async fn api_handler(State(state): State<Arc<AppState>>, Json(req): Json<ApiRequest>) -> Json<TrialsResponse> {
    info!(condition = %req.condition, page_size = req.page_size, "API request");

    let started = Instant::now();
    let overrides: Vec<(String, String)> = req.params.into_iter().collect();
    let fetched = state
        .api
        .fetch(&req.condition, req.page_size.clamp(1, MAX_PAGE_SIZE), &overrides)
        .await;

    match fetched {
        Ok(records) => {
            let records = record::canonicalize_records(records);
            let artifact = record::artifact_path(&state.data_dir, "api", &req.condition);
            if let Err(e) = record::write_artifact(&artifact, &records) {
                error!(error = %e, "Failed to persist API artifact");
            }
            Json(TrialsResponse::success("api", started.elapsed(), records))
        }
        Err(e) => {
            error!(error = %e, "API fetch failed");
            Json(TrialsResponse::failure("api", started.elapsed(), e.to_string()))
        }
    }
}

/// Browser request body
#[derive(Debug, Deserialize)]
struct BrowserRequest {
    condition: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
    timeout_secs: Option<u64>,
}

fn default_max_results() -> usize {
    20
}

/// Browser endpoint handler
async fn browser_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BrowserRequest>,
) -> Json<TrialsResponse> {
    info!(condition = %req.condition, max_results = req.max_results, "Browser request");

    let started = Instant::now();
    let limit = req
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_PIPELINE_TIMEOUT);
    let run = runner::run_browser_pipeline(
        &state.exe,
        &req.condition,
        req.max_results,
        &state.data_dir,
        Some(limit),
    )
    .await;

    match run {
        Ok(run) if run.outcome.success() => {
            let mut response = TrialsResponse::success("browser", run.outcome.elapsed, run.records);
            response.logs = run.outcome.logs;
            Json(response)
        }
        Ok(run) => {
            let message = format!("pipeline exited with status {}", run.outcome.status);
            let mut response = TrialsResponse::failure("browser", run.outcome.elapsed, message);
            response.logs = run.outcome.logs;
            Json(response)
        }
        Err(e) => {
            error!(error = %e, "Browser run failed");
            Json(TrialsResponse::failure("browser", started.elapsed(), e.to_string()))
        }
    }
}

/// Canonicalize request body
#[derive(Debug, Deserialize)]
struct CanonicalizeRequest {
    records: Vec<TrialRecord>,
}

/// Canonicalize endpoint handler
async fn canonicalize_handler(Json(req): Json<CanonicalizeRequest>) -> Json<TrialsResponse> {
    let started = Instant::now();
    let records = record::canonicalize_records(req.records);
    Json(TrialsResponse::success("canonicalize", started.elapsed(), records))
}
