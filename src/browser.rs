//! Headless browser access for the extraction pipeline.
//!
//! [`StudyBrowser`] is the narrow surface the pipeline drives: open the search
//! view, snapshot the rendered results, advance a page, snapshot a study page.
//! [`ChromeBrowser`] implements it over the Chrome DevTools Protocol.
//! Every call is bounded; a selector that never shows up is reported as
//! missing, not as an error.

use crate::error::{Result, TrialsError};
use crate::extract::{BRIEF_TITLE, NEXT_PAGE, RESULT_ID, START_DATE};
use crate::pipeline::ScrapeOptions;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// How long the results list may take to render after navigation
const RESULTS_WAIT: Duration = Duration::from_secs(5);

/// Cap on the per-selector wait inside a study page
const DETAIL_WAIT_CAP: Duration = Duration::from_secs(8);

/// How long to wait for the results list to change after a page click
const PAGE_SETTLE: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Outcome of trying to move to the next results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAdvance {
    Advanced,
    NoControl,
    Disabled,
    Failed(String),
}

/// Browser operations the pipeline needs, awaited strictly in sequence.
#[allow(async_fn_in_trait)]
pub trait StudyBrowser {
    /// Navigate the search view to `url`.
    async fn open_search(&mut self, url: &Url) -> Result<()>;

    /// HTML of the current results page, or `None` if no result rendered in time.
    async fn results_snapshot(&mut self) -> Option<String>;

    /// Activate the next-page control.
    async fn next_page(&mut self) -> PageAdvance;

    /// HTML of a study page once its title and overview had a chance to render.
    async fn study_snapshot(&mut self, url: &Url) -> Result<String>;
}

fn cdp_error(e: impl std::fmt::Display) -> TrialsError {
    TrialsError::Browser(e.to_string())
}

async fn bounded<T, E: std::fmt::Display>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = std::result::Result<T, E>>,
) -> Result<T> {
    match timeout(limit, fut).await {
        Ok(result) => result.map_err(cdp_error),
        Err(_) => Err(TrialsError::Browser(format!("{} timed out after {:?}", what, limit))),
    }
}

/// Poll for `selector` until it matches or `wait` elapses.
async fn wait_for_selector(page: &Page, selector: &str, wait: Duration) -> bool {
    let deadline = Instant::now() + wait;
    loop {
        if page.find_element(selector).await.is_ok() {
            return true;
        }
        if Instant::now() >= deadline {
            debug!(selector, ?wait, "Selector did not appear");
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn first_result_text(page: &Page) -> Option<String> {
    let cell = page.find_element(RESULT_ID).await.ok()?;
    cell.inner_text().await.ok().flatten()
}

/// Chromium driven over CDP.
pub struct ChromeBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    search: Option<Page>,
    wait: Duration,
}

impl ChromeBrowser {
    /// Launch Chromium according to `options`.
    pub async fn launch(options: &ScrapeOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder().request_timeout(options.wait);
        if !options.headless {
            builder = builder.with_head();
        }
        if cfg!(target_os = "linux") {
            // container sandboxes and small /dev/shm crash Chromium on launch
            builder = builder.no_sandbox().arg("--disable-dev-shm-usage");
        }
        if let Some(path) = &options.chrome {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(TrialsError::Browser)?;

        let (browser, mut events) = Browser::launch(config).await.map_err(cdp_error)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler error");
                }
            }
        });

        info!(headless = options.headless, "Browser launched");
        Ok(Self {
            browser,
            handler,
            search: None,
            wait: options.wait,
        })
    }

    /// Close every page and the browser process.
    pub async fn shutdown(mut self) {
        if let Some(page) = self.search.take() {
            if let Err(e) = page.close().await {
                debug!(error = %e, "Failed to close search page");
            }
        }
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "Failed to reap browser process");
        }
        self.handler.abort();
    }

    /// Wait until the first result differs from `before`.
    async fn settle(&self, page: &Page, before: Option<String>) {
        let deadline = Instant::now() + PAGE_SETTLE;
        while Instant::now() < deadline {
            if first_result_text(page).await != before {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        debug!("Results list unchanged after page advance");
    }
}

impl StudyBrowser for ChromeBrowser {
    async fn open_search(&mut self, url: &Url) -> Result<()> {
        info!(url = %url, "Opening search view");
        let page = bounded(self.wait, "search navigation", self.browser.new_page(url.as_str())).await?;
        self.search = Some(page);
        Ok(())
    }

    async fn results_snapshot(&mut self) -> Option<String> {
        let page = self.search.as_ref()?;
        if !wait_for_selector(page, RESULT_ID, RESULTS_WAIT).await {
            return None;
        }
        match page.content().await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!(error = %e, "Failed to read results page");
                None
            }
        }
    }

    async fn next_page(&mut self) -> PageAdvance {
        let Some(page) = self.search.as_ref() else {
            return PageAdvance::NoControl;
        };
        let Ok(button) = page.find_element(NEXT_PAGE).await else {
            return PageAdvance::NoControl;
        };
        if let Ok(Some(disabled)) = button.attribute("aria-disabled").await {
            if disabled.eq_ignore_ascii_case("true") {
                return PageAdvance::Disabled;
            }
        }

        let before = first_result_text(page).await;
        if let Err(e) = bounded(self.wait, "next-page click", button.click()).await {
            return PageAdvance::Failed(e.to_string());
        }
        self.settle(page, before).await;
        PageAdvance::Advanced
    }

    async fn study_snapshot(&mut self, url: &Url) -> Result<String> {
        let page = bounded(self.wait, "study navigation", self.browser.new_page(url.as_str())).await?;
        let field_wait = self.wait.min(DETAIL_WAIT_CAP);
        wait_for_selector(&page, BRIEF_TITLE, field_wait).await;
        wait_for_selector(&page, START_DATE, field_wait).await;

        let html = page.content().await.map_err(cdp_error);
        if let Err(e) = page.close().await {
            debug!(error = %e, "Failed to close study page");
        }
        html
    }
}
