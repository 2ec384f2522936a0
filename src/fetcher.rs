use crate::config::ScraperConfig;
use crate::domain::{RawAthleteReference, RawEventEntry};
use crate::error::{Result, ScraperError};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Menu/navigation anchors that share the detail-link pattern but are not
/// athletes. Matched by exact text.
static ROSTER_SKIP_LABELS: &[&str] = &[
    "Overview",
    "Results",
    "Start List",
    "Event Info",
    "Home",
    "Login",
    "Logout",
];

static ID_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]idp=([^&#]+)").unwrap());

/// Retries an async operation up to `attempts` times with a linearly growing
/// pause (`attempt * base_delay`) between tries. Any `Err` counts as
/// retryable; the last one is surfaced once attempts are exhausted.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    url: &str,
    attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, String>>,
{
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(message) => {
                warn!("Attempt {attempt}/{attempts} failed for {url}: {message}");
                last_error = message;
                if attempt < attempts {
                    tokio::time::sleep(base_delay * attempt).await;
                }
            }
        }
    }
    Err(ScraperError::Fetch {
        url: url.to_string(),
        attempts,
        message: last_error,
    })
}

/// Fault-tolerant fetch + extraction for the results site: roster pages into
/// athlete references, detail pages into raw event rows.
pub struct ResultFetcher {
    client: reqwest::Client,
    retry_attempts: u32,
    retry_base_delay: Duration,
}

impl ResultFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            retry_attempts: config.retry_attempts,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    #[instrument(skip(self))]
    pub async fn fetch_roster(&self, url: &str) -> Result<Vec<RawAthleteReference>> {
        info!("Fetching roster page");
        let html = self.get_with_retry(url).await?;
        let references = extract_roster(&html, url)?;
        info!("Discovered {} athlete references", references.len());
        if references.is_empty() {
            warn!("No athlete links found - the page structure may have changed");
        }
        Ok(references)
    }

    #[instrument(skip(self))]
    pub async fn fetch_athlete_events(&self, url: &str) -> Result<Vec<RawEventEntry>> {
        let html = self.get_with_retry(url).await?;
        let entries = extract_athlete_events(&html);
        debug!("Extracted {} event rows", entries.len());
        Ok(entries)
    }

    async fn get_with_retry(&self, url: &str) -> Result<String> {
        let client = self.client.clone();
        retry_with_backoff(url, self.retry_attempts, self.retry_base_delay, || {
            let client = client.clone();
            let url = url.to_string();
            async move {
                let response = client.get(&url).send().await.map_err(|e| e.to_string())?;
                if !response.status().is_success() {
                    return Err(format!("unexpected status {}", response.status()));
                }
                response.text().await.map_err(|e| e.to_string())
            }
        })
        .await
    }
}

/// Pulls athlete detail links out of a roster page. Anchors must carry the
/// detail-page pattern and an `idp` query parameter; known menu labels are
/// dropped, discovery order is preserved, repeat ids are collapsed.
pub fn extract_roster(html: &str, base_url: &str) -> Result<Vec<RawAthleteReference>> {
    let base = Url::parse(base_url).map_err(|e| ScraperError::Scrape {
        message: format!("Invalid roster URL {base_url:?}: {e}"),
    })?;

    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").unwrap();

    let mut seen_ids = HashSet::new();
    let mut references = Vec::new();

    for anchor in document.select(&anchor_selector) {
        let href = anchor.value().attr("href").unwrap_or_default();
        if !href.contains("content=detail") {
            continue;
        }
        let Some(external_id) = ID_PARAM
            .captures(href)
            .map(|caps| caps[1].to_string())
        else {
            continue;
        };

        let name = anchor.text().collect::<String>().trim().to_string();
        if name.is_empty() || ROSTER_SKIP_LABELS.contains(&name.as_str()) {
            debug!("Skipping non-athlete link: {name:?}");
            continue;
        }
        if !seen_ids.insert(external_id.clone()) {
            debug!("Duplicate athlete link for id {external_id}, keeping the first");
            continue;
        }

        let detail_url = match base.join(href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!("Unresolvable detail link {href:?}: {e}");
                continue;
            }
        };

        references.push(RawAthleteReference {
            name,
            external_id,
            detail_url,
        });
    }

    Ok(references)
}

/// Pulls raw event rows from an athlete detail page. Only the first table
/// whose header carries both a "Split" and a "Time" column is read. Rows with
/// an empty or dash-marked time are skipped without error.
pub fn extract_athlete_events(html: &str) -> Vec<RawEventEntry> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let header_selector = Selector::parse("thead tr th").unwrap();
    let row_selector = Selector::parse("tbody tr").unwrap();
    let event_selector = Selector::parse("th.desc").unwrap();
    let time_selector = Selector::parse(r#"td[class*="f-time_"]"#).unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut entries = Vec::new();

    for table in document.select(&table_selector) {
        let headers: Vec<String> = table
            .select(&header_selector)
            .map(|th| th.text().collect::<String>().trim().to_string())
            .collect();
        if !headers.iter().any(|h| h == "Split") || !headers.iter().any(|h| h == "Time") {
            continue;
        }

        for row in table.select(&row_selector) {
            let Some(event_cell) = row.select(&event_selector).next() else {
                continue;
            };
            let event_label = event_cell.text().collect::<String>().trim().to_string();

            // Formatted time cell preferred, first data cell as fallback.
            let time_text = row
                .select(&time_selector)
                .next()
                .or_else(|| row.select(&cell_selector).next())
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            let place_text = row
                .select(&cell_selector)
                .last()
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .filter(|text| !text.contains('\u{2013}'))
                .unwrap_or_default();

            if event_label.is_empty() || time_text.is_empty() || time_text.contains('\u{2013}') {
                debug!("Skipping row without usable time: {event_label:?} {time_text:?}");
                continue;
            }

            entries.push(RawEventEntry {
                event_label,
                time_text,
                place_text,
            });
        }

        // The page carries other tables (rankings, judging); only the first
        // split table is the workout result.
        break;
    }

    entries
}
