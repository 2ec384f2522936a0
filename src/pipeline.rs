use crate::config::ScraperConfig;
use crate::domain::AthleteRecord;
use crate::fetcher::ResultFetcher;
use crate::quality::{QualityReport, QualityValidator};
use crate::timing::{ParsedTime, TimingParser};
use crate::transformer::ResultTransformer;
use crate::error::Result;
use chrono::{Datelike, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// One normalized athlete together with its quality assessment.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub record: AthleteRecord,
    pub report: QualityReport,
}

/// Score buckets used in the run summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityDistribution {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
}

impl QualityDistribution {
    fn add(&mut self, score: u8) {
        match score {
            90..=100 => self.excellent += 1,
            70..=89 => self.good += 1,
            50..=69 => self.fair += 1,
            _ => self.poor += 1,
        }
    }
}

/// Result of a complete roster walk.
#[derive(Debug, Serialize)]
pub struct IngestSummary {
    pub roster_size: usize,
    pub ingested: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub average_quality_score: f64,
    pub quality_distribution: QualityDistribution,
}

/// Walks the roster one athlete at a time: fetch detail page, parse timings,
/// map onto the canonical schedule, score the result. A single worker with an
/// enforced pause between athletes; the pacing delay is the backpressure.
pub struct IngestPipeline {
    fetcher: ResultFetcher,
    transformer: ResultTransformer,
    validator: QualityValidator,
    max_athletes: usize,
    delay: Duration,
}

impl IngestPipeline {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            fetcher: ResultFetcher::new(config)?,
            transformer: ResultTransformer::new(config.missing_slot_policy),
            validator: QualityValidator::new(),
            max_athletes: config.max_athletes,
            delay: Duration::from_millis(config.delay_ms),
        })
    }

    /// Runs the full ingestion pass. A roster fetch that exhausts its retries
    /// aborts the run; a single athlete doing so is skipped with a diagnostic.
    #[instrument(skip(self))]
    pub async fn run(&self, roster_url: &str) -> Result<(Vec<IngestOutcome>, IngestSummary)> {
        counter!("hyrox_ingest_runs_total").increment(1);
        let started = std::time::Instant::now();

        let mut references = self.fetcher.fetch_roster(roster_url).await?;
        let roster_size = references.len();
        if references.len() > self.max_athletes {
            info!(
                "Limiting run to {} of {} athletes",
                self.max_athletes, roster_size
            );
            references.truncate(self.max_athletes);
        }

        let mut outcomes = Vec::new();
        let mut errors = Vec::new();
        let mut skipped = 0usize;

        for (position, reference) in references.iter().enumerate() {
            if position > 0 {
                // Serial pacing between athletes, not per retry attempt.
                tokio::time::sleep(self.delay).await;
            }

            let raw_entries = match self.fetcher.fetch_athlete_events(&reference.detail_url).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping athlete {}: {e}", reference.name);
                    errors.push(format!("{}: {e}", reference.name));
                    skipped += 1;
                    counter!("hyrox_athletes_skipped_total").increment(1);
                    continue;
                }
            };

            let mut raw_events: HashMap<String, ParsedTime> = HashMap::new();
            for entry in &raw_entries {
                match TimingParser::cleanse_scraped(&entry.time_text, &entry.event_label) {
                    Some(parsed) => {
                        raw_events.insert(entry.event_label.clone(), parsed);
                    }
                    None => {
                        counter!("hyrox_unparseable_times_total").increment(1);
                    }
                }
            }

            let athlete_id = numeric_id(&reference.external_id, position);
            let mut record =
                self.transformer
                    .transform(athlete_id, &reference.name, &raw_events);
            record.ranking = Some(position as u32 + 1);
            record.year = Some(Utc::now().year());

            let report = self.validator.report(&record);
            histogram!("hyrox_quality_score").record(report.score as f64);
            info!(
                "Ingested {} ({} events, score {})",
                record.name,
                record.events.len(),
                report.score
            );
            outcomes.push(IngestOutcome { record, report });
        }

        let mut distribution = QualityDistribution::default();
        for outcome in &outcomes {
            distribution.add(outcome.report.score);
        }
        let average_quality_score = if outcomes.is_empty() {
            0.0
        } else {
            outcomes.iter().map(|o| o.report.score as f64).sum::<f64>() / outcomes.len() as f64
        };

        counter!("hyrox_athletes_ingested_total").increment(outcomes.len() as u64);
        histogram!("hyrox_ingest_duration_seconds").record(started.elapsed().as_secs_f64());

        let summary = IngestSummary {
            roster_size,
            ingested: outcomes.len(),
            skipped,
            errors,
            average_quality_score,
            quality_distribution: distribution,
        };
        info!(
            "Run complete: {}/{} ingested, {} skipped, average score {:.1}",
            summary.ingested, summary.roster_size, summary.skipped, summary.average_quality_score
        );

        Ok((outcomes, summary))
    }
}

/// Persists a finished run to a timestamped JSON file for the caller's store
/// to pick up.
pub fn persist_to_json(outcomes: &[IngestOutcome], output_dir: &str) -> Result<String> {
    fs::create_dir_all(output_dir)?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("hyrox_{timestamp}.json");
    let filepath = Path::new(output_dir).join(&filename);
    let json_content = serde_json::to_string_pretty(outcomes)?;
    fs::write(&filepath, json_content)?;
    Ok(filepath.to_string_lossy().to_string())
}

/// External ids are query-parameter strings; keep the digits when they form a
/// usable number, otherwise fall back to the roster position.
fn numeric_id(external_id: &str, position: usize) -> i64 {
    let digits: String = external_id.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(position as i64 + 1)
}
