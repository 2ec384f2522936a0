use clap::{Parser, Subcommand};
use tracing::error;

use hyrox_scraper::config::ScraperConfig;
use hyrox_scraper::domain::AthleteRecord;
use hyrox_scraper::logging;
use hyrox_scraper::pipeline::{persist_to_json, IngestPipeline};
use hyrox_scraper::quality::QualityValidator;
use hyrox_scraper::timing::TimingParser;

#[derive(Parser)]
#[command(name = "hyrox_scraper")]
#[command(about = "Hyrox race results scraper and normalizer")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a roster page and normalize every athlete on it
    Ingest {
        /// Roster page URL listing the competitors
        roster_url: String,
        /// Directory for the JSON run output
        #[arg(long, default_value = "output")]
        output_dir: String,
    },
    /// Score previously ingested records from a JSON file
    Validate {
        /// File containing an array of athlete records
        file: String,
    },
    /// Parse one or more time strings and print the normalized seconds
    ParseTime {
        /// Time strings, e.g. "4:32" "1:05:23.5"
        times: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = ScraperConfig::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Ingest {
            roster_url,
            output_dir,
        } => {
            println!("🔄 Ingesting roster {roster_url}...");
            let pipeline = IngestPipeline::new(&config)?;
            match pipeline.run(&roster_url).await {
                Ok((outcomes, summary)) => {
                    let output_file = persist_to_json(&outcomes, &output_dir)?;
                    println!("\n📊 Run summary:");
                    println!("   Roster size: {}", summary.roster_size);
                    println!("   Ingested: {}", summary.ingested);
                    println!("   Skipped: {}", summary.skipped);
                    println!("   Average quality score: {:.1}", summary.average_quality_score);
                    println!("   Output file: {output_file}");
                    if !summary.errors.is_empty() {
                        println!("\n⚠️  Athletes skipped after exhausted retries:");
                        for error in &summary.errors {
                            println!("   - {error}");
                        }
                    }
                }
                Err(e) => {
                    error!("Ingestion run failed: {e}");
                    anyhow::bail!("ingestion failed: {e}");
                }
            }
        }
        Commands::Validate { file } => {
            let content = std::fs::read_to_string(&file)?;
            let records: Vec<AthleteRecord> = serde_json::from_str(&content)?;
            let validator = QualityValidator::new();
            let (reports, summary) = validator.validate_batch(&records);

            for (record, report) in records.iter().zip(&reports) {
                println!(
                    "{}: score {}/100, {} errors, {} warnings, {} timing issues",
                    record.name,
                    report.score,
                    report.errors.len(),
                    report.warnings.len(),
                    report.timing_issues.len()
                );
                for recommendation in report.recommendations() {
                    println!("   → {recommendation}");
                }
            }
            println!(
                "\n📊 {} records, {} fully valid, average score {:.1}",
                summary.total, summary.valid, summary.average_score
            );
        }
        Commands::ParseTime { times } => {
            for text in &times {
                match TimingParser::parse(text) {
                    Some(parsed) => println!("{text} -> {}s", parsed.seconds),
                    None => println!("{text} -> no value"),
                }
            }
        }
    }

    Ok(())
}
