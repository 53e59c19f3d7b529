//! Pulseboard CLI
//!
//! Command-line interface for the dashboard data:
//! - Show today's cards
//! - Print recent history
//! - Log and correct records
//! - Generate a config file
//!
//! Talks to the record store directly, using the same configuration as the
//! server.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pulseboard::adapter::{FetchOutcome, MetricsAdapter};
use pulseboard::config::Config;
use pulseboard::projections::{parse_date, parse_int};
use pulseboard::store::{self, Field, HealthMetricRecord, RecordStore};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pulseboard-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and edit daily health records")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show today's raw record
    Today,

    /// Show the Oura card
    Oura,

    /// Show the nutrition card with progress toward goals
    Nutrition,

    /// Show the quick vitals card
    Vitals,

    /// Show recent records
    History {
        /// Number of records (default: configured history_days)
        #[arg(short, long)]
        days: Option<usize>,
    },

    /// Create a record from column=value pairs
    Log {
        /// Assignments such as calorie=1850 protein=120
        #[arg(required = true)]
        values: Vec<String>,
        /// Record date (default: now)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Update columns of an existing record
    Update {
        /// Record id
        id: String,
        /// Assignments such as sleepscore=84
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulseboard=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Config { output } = &cli.command {
        let config = pulseboard::config::generate_default_config();
        match output {
            Some(path) => {
                // Create parent directory if needed
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &config)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", config),
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };

    let store = store::from_config(&config.store).context("building record store")?;
    let adapter = MetricsAdapter::with_config(store, config.dashboard.adapter_config());
    let json = cli.format == "json";

    match cli.command {
        Commands::Today => {
            let record = today(&adapter).await?;
            if json {
                print_json(&record)?;
            } else {
                print_record(&record);
            }
        }

        Commands::Oura => {
            let oura = adapter.to_oura_metrics(&today(&adapter).await?);
            if json {
                print_json(&oura)?;
            } else {
                println!("Sleep score:     {}", oura.sleep_score);
                println!("Readiness score: {}", oura.readiness_score);
                println!("Activity score:  {}", oura.activity_score);
                println!("Last updated:    {}", oura.last_updated.format("%Y-%m-%d %H:%M"));
            }
        }

        Commands::Nutrition => {
            let nutrition = adapter.to_nutrition_metrics(&today(&adapter).await?);
            let progress = nutrition.progress(&adapter.config().goals);
            if json {
                print_json(&serde_json::json!({
                    "nutrition": nutrition,
                    "progress": progress,
                }))?;
            } else {
                println!("{:<10} {:>8} {:>8} {:>7}", "Macro", "Current", "Goal", "Done");
                println!("{}", "-".repeat(36));
                for p in &progress {
                    println!(
                        "{:<10} {:>8} {:>8} {:>6.0}%",
                        p.label,
                        format!("{}{}", p.current, p.unit),
                        format!("{}{}", p.goal, p.unit),
                        p.display_percent()
                    );
                }
            }
        }

        Commands::Vitals => {
            let vitals = adapter.to_quick_vitals(&today(&adapter).await?);
            if json {
                print_json(&vitals)?;
            } else {
                println!("Heart rate:  {}", vitals.heart_rate);
                println!("Steps:       {}", vitals.steps);
                println!("Stress:      {}", vitals.stress_level);
                println!("HRV:         {}", vitals.hrv);
                println!("Meditation:  {} min", vitals.meditation_minutes);
            }
        }

        Commands::History { days } => {
            let days = days.unwrap_or(config.dashboard.history_days);
            let records = adapter.try_fetch_historical(days).await?;
            if json {
                print_json(&records)?;
            } else {
                print_history(&records);
            }
        }

        Commands::Log { values, date } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().to_rfc3339());
            let record = parse_assignments(&values)?.date(date);
            let created = adapter.try_create_record(&record).await?;
            if json {
                print_json(&created)?;
            } else {
                println!("Created record {}", created.id.as_deref().unwrap_or("-"));
            }
        }

        Commands::Update { id, values } => {
            let partial = parse_assignments(&values)?;
            let updated = adapter.try_update_record(&id, &partial).await?;
            if json {
                print_json(&updated)?;
            } else {
                println!("Updated record {}", id);
            }
        }

        // Handled before the store is built
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn today(adapter: &MetricsAdapter<dyn RecordStore>) -> anyhow::Result<HealthMetricRecord> {
    match adapter.fetch_today().await {
        FetchOutcome::Found(record) => Ok(record),
        FetchOutcome::Empty => bail!("No health metrics recorded yet"),
        FetchOutcome::Failed(e) => Err(e).context("fetching today's record"),
    }
}

/// Build a partial record from `column=value` pairs
///
/// Column names are the store's logical names (`calorie`, `sleepscore`, ...).
/// Numeric values are sent as numbers, everything else as text.
fn parse_assignments(values: &[String]) -> anyhow::Result<HealthMetricRecord> {
    let mut map = serde_json::Map::new();

    for assignment in values {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("Expected column=value, got: {}", assignment);
        };
        let key = key.trim();
        match Field::from_wire_name(key) {
            Some(Field::Id) => bail!("The record id cannot be assigned"),
            Some(_) => {}
            None => bail!("Unknown column: {}", key),
        }

        let value = value.trim();
        let json_value = match value.parse::<f64>() {
            Ok(n) if n.is_finite() => serde_json::json!(n),
            _ => serde_json::Value::String(value.to_string()),
        };
        map.insert(key.to_string(), json_value);
    }

    Ok(serde_json::from_value(serde_json::Value::Object(map))?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_record(record: &HealthMetricRecord) {
    let value = match serde_json::to_value(record) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return,
    };

    for (key, value) in value {
        let shown = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        println!("{:<20} {}", key, shown);
    }
}

fn print_history(records: &[HealthMetricRecord]) {
    if records.is_empty() {
        println!("No records");
        return;
    }

    println!(
        "{:<12} | {:<10} | {:<10} | {:<10}",
        "Date", "Calories", "Sleep", "Readiness"
    );
    println!("{}", "-".repeat(50));

    for record in records {
        let date = parse_date(record.date.as_ref())
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} | {:<10} | {:<10} | {:<10}",
            date,
            parse_int(record.calories.as_ref()),
            parse_int(record.sleep_score.as_ref()),
            parse_int(record.readiness_score.as_ref())
        );
    }
}
