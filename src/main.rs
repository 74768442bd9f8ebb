//! Command-line front end for the cultural-alignment scoring core.
//!
//! Usage:
//!   cultural-lens extract response.txt
//!   cultural-lens evaluate --input responses.jsonl --format csv
//!   cultural-lens baseline --input baseline.jsonl
//!   cultural-lens validate

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cultural_lens::config::Config;
use cultural_lens::extract::{decision_distribution, parse_success_rate};
use cultural_lens::scenario::ScenarioLookup;
use cultural_lens::{
    CulturalEvaluator, EvaluationMetrics, aggregate_metrics, extract, rank_cultures,
};

#[derive(Parser)]
#[command(name = "cultural-lens")]
#[command(about = "Score LLM responses for cultural alignment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one raw response (file or stdin) and print the structured record
    Extract {
        input: Option<PathBuf>,
    },
    /// Score a JSONL file of responses against their cultures and scenarios
    Evaluate {
        /// JSONL records of {id?, raw_text, culture, scenario_id}; stdin if omitted
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
        format: OutputFormat,
        /// Maximum responses scored at once
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },
    /// Rank reference cultures by distance to no-persona responses
    Baseline {
        /// JSONL records of {raw_text, scenario_id}; stdin if omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Check dataset consistency
    Validate,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Jsonl,
    Csv,
}

#[derive(Deserialize)]
struct EvaluationRecord {
    #[serde(default)]
    id: Option<String>,
    raw_text: String,
    culture: String,
    scenario_id: String,
}

#[derive(Deserialize)]
struct BaselineRecord {
    raw_text: String,
    scenario_id: String,
}

#[derive(Serialize)]
struct EvaluationRow {
    id: String,
    culture: String,
    scenario_id: String,
    extraction_succeeded: bool,
    decision: Option<String>,
    alignment: Option<f64>,
    stereotype: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.runtime.log_level))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract { input } => extract_command(input.as_deref()),
        Commands::Evaluate {
            input,
            format,
            concurrency,
        } => evaluate_command(&config, input.as_deref(), format, concurrency).await,
        Commands::Baseline { input } => baseline_command(&config, input.as_deref()).await,
        Commands::Validate => validate_command(&config),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => {
            std::fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display()))
        }
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin"),
    }
}

fn parse_jsonl<T: for<'de> Deserialize<'de>>(content: &str) -> Result<Vec<(usize, T)>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map(|record| (i + 1, record))
                .with_context(|| format!("Invalid JSON on line {}", i + 1))
        })
        .collect()
}

fn extract_command(input: Option<&Path>) -> Result<()> {
    let raw = read_input(input)?;
    let response = extract(&raw);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn evaluate_command(
    config: &Config,
    input: Option<&Path>,
    format: OutputFormat,
    concurrency: usize,
) -> Result<()> {
    let records: Vec<(usize, EvaluationRecord)> = parse_jsonl(&read_input(input)?)?;
    let evaluator = Arc::new(CulturalEvaluator::from_config(config).await?);
    let concurrency = concurrency.max(1);

    let responses: Vec<_> = records.iter().map(|(_, r)| extract(&r.raw_text)).collect();
    info!(
        "Parsed {} responses ({:.1}% extracted)",
        responses.len(),
        parse_success_rate(&responses) * 100.0
    );

    let mut set: JoinSet<(usize, cultural_lens::Result<EvaluationMetrics>)> = JoinSet::new();
    let mut results: Vec<Option<EvaluationMetrics>> = vec![None; records.len()];
    for (idx, ((_, record), response)) in records.iter().zip(&responses).enumerate() {
        if evaluator.scenarios().get_scenario(&record.scenario_id).is_none() {
            warn!(
                "Unknown scenario '{}' for record {}; skipped",
                record.scenario_id, idx
            );
            continue;
        }
        while set.len() >= concurrency {
            if let Some(joined) = set.join_next().await {
                let (i, metrics) = joined?;
                results[i] = Some(metrics?);
            }
        }
        let evaluator = Arc::clone(&evaluator);
        let response = response.clone();
        let culture = record.culture.clone();
        let scenario_id = record.scenario_id.clone();
        set.spawn(async move {
            let metrics = evaluator
                .evaluate_by_id(&response, &culture, &scenario_id)
                .await;
            (idx, metrics)
        });
    }
    while let Some(joined) = set.join_next().await {
        let (i, metrics) = joined?;
        results[i] = Some(metrics?);
    }

    let stdout = std::io::stdout();
    let mut csv_writer = match format {
        OutputFormat::Csv => Some(csv::Writer::from_writer(stdout.lock())),
        OutputFormat::Jsonl => None,
    };
    let mut scored = Vec::new();
    for (((line, record), response), metrics) in records.iter().zip(&responses).zip(&results) {
        let Some(metrics) = metrics else { continue };
        scored.push(*metrics);
        let row = EvaluationRow {
            id: record.id.clone().unwrap_or_else(|| line.to_string()),
            culture: record.culture.clone(),
            scenario_id: record.scenario_id.clone(),
            extraction_succeeded: response.extraction_succeeded(),
            decision: response.decision().map(|d| d.label().to_string()),
            alignment: metrics.alignment.value(),
            stereotype: metrics.stereotype,
        };
        match csv_writer.as_mut() {
            Some(writer) => writer.serialize(&row)?,
            None => println!("{}", serde_json::to_string(&row)?),
        }
    }
    if let Some(mut writer) = csv_writer {
        writer.flush()?;
    }

    let summary = aggregate_metrics(&scored);
    info!(
        "Scored {} responses: mean alignment {:.2} (sd {:.2}, {} applicable), mean stereotype {:.2}",
        summary.count,
        summary.mean_alignment,
        summary.std_alignment,
        summary.applicable,
        summary.mean_stereotype
    );
    info!("Decisions: {:?}", decision_distribution(&responses));
    Ok(())
}

async fn baseline_command(config: &Config, input: Option<&Path>) -> Result<()> {
    let records: Vec<(usize, BaselineRecord)> = parse_jsonl(&read_input(input)?)?;
    let evaluator = CulturalEvaluator::from_config(config).await?;

    let responses: Vec<_> = records
        .into_iter()
        .map(|(_, r)| (extract(&r.raw_text), r.scenario_id))
        .collect();
    let distances = evaluator.baseline_bias(&responses).await?;
    let ranked = rank_cultures(&distances);
    if ranked.is_empty() {
        warn!("No usable baseline responses");
    }

    let report: Vec<serde_json::Value> = ranked
        .iter()
        .map(|(culture, distance)| serde_json::json!({ "culture": culture, "distance": distance }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn validate_command(config: &Config) -> Result<()> {
    let registry = config.data.cultures()?;
    let scenarios = config.data.scenarios()?;
    let exemplars = config.data.exemplars()?;

    let mismatches = registry.validate_against_raw();
    let stats = scenarios.stats();
    let report = serde_json::json!({
        "cultures": registry.ids().collect::<Vec<_>>(),
        "comparable_cultures": registry.comparable().count(),
        "scale_mismatches": mismatches,
        "scenarios": stats,
        "scenarios_balanced": scenarios.is_balanced(),
        "exemplar_phrases": exemplars.phrase_count(),
    });

    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;

    if !mismatches.is_empty() {
        warn!("{} scale mismatches between scores and raw index", mismatches.len());
    }
    if !scenarios.is_balanced() {
        warn!("Scenario catalog is not balanced across dimensions");
    }
    Ok(())
}
