//! address-dedup CLI - flags near-duplicate addresses in a CSV table.

use address_dedup_service::config::MatchConfig;
use address_dedup_service::dto::{ColumnConfig, ExportMode};
use address_dedup_service::pipeline::Pipeline;
use address_dedup_service::report::ReportSummary;
use address_dedup_service::table::{read_table, write_export};
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// JSON output for a dedup run.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput {
    input: String,
    output: Option<String>,
    records: usize,
    #[serde(flatten)]
    summary: ReportSummary,
    elapsed_secs: f64,
}

/// Near-duplicate address detection.
///
/// Groups rows by postal code and flags addresses that differ only by
/// spelling, transliteration or punctuation but share house numbers and unit.
#[derive(Parser, Debug)]
#[command(name = "address-dedup")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input CSV file.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write flagged records to this CSV file.
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// JSON file with match configuration; flags below override it.
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Pairs must score strictly above this (0-100).
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Weight of the house-number similarity.
    #[arg(long)]
    num_weight: Option<f64>,

    /// Weight of the street-text similarity.
    #[arg(long)]
    text_weight: Option<f64>,

    /// Merge chains of matches into one cluster.
    #[arg(long)]
    transitive: bool,

    /// Column holding the free-text address.
    #[arg(long, default_value = "address")]
    address_column: String,

    /// Column holding the unit/apartment.
    #[arg(long, default_value = "apartment")]
    unit_column: String,

    /// Column holding the postal code used for grouping.
    #[arg(long, default_value = "tk")]
    group_column: String,

    /// Column holding a record id (row numbers are used otherwise).
    #[arg(long)]
    id_column: Option<String>,

    /// Export every input column instead of the projected ones.
    #[arg(long)]
    all_fields: bool,

    /// Print a JSON summary instead of the report.
    #[arg(long)]
    json: bool,

    /// Verbose logging on stderr.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn match_config(&self) -> Result<MatchConfig> {
        let mut config = match &self.config {
            Some(path) => MatchConfig::from_json_file(path)?,
            None => MatchConfig::default(),
        };
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(weight) = self.num_weight {
            config.num_weight = weight;
        }
        if let Some(weight) = self.text_weight {
            config.text_weight = weight;
        }
        config.transitive |= self.transitive;
        Ok(config)
    }

    fn columns(&self) -> ColumnConfig {
        ColumnConfig {
            address: self.address_column.clone(),
            unit: self.unit_column.clone(),
            group: self.group_column.clone(),
            id: self.id_column.clone(),
        }
    }

    fn export_mode(&self) -> ExportMode {
        if self.all_fields {
            ExportMode::AllFields
        } else {
            ExportMode::Projected
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    if !args.input.exists() {
        bail!("input file not found: {}", args.input.display());
    }
    let start = Instant::now();
    let pipeline = Pipeline::new(args.match_config()?)?;
    let columns = args.columns();

    let file = File::open(&args.input)
        .with_context(|| format!("unable to open {}", args.input.display()))?;
    let table = read_table(file, &columns)
        .with_context(|| format!("unable to read {}", args.input.display()))?;
    info!(rows = table.rows.len(), "table loaded");

    let records = pipeline.normalize_records(table.rows);
    let report = pipeline.run(&records);

    if let Some(output) = &args.output {
        let file = File::create(output)
            .with_context(|| format!("unable to create {}", output.display()))?;
        write_export(
            BufWriter::new(file),
            &report,
            &table.headers,
            &columns,
            args.export_mode(),
        )
        .with_context(|| format!("unable to write {}", output.display()))?;
        info!(path = %output.display(), flagged = report.flagged.len(), "export written");
    }

    if args.json {
        let output = JsonOutput {
            input: args.input.display().to_string(),
            output: args.output.as_ref().map(|p| p.display().to_string()),
            records: records.len(),
            summary: report.summary(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
