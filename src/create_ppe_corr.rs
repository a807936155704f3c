/*
cargo run --release --bin create_ppe_corr

cargo run --release --bin create_ppe_corr -- \
    --output data/PPE_Corr.json \
    --benchmarks math,gpqa \
    --skip-failed

offline, rows already on disk as <name>.jsonl
cargo run --release --bin create_ppe_corr -- \
    --local-dir data/ppe_rows \
    --sort-by-id
*/

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{error, info};
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

use ppe_corr::{
    benchmarks, build_dataset, write_records, BuildOptions, EmptyBucketPolicy, HubSource,
    LocalSource, OutputPolicy, RecordOrder, RetrievalPolicy, RowSource,
};

// Build PPE_Corr.json (prompt, chosen, rejected) from the PPE correctness benchmarks
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    // Output JSON file
    #[arg(short, long, default_value = "PPE_Corr.json")]
    output: PathBuf,

    // Dataset split to load for every benchmark (each defaults to train)
    #[arg(long)]
    split: Option<String>,

    // Hub revision of the dataset repos
    #[arg(long, default_value = "main")]
    revision: String,

    // HF access token (falls back to cached creds)
    #[arg(long, env = "HF_TOKEN")]
    token: Option<String>,

    // Read rows from local JSON / JSONL files instead of the Hub
    #[arg(long, value_name = "DIR")]
    local_dir: Option<PathBuf>,

    // Subset of benchmarks by name or domain, e.g. math,gpqa
    #[arg(long, value_delimiter = ',')]
    benchmarks: Vec<String>,

    // Keep prompts whose chosen or rejected list ended up empty
    #[arg(long)]
    keep_empty: bool,

    // Sort records by (domain, id) instead of first-seen order
    #[arg(long)]
    sort_by_id: bool,

    // Skip benchmarks that fail to load instead of aborting
    #[arg(long)]
    skip_failed: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logging setup
    create_dir_all(&cli.log_dir)
        .with_context(|| format!("creating log dir {:?}", cli.log_dir))?;
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = cli.log_dir.join(format!("create_ppe_corr_{ts}.log"));
    WriteLogger::init(
        LevelFilter::Info,
        LogConfig::default(),
        File::create(&log_path)?,
    )?;
    info!("Starting PPE correctness build");

    let selected = if cli.benchmarks.is_empty() {
        benchmarks::CORRECTNESS_BENCHMARKS.to_vec()
    } else {
        benchmarks::select(&cli.benchmarks)
            .map_err(|bad| anyhow::anyhow!("unknown benchmark '{bad}'"))?
    };

    let source: Box<dyn RowSource> = match &cli.local_dir {
        Some(dir) => Box::new(LocalSource::new(dir)),
        None => Box::new(
            HubSource::new(cli.token.clone(), cli.revision.clone())
                .context("setting up Hub client")?,
        ),
    };

    let opts = BuildOptions {
        split: cli.split.clone(),
        output: OutputPolicy {
            empty: if cli.keep_empty {
                EmptyBucketPolicy::Keep
            } else {
                EmptyBucketPolicy::Drop
            },
            order: if cli.sort_by_id {
                RecordOrder::DomainId
            } else {
                RecordOrder::FirstSeen
            },
        },
        retrieval: if cli.skip_failed {
            RetrievalPolicy::Skip
        } else {
            RetrievalPolicy::Abort
        },
        progress: true,
    };

    let report = match build_dataset(source.as_ref(), &selected, &opts) {
        Ok(r) => r,
        Err(e) => {
            error!("Build failed: {e}");
            return Err(e).context("loading benchmarks");
        }
    };

    write_records(&cli.output, &report.records)
        .with_context(|| format!("writing {:?}", cli.output))?;
    info!("Wrote {} records → {:?}", report.records.len(), cli.output);

    println!("\n=== PPE correctness summary ===");
    for b in &report.benchmarks {
        match &b.error {
            Some(e) => println!("{:<22}: FAILED ({e})", b.name),
            None => println!(
                "{:<22}: {} rows, {} prompts, {} skipped rows, {} bad pairs, {} ties, {} out-of-range",
                b.name,
                b.rows_read,
                b.prompts,
                b.rows_skipped,
                b.malformed_pairs,
                b.stats.ties,
                b.stats.out_of_range
            ),
        }
    }
    println!("Total records          : {}", report.records.len());
    println!("Output JSON            : {:?}", cli.output);
    println!("Log file               : {:?}", log_path);

    let failed: Vec<&str> = report.failed().map(|b| b.name.as_str()).collect();
    if !failed.is_empty() {
        println!("Skipped benchmarks     : {}", failed.join(", "));
    }

    Ok(())
}
