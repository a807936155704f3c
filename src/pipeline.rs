//! Drives every benchmark through source -> resolver -> aggregator.

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::aggregator::{OutputPolicy, PromptAggregator, Record};
use crate::benchmarks::BenchmarkSpec;
use crate::error::{PpeError, Result};
use crate::resolver::{resolve, ResolveStats};
use crate::row::Row;
use crate::source::RowSource;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalPolicy {
    /// First failed benchmark ends the run.
    #[default]
    Abort,
    /// Log, leave the benchmark out, report it at the end.
    Skip,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Overrides every benchmark's own split when set.
    pub split: Option<String>,
    pub output: OutputPolicy,
    pub retrieval: RetrievalPolicy,
    pub progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            split: None,
            output: OutputPolicy::default(),
            retrieval: RetrievalPolicy::default(),
            progress: false,
        }
    }
}

impl BuildOptions {
    pub fn split_for<'a>(&'a self, bench: &'a BenchmarkSpec) -> &'a str {
        self.split.as_deref().unwrap_or(bench.split)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BenchmarkReport {
    pub name: String,
    pub domain: String,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub malformed_pairs: usize,
    pub stats: ResolveStats,
    // distinct prompts seen in this benchmark
    pub prompts: usize,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub benchmarks: Vec<BenchmarkReport>,
    pub records: Vec<Record>,
}

impl BuildReport {
    pub fn failed(&self) -> impl Iterator<Item = &BenchmarkReport> {
        self.benchmarks.iter().filter(|b| b.error.is_some())
    }
}

pub fn build_dataset(
    source: &dyn RowSource,
    benchmarks: &[BenchmarkSpec],
    opts: &BuildOptions,
) -> Result<BuildReport> {
    let mut agg = PromptAggregator::new();
    let mut reports = Vec::with_capacity(benchmarks.len());

    for bench in benchmarks {
        info!("Loading {} ({}, split {})", bench.name, bench.repo, opts.split_for(bench));
        let mut report = BenchmarkReport {
            name: bench.name.to_string(),
            domain: bench.domain.to_string(),
            ..Default::default()
        };

        let rows = match read_rows(source, bench, opts, &mut report) {
            Ok(rows) => rows,
            Err(e) if opts.retrieval == RetrievalPolicy::Skip && e.is_retrieval() => {
                warn!("Skipping {}: {e}", bench.name);
                report.error = Some(e.to_string());
                reports.push(report);
                continue;
            }
            Err(e) => return Err(e),
        };

        let before = agg.len();
        let mut seen = std::collections::HashSet::new();
        for row in &rows {
            let (resolution, stats) = resolve(row);
            report.stats += stats;
            agg.absorb(bench.domain, &row.prompt, row.question_id.as_deref(), &resolution);
            seen.insert(row.prompt.as_str());
        }
        report.prompts = seen.len();

        info!(
            "  Processed {} prompts from {} ({} new, {} rows skipped, {} ties, {} out-of-range)",
            report.prompts,
            bench.name,
            agg.len() - before,
            report.rows_skipped,
            report.stats.ties,
            report.stats.out_of_range
        );
        reports.push(report);
    }

    let records = agg.finalize(opts.output);
    info!("Total records: {}", records.len());
    Ok(BuildReport {
        benchmarks: reports,
        records,
    })
}

// All rows of one benchmark are read before any reaches the aggregator,
// so a failing source never leaves half a benchmark behind.
fn read_rows(
    source: &dyn RowSource,
    bench: &BenchmarkSpec,
    opts: &BuildOptions,
    report: &mut BenchmarkReport,
) -> Result<Vec<Row>> {
    let stream = source.load(bench, opts.split_for(bench))?;
    let bar = progress_bar(stream.len_hint, opts.progress);
    bar.set_message(bench.name);

    let mut rows = Vec::with_capacity(stream.len_hint.unwrap_or(0) as usize);
    for raw in stream.rows {
        let raw = match raw {
            Ok(v) => v,
            Err(e) => {
                bar.abandon();
                return Err(match e {
                    PpeError::Retrieval { .. } | PpeError::NotFound { .. } => e,
                    other => PpeError::retrieval(bench.name, other.to_string()),
                });
            }
        };
        report.rows_read += 1;
        bar.inc(1);

        match raw.and_then(|v| Row::from_value(&v)) {
            Ok(row) => {
                report.malformed_pairs += row.malformed_pairs;
                rows.push(row);
            }
            Err(why) => {
                report.rows_skipped += 1;
                warn!("{} row {}: {why}, skipped", bench.name, report.rows_read);
            }
        }
    }
    bar.finish_and_clear();
    Ok(rows)
}

fn progress_bar(len: Option<u64>, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    match len {
        Some(n) => {
            let bar = ProgressBar::new(n);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            ) {
                bar.set_style(style);
            }
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} rows {msg}")
            {
                bar.set_style(style);
            }
            bar
        }
    }
}
