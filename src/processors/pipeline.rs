use crate::analyzers::{ReportFormat, SampleRow, TableReporter};
use crate::archive::ArchiveExtractor;
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{ConsolidationStats, ExtractionStats, SourceFormat};
use crate::processors::{Consolidator, Transformer};
use crate::readers::FieldExtractor;
use crate::utils::ProgressReporter;
use crate::writers::SqliteLoader;
use chrono::{DateTime, Local};
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tracing::{error, info, warn};

/// The units of work a pipeline run is made of, in dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStep {
    Unpack,
    Extract(SourceFormat),
    Consolidate,
    Transform,
    Load,
    Query,
}

impl PipelineStep {
    pub fn task_id(&self) -> &'static str {
        match self {
            PipelineStep::Unpack => "unzip_data",
            PipelineStep::Extract(SourceFormat::Csv) => "extract_data_from_csv",
            PipelineStep::Extract(SourceFormat::Tsv) => "extract_data_from_tsv",
            PipelineStep::Extract(SourceFormat::FixedWidth) => "extract_data_from_fixed_width",
            PipelineStep::Consolidate => "consolidate_data",
            PipelineStep::Transform => "transform_data",
            PipelineStep::Load => "load_data",
            PipelineStep::Query => "query_data",
        }
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.task_id())
    }
}

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.retries, config.retry_delay())
    }

    /// Run `op` until it succeeds or the retries are used up. The final
    /// error is wrapped with the step it came from.
    pub async fn run<T, F, Fut>(&self, step: PipelineStep, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "Step {} failed ({}), retry {}/{} in {:?}",
                        step, e, attempt, self.retries, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    error!("Step {} failed after {} attempts: {}", step, attempt + 1, e);
                    return Err(ProcessingError::Step {
                        step,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}

/// Run a blocking step on the blocking thread pool
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub unpacked_files: usize,
    pub extraction: Vec<(SourceFormat, ExtractionStats)>,
    pub consolidation: ConsolidationStats,
    pub transformed_rows: usize,
    pub loaded_rows: usize,
    pub sample: Vec<SampleRow>,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Pipeline run:\n  Started: {}\n  Duration: {:.1}s\n  Unpacked files: {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0,
            self.unpacked_files
        );
        for (format, stats) in &self.extraction {
            summary.push_str(&format!("  Extracted {}: {}\n", format, stats.summary()));
        }
        summary.push_str(&format!(
            "  Consolidated: {}\n  Transformed rows: {}\n  Loaded rows: {}\n",
            self.consolidation.summary(),
            self.transformed_rows,
            self.loaded_rows
        ));
        summary
    }
}

/// Runs every step in order: unpack, the three extractions concurrently,
/// consolidate, transform, load and query
pub struct Pipeline {
    config: PipelineConfig,
    retry: RetryPolicy,
    progress: ProgressReporter,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            config,
            retry,
            progress: ProgressReporter::silent(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.progress = ProgressReporter::new_spinner("Starting pipeline...", !show);
        self
    }

    /// Execute the whole pipeline and write the sampled rows to `writer`
    pub async fn run<W: Write>(&self, format: ReportFormat, writer: W) -> Result<RunSummary> {
        let started_at = Local::now();
        let config = &self.config;
        info!("Starting pipeline in {}", config.data_dir.display());

        self.progress.set_message("Unpacking archive...");
        let unpacked = self
            .retry
            .run(PipelineStep::Unpack, || {
                let archive = config.archive_path();
                let destination = config.data_dir.clone();
                blocking(move || ArchiveExtractor::new().unpack(&archive, &destination))
            })
            .await?;

        self.progress.set_message("Extracting fields...");
        let (csv, tsv, fixed_width) = tokio::try_join!(
            self.extract(SourceFormat::Csv),
            self.extract(SourceFormat::Tsv),
            self.extract(SourceFormat::FixedWidth),
        )?;

        self.progress.set_message("Consolidating...");
        let consolidation = self
            .retry
            .run(PipelineStep::Consolidate, || {
                let inputs = config.extracted_paths();
                let output = config.consolidated_path();
                blocking(move || Consolidator::new().consolidate(&inputs, &output))
            })
            .await?;

        self.progress.set_message("Transforming...");
        let transformed_rows = self
            .retry
            .run(PipelineStep::Transform, || {
                let input = config.consolidated_path();
                let output = config.transformed_path();
                blocking(move || Transformer::new().transform_file(&input, &output))
            })
            .await?;

        self.progress.set_message("Loading...");
        let loaded_rows = self
            .retry
            .run(PipelineStep::Load, || {
                let input = config.transformed_path();
                let database = config.database.clone();
                let table = config.table_name.clone();
                blocking(move || SqliteLoader::new(&table)?.load_file(&input, &database))
            })
            .await?;

        self.progress.set_message("Querying...");
        let sample = self
            .retry
            .run(PipelineStep::Query, || {
                let database = config.database.clone();
                let table = config.table_name.clone();
                let limit = config.sample_size;
                blocking(move || TableReporter::new(&table)?.with_limit(limit).sample(&database))
            })
            .await?;

        TableReporter::new(&config.table_name)?.emit(&sample, format, writer)?;

        let summary = RunSummary {
            started_at,
            finished_at: Local::now(),
            unpacked_files: unpacked.len(),
            extraction: vec![
                (SourceFormat::Csv, csv),
                (SourceFormat::Tsv, tsv),
                (SourceFormat::FixedWidth, fixed_width),
            ],
            consolidation,
            transformed_rows,
            loaded_rows,
            sample,
        };

        self.progress
            .finish_with_message(&format!("Loaded {} rows", summary.loaded_rows));
        info!("Pipeline finished: {} rows loaded", summary.loaded_rows);
        Ok(summary)
    }

    async fn extract(&self, format: SourceFormat) -> Result<ExtractionStats> {
        let stats = self
            .retry
            .run(PipelineStep::Extract(format), || {
                let input = self.config.source_path(format);
                let output = self.config.extracted_path(format);
                blocking(move || FieldExtractor::for_format(format).extract_file(&input, &output))
            })
            .await?;
        self.progress
            .println(&format!("Extracted {} data: {}", format, stats.summary()));
        Ok(stats)
    }
}
