//! Command-line interface components.

use crate::config::{
    CompressionAlgorithm, HeaderLayout, NumericDetection, OutputFormat, ProcessorConfig,
    RowWidthPolicy,
};
use crate::constants::{STATION_METADATA_KEY, STATION_METADATA_LINE};
use crate::models::ProcessingStats;
use crate::processor::DatasetProcessor;
use crate::processor::discovery::FileDiscovery;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "inmet_processor")]
#[command(about = "Consolidate INMET weather-station CSV exports into a single clean table")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Input files, directories (their *.csv and *.CSV files) or glob patterns
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Consolidated output file
    #[arg(short, long, default_value = "consolidated.csv")]
    pub output: PathBuf,

    /// Output format (csv, parquet); inferred from the output extension if omitted
    #[arg(long)]
    pub format: Option<String>,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// Literal start of the header line to scan for
    #[arg(long, conflicts_with = "header_line")]
    pub signature: Option<String>,

    /// Use a fixed 0-based header line instead of scanning
    #[arg(long)]
    pub header_line: Option<usize>,

    /// Minimum line count for fixed-layout files (default: header line + 2)
    #[arg(long, requires = "header_line")]
    pub min_lines: Option<usize>,

    /// 0-based metadata line holding the station name
    #[arg(long, default_value_t = STATION_METADATA_LINE)]
    pub station_line: usize,

    /// Ignore the fixed station metadata line
    #[arg(long)]
    pub no_station_line: bool,

    /// Metadata key holding the station name
    #[arg(long, default_value = STATION_METADATA_KEY)]
    pub station_key: String,

    /// Ignore the station metadata key
    #[arg(long)]
    pub no_station_key: bool,

    /// Numeric detection strategy (column-set, shape)
    #[arg(long, default_value = "column-set")]
    pub numeric_detection: String,

    /// Extra column treated as numeric (repeatable)
    #[arg(long = "numeric-column", value_name = "NAME")]
    pub numeric_columns: Vec<String>,

    /// Extra column that may contain stray delimiters (repeatable)
    #[arg(long = "dirty-column", value_name = "NAME")]
    pub dirty_columns: Vec<String>,

    /// Source value meaning "no observation", e.g. -9999 (repeatable)
    #[arg(long = "missing-value", value_name = "VALUE", allow_hyphen_values = true)]
    pub missing_values: Vec<String>,

    /// How missing values are written in CSV output
    #[arg(long, allow_hyphen_values = true)]
    pub missing_marker: Option<String>,

    /// Delimiter of the CSV output
    #[arg(long, default_value_t = ',')]
    pub output_delimiter: char,

    /// Add the metadata lines as constant columns
    #[arg(long)]
    pub metadata_columns: bool,

    /// Skip a file on the first malformed row instead of dropping the row
    #[arg(long)]
    pub fail_on_malformed_rows: bool,

    /// Keep the empty column produced by a trailing delimiter
    #[arg(long)]
    pub keep_trailing_column: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Map the arguments onto a processor configuration
    pub fn build_config(&self) -> Result<ProcessorConfig> {
        let mut config = ProcessorConfig::default();

        if let Some(header_line) = self.header_line {
            config = config.with_header_layout(HeaderLayout::FixedOffset {
                header_line,
                min_lines: self.min_lines.unwrap_or(header_line + 2),
            });
        } else if let Some(signature) = &self.signature {
            config = config.with_signature(signature.clone());
        }

        let station_line = (!self.no_station_line).then_some(self.station_line);
        let station_key = (!self.no_station_key).then(|| self.station_key.clone());
        config = config
            .with_station_line(station_line)
            .with_station_key(station_key)
            .with_numeric_detection(self.numeric_detection.parse::<NumericDetection>()?)
            .with_numeric_columns(self.numeric_columns.iter().cloned())
            .with_dirty_columns(self.dirty_columns.iter().cloned())
            .with_output_delimiter(self.output_delimiter);

        if !self.missing_values.is_empty() {
            config = config.with_missing_values(self.missing_values.iter().cloned());
        }
        if let Some(marker) = &self.missing_marker {
            config.missing_marker = marker.clone();
        }
        if self.metadata_columns {
            config = config.with_metadata_columns();
        }
        if self.fail_on_malformed_rows {
            config = config.with_row_width_policy(RowWidthPolicy::FailFile);
        }
        config.drop_trailing_empty_column = !self.keep_trailing_column;

        let format = match &self.format {
            Some(format) => format.parse::<OutputFormat>()?,
            None => OutputFormat::from_path(&self.output).unwrap_or_default(),
        };
        config = config.with_output_format(format);
        config.compression = self.compression.parse::<CompressionAlgorithm>()?;

        config.validate()?;
        Ok(config)
    }
}

/// Initialise the tracing subscriber on stderr
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("inmet_processor={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Discover inputs, consolidate them and write the output
pub fn run(args: &Args) -> Result<ProcessingStats> {
    let config = args.build_config().context("Invalid configuration")?;

    let files = FileDiscovery::new(args.inputs.iter().cloned())
        .discover_csv_files()
        .context("Failed to expand inputs")?;
    info!("Found {} candidate files", files.len());

    let processor = DatasetProcessor::with_config(args.output.clone(), config)?
        .with_progress(!args.no_progress && !args.quiet);

    let stats = processor
        .process(&files)
        .with_context(|| format!("Failed to consolidate into {}", args.output.display()))?;

    Ok(stats)
}

/// Print the run report
pub fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files seen:".bright_cyan(),
        stats.files_seen.to_string().bright_white()
    );
    if stats.duplicates_removed > 0 {
        println!(
            "  {} {}",
            "Duplicates ignored:".bright_cyan(),
            stats.duplicates_removed.to_string().bright_white()
        );
    }
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
        for skipped in &stats.skipped {
            println!(
                "    {} {}",
                skipped.path.display().to_string().yellow(),
                skipped.reason
            );
        }
    }
    println!(
        "  {} {}",
        "Total rows:".bright_cyan(),
        stats.total_rows.to_string().bright_white().bold()
    );
    if stats.rows_dropped > 0 {
        println!(
            "  {} {}",
            "Rows dropped:".bright_yellow(),
            stats.rows_dropped.to_string().bright_yellow()
        );
    }
    if stats.rows_repaired > 0 {
        println!(
            "  {} {}",
            "Rows repaired:".bright_cyan(),
            stats.rows_repaired.to_string().bright_white()
        );
    }
    if stats.values_coerced > 0 {
        println!(
            "  {} {}",
            "Values coerced to missing:".bright_yellow(),
            stats.values_coerced.to_string().bright_yellow()
        );
    }
    println!(
        "  {} {}",
        "Columns:".bright_cyan(),
        stats.schema.join(", ").bright_white()
    );
    println!(
        "  {} {} ({} bytes)",
        "Output:".bright_cyan(),
        stats.output_path.display().to_string().bright_white(),
        stats.output_bytes
    );
}
