//! pdf-to-png - efficient batch PDF to image converter.
//!
//! CLI entry point: argument parsing, logging setup, progress rendering,
//! and Ctrl-C wiring around the core batch dispatcher.

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_to_png_core::{
    find_documents, BatchDispatcher, ConversionOptions, ImageFormat, PdfiumEngine, ProgressEvent,
    ProgressSink,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Efficient batch PDF to PNG/JPEG converter.
#[derive(Parser, Debug)]
#[command(name = "pdf-to-png")]
#[command(version)]
#[command(about = "Efficient batch PDF to PNG/JPEG converter", long_about = None)]
struct Cli {
    /// Directory containing PDF files to convert
    input_dir: PathBuf,

    /// Directory where image files will be saved
    output_dir: PathBuf,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long = "jobs", default_value_t = 0)]
    jobs: usize,

    /// Output resolution in DPI
    #[arg(short, long, default_value_t = 150.0)]
    dpi: f64,

    /// Output format: png or jpg
    #[arg(short, long, default_value = "png")]
    format: ImageFormat,

    /// Maximum output width in pixels (0 = unconstrained)
    #[arg(long, default_value_t = 0)]
    max_width: u32,

    /// Maximum output height in pixels (0 = unconstrained)
    #[arg(long, default_value_t = 0)]
    max_height: u32,

    /// Don't preserve aspect ratio when scaling down to the maximums
    #[arg(long = "no-aspect-ratio")]
    no_aspect_ratio: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Print the batch summary as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions {
            dpi: self.dpi,
            format: self.format,
            max_width: self.max_width,
            max_height: self.max_height,
            preserve_aspect_ratio: !self.no_aspect_ratio,
        }
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let options = cli.conversion_options();
    options
        .validate()
        .context("invalid conversion options")?;

    let documents =
        find_documents(&cli.input_dir).context("failed to scan input directory")?;

    info!("Input directory: {}", cli.input_dir.display());
    info!("Output directory: {}", cli.output_dir.display());
    info!("DPI: {}", options.dpi);
    info!("Format: {}", options.format);

    let dispatcher = BatchDispatcher::new(Arc::new(PdfiumEngine::new()), options, cli.jobs);
    info!("Workers: {}", dispatcher.worker_count());

    // Ctrl-C requests cooperative cancellation; in-flight renders finish.
    let token = dispatcher.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Cancellation requested, letting in-flight work finish");
            token.cancel();
        }
    });

    let bar = if cli.quiet || cli.json {
        None
    } else {
        let bar = ProgressBar::new(documents.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{percent:>3}% |{bar:40}| {pos}/{len} {msg} [{elapsed_precise}]",
            )
            .unwrap()
            .progress_chars("█░ "),
        );
        Some(Arc::new(bar))
    };

    let progress: Option<ProgressSink> = bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Arc::new(move |event: ProgressEvent| {
            bar.set_message(format!(
                "{} (pages: {})",
                event.document_name, event.pages_processed
            ));
            bar.inc(1);
        }) as ProgressSink
    });

    let start = Instant::now();
    let result = dispatcher.run(documents, &cli.output_dir, progress).await;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        info!(
            "Conversion completed in {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
        info!(
            "PDFs processed: {}/{}",
            result.successful_conversions, result.total_pdfs
        );
        info!("Total pages converted: {}", result.total_pages_converted);

        if result.failed_conversions > 0 {
            warn!("Failed conversions: {}", result.failed_conversions);
        }
        if cli.verbose {
            for e in &result.errors {
                error!("  {}", e);
            }
        }
    }

    if result.successful_conversions == 0 {
        error!("No PDFs were successfully converted");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_args() {
        let cli = Cli::try_parse_from(["pdf-to-png", "/in", "/out"]).unwrap();
        assert_eq!(cli.input_dir, PathBuf::from("/in"));
        assert_eq!(cli.output_dir, PathBuf::from("/out"));
        assert_eq!(cli.jobs, 0);
        assert_eq!(cli.dpi, 150.0);
        assert_eq!(cli.format, ImageFormat::Png);
        assert!(!cli.no_aspect_ratio);
    }

    #[test]
    fn test_parse_full_flags() {
        let cli = Cli::try_parse_from([
            "pdf-to-png",
            "-j",
            "8",
            "-d",
            "200",
            "-f",
            "jpg",
            "--max-width",
            "1920",
            "--max-height",
            "1080",
            "--no-aspect-ratio",
            "-v",
            "/pdfs",
            "/images",
        ])
        .unwrap();

        assert_eq!(cli.jobs, 8);
        assert_eq!(cli.dpi, 200.0);
        assert_eq!(cli.format, ImageFormat::Jpeg);
        assert_eq!(cli.max_width, 1920);
        assert_eq!(cli.max_height, 1080);
        assert!(cli.no_aspect_ratio);
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        let result = Cli::try_parse_from(["pdf-to-png", "-f", "bmp", "/in", "/out"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_requires_both_directories() {
        let result = Cli::try_parse_from(["pdf-to-png", "/in"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_options_mapping_inverts_aspect_flag() {
        let cli =
            Cli::try_parse_from(["pdf-to-png", "--no-aspect-ratio", "/in", "/out"]).unwrap();
        let options = cli.conversion_options();
        assert!(!options.preserve_aspect_ratio);

        let cli = Cli::try_parse_from(["pdf-to-png", "/in", "/out"]).unwrap();
        assert!(cli.conversion_options().preserve_aspect_ratio);
    }
}
