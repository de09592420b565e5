//! CLI tool for dumping text, fonts, tables, images and layouts from
//! PowerPoint files.

use anyhow::{Context, Result};
use clap::Parser;
use deckdump_core::{Error, ExtractConfig, ExtractionSummary, ImageNaming};
use deckdump_pptx::PptxLoader;
use std::path::{Path, PathBuf};

/// Dump a presentation's text, fonts, tables, images and layouts to a report.
#[derive(Parser, Debug)]
#[command(name = "deckdump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    input: PathBuf,

    /// Output directory for the report and extracted images
    #[arg(short, long, default_value = "pptx_extraction")]
    output: PathBuf,

    /// Name extracted images after their embedded format instead of .png
    #[arg(long)]
    keep_image_extension: bool,

    /// Print a JSON summary of the run to stdout
    #[arg(long)]
    summary_json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> ExtractConfig {
        let naming = if self.keep_image_extension {
            ImageNaming::SourceExtension
        } else {
            ImageNaming::AlwaysPng
        };
        ExtractConfig::new(&self.input, &self.output).with_image_naming(naming)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = args.config();
    if args.verbose {
        eprintln!("Processing: {}", config.input().display());
    }

    let summary = deckdump_core::run(&PptxLoader::new(), &config).map_err(|e| {
        let context = failure_context(&e, config.input());
        anyhow::Error::new(e).context(context)
    })?;

    if args.verbose {
        print_summary(&summary);
    }

    if args.summary_json {
        let json = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize extraction summary")?;
        println!("{}", json);
    }

    Ok(())
}

/// Say whether the input could not be read or the report could not be
/// written.
fn failure_context(err: &Error, input: &Path) -> String {
    if err.is_load_error() {
        format!("Failed to load {}", input.display())
    } else {
        format!("Failed to extract {}", input.display())
    }
}

/// Human-readable run summary on stderr.
fn print_summary(summary: &ExtractionSummary) {
    eprintln!("  Found {} slides", summary.slides);
    eprintln!(
        "  Extracted {} paragraphs ({} runs), {} tables ({} rows)",
        summary.paragraphs, summary.runs, summary.tables, summary.table_rows
    );
    eprintln!(
        "  Wrote {} images and {} layout names",
        summary.images.len(),
        summary.layouts
    );
    eprintln!("Written to: {}", summary.report_path.display());
}
