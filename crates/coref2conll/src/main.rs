use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

use coref2conll::{Config, Converter, check_output, convert_dirs};

/// Convert coreference data in NAF or MMAX form to CoNLL.
///
/// To convert directories recursively:
///
///     coref2conll <output folder> -d <input folder> [-d <input folder> ...]
///
/// To convert one file:
///
///     coref2conll <output.conll> <input file>
///
/// In batch mode every directory containing input files is saved under the
/// output folder at the same relative path it has inside the folder passed
/// with -d. Output of two folders with the same relative path is merged.
#[derive(Debug, Parser)]
#[command(name = "coref2conll", version, verbatim_doc_comment)]
struct Cli {
    /// Logging level (overrides RUST_LOG)
    #[arg(short, long)]
    log_level: Option<String>,
    /// Directory to batch convert files from
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    directories: Vec<PathBuf>,
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Where to save the CoNLL output
    output: PathBuf,
    /// Input file to convert
    #[arg(conflicts_with = "directories", required_unless_present = "directories")]
    input: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    debug!("args: {cli:?}");

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let batch = !cli.directories.is_empty();
    check_output(&cli.output, config.allow_overwriting, batch)?;

    let converter = Converter::new(config)?;
    let start = Instant::now();
    if batch {
        let summary = convert_dirs(&converter, &cli.directories, &cli.output)?;
        info!(
            "converted {} files, skipped {}",
            summary.converted, summary.skipped
        );
    } else if let Some(input) = &cli.input {
        converter.convert_file(input, &cli.output)?;
    }
    info!("done in {} ms", start.elapsed().as_millis());
    Ok(())
}

fn init_tracing(level: Option<&str>) {
    let env_filter = match level {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
