//! recursive-unpack - unpack nested archives from the command line

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use recursive_unpack::{CopyConfig, UnpackReport, Unpacker, UnpackerConfig, copy_tree, unpack_all};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "recursive-unpack",
    version,
    about = "Recursively discover and extract nested archives",
    after_help = "EXAMPLES:\n  \
                  recursive-unpack file -a bundle.tar\n  \
                  recursive-unpack -o ./out -e .iso,.deb all -i ./downloads\n  \
                  recursive-unpack -o ./mirror copy -i ./data -x '.*\\.tmp'\n\n\
                  Exit status is 0 on success, 1 on a fatal error and 2 when\n\
                  at least one archive could not be unpacked."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output directory
    #[arg(short, long, default_value = "./unpack", global = true)]
    output_directory: PathBuf,

    /// Archive suffixes to leave alone (repeatable or comma separated, e.g. .iso,.deb)
    #[arg(short, long, value_delimiter = ',', global = true)]
    exclusions: Vec<String>,

    /// Log filter (e.g. "info", "debug", "recursive_unpack=trace"); RUST_LOG is used when absent
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// JSON configuration file for the unpacker
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep leftover archive files instead of running the cleanup pass
    #[arg(long, global = true)]
    no_clean: bool,

    /// Maximum archive nesting depth
    #[arg(long, global = true)]
    max_depth: Option<u32>,

    /// Write a JSON report of every archive outcome to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Unpack every archive directly in the input directory (subdirectories are not entered)
    All {
        /// Input directory
        #[arg(short, long, default_value = ".")]
        input_directory: PathBuf,
    },

    /// Unpack one archive
    File {
        /// Archive to unpack
        #[arg(short, long)]
        archive: PathBuf,
    },

    /// Mirror the input tree into the output directory, unpacking archives
    Copy {
        /// Input directory
        #[arg(short, long, default_value = ".")]
        input_directory: PathBuf,

        /// Regular expression for file names to skip, anchored at the start (repeatable)
        #[arg(short = 'x', long = "exclude-files")]
        file_exclusions: Vec<String>,

        /// Log and record failed copies instead of stopping
        #[arg(long)]
        skip_copy_errors: bool,
    },
}

fn init_tracing(log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to set tracing subscriber")
}

fn unpacker_config(cli: &Cli) -> Result<UnpackerConfig> {
    let mut config = match &cli.config {
        Some(path) => UnpackerConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => UnpackerConfig::default(),
    };
    config.exclusions.extend(cli.exclusions.iter().cloned());
    if cli.no_clean {
        config.clean = false;
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn write_report(path: &Path, report: &UnpackReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))
}

fn run(cli: Cli) -> Result<UnpackReport> {
    let unpacker = Unpacker::new(unpacker_config(&cli)?);
    tracing::debug!(extractor = unpacker.extractor_name(), "starting");

    let report = match &cli.command {
        Commands::All { input_directory } => {
            unpack_all(&unpacker, input_directory, &cli.output_directory)?
        }
        Commands::File { archive } => unpacker.unpack(archive, &cli.output_directory)?,
        Commands::Copy {
            input_directory,
            file_exclusions,
            skip_copy_errors,
        } => {
            let copy_config = CopyConfig {
                file_exclusions: file_exclusions.clone(),
                skip_copy_errors: *skip_copy_errors,
            };
            copy_tree(&unpacker, input_directory, &cli.output_directory, &copy_config)?
        }
    };

    if let Some(path) = &cli.report {
        write_report(path, &report)?;
    }
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_level.as_deref()) {
        eprintln!("error: {e:#}");
        return ExitCode::from(1);
    }

    match run(cli) {
        Ok(report) if report.has_failures() => {
            for failure in report.failures() {
                tracing::warn!(archive = %failure.archive.display(), "archive not unpacked");
            }
            ExitCode::from(2)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
