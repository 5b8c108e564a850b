//! # Golden Compliance CLI
//!
//! `golden-compliance check` evaluates a device manifest against golden
//! configuration rules; `golden-compliance validate` checks rule files only.

use clap::{Parser, Subcommand, ValueEnum};
use golden_cli::{initialize, run_check, run_validate, CheckOptions, ExitStatus, GlobalOptions, LogFormat};
use golden_engine::ReportFormat;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "golden-compliance",
    version,
    about = "Golden configuration compliance engine",
    propagate_version = true,
    after_help = "Exit codes: 0 compliant, 1 non-compliant, 2 evaluation errors, 3 usage or rule errors."
)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    /// Enable debug logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate devices against golden configuration rules
    Check {
        /// Rule file or directory of rule files
        #[arg(long)]
        rules: PathBuf,

        /// Device manifest (TOML)
        #[arg(long)]
        devices: PathBuf,

        /// Write the report to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = FormatArg::Pretty)]
        format: FormatArg,

        /// Worker threads; 0 uses one per logical CPU
        #[arg(long)]
        threads: Option<usize>,

        /// Per-device timeout in milliseconds; 0 disables it
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Stop starting new devices after this many seconds
        #[arg(long)]
        batch_timeout_secs: Option<u64>,
    },

    /// Validate rule files without evaluating devices
    Validate {
        /// Rule file or directory of rule files
        #[arg(long)]
        rules: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pretty,
    Compact,
    Summary,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pretty => ReportFormat::Pretty,
            FormatArg::Compact => ReportFormat::Compact,
            FormatArg::Summary => ReportFormat::Summary,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Console,
    Structured,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalOptions {
        config: cli.config,
        log_format: cli.log_format.map(|format| match format {
            LogFormatArg::Console => LogFormat::Console,
            LogFormatArg::Structured => LogFormat::Structured,
        }),
        verbose: cli.verbose,
    };

    let outcome = initialize(&global).and_then(|runtime| match cli.command {
        Commands::Check {
            rules,
            devices,
            output,
            format,
            threads,
            timeout_ms,
            batch_timeout_secs,
        } => run_check(
            &runtime,
            &CheckOptions {
                rules,
                devices,
                output,
                format: format.into(),
                threads,
                timeout_ms,
                batch_timeout_secs,
            },
        ),
        Commands::Validate { rules } => run_validate(&runtime, &rules),
    });

    match outcome {
        Ok(status) => process::exit(status.code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(ExitStatus::UsageError.code());
        }
    }
}
