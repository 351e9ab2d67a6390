//! DAS operator tool.
//!
//! Lists and explains status codes, verifies the registry, and drives the C
//! boundary probe.
//!
//! Usage:
//!   das codes --format json
//!   das explain 0xBFFFFFE9 --locale zh-cn
//!   das probe -1073741847 "Test error message" --language csharp

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use das_bridge::{BridgeConfig, TargetLanguage};
use das_cli::{CodesFormat, check_registry, codes_report, explain_report, probe_report};
use das_core::DasStatus;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bridge configuration file (TOML). `DAS_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every registered status code.
    Codes {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Describe one status: name, bit fields, and explanation.
    Explain {
        /// Name, decimal value, or 0x-prefixed bit pattern.
        #[arg(allow_hyphen_values = true)]
        code: DasStatus,

        /// Locale for the explanation (default: configured locale).
        #[arg(long)]
        locale: Option<String>,
    },

    /// Verify the registry: one success value, distinct negative failures.
    Check,

    /// Raise a failure through the C probe and show what the caller receives.
    Probe {
        /// Status to raise.
        #[arg(allow_hyphen_values = true)]
        code: DasStatus,

        /// Message to raise it with.
        message: String,

        /// Binding whose member names are used in the output.
        #[arg(long, default_value = "c")]
        language: TargetLanguage,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
    Toml,
}

impl From<Format> for CodesFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => CodesFormat::Text,
            Format::Json => CodesFormat::Json,
            Format::Toml => CodesFormat::Toml,
        }
    }
}

fn main() -> Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    das_bridge::config::init_tracing(&config.log_filter);
    das_bridge::config::initialize(&config).context("failed to apply bridge configuration")?;
    info!(locale = %config.locale, "configuration loaded");

    match args.command {
        Command::Codes { format } => print!("{}", codes_report(format.into())?),
        Command::Explain { code, locale } => print!("{}", explain_report(code, locale.as_deref())?),
        Command::Check => {
            let problems = check_registry(DasStatus::ALL);
            if !problems.is_empty() {
                for problem in &problems {
                    eprintln!("{problem}");
                }
                return Ok(ExitCode::FAILURE);
            }
            println!("{} status codes OK", DasStatus::ALL.len());
        }
        Command::Probe {
            code,
            message,
            language,
        } => print!("{}", probe_report(code, &message, language)?),
    }

    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    BridgeConfig::load_with_env(path).context("failed to load bridge configuration")
}
