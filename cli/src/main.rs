mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use prm_diff::{DescriptionError, DuplicateKeyPolicy, FormatError, ParseConfig, ParseError};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "prm-diff")]
#[command(about = "Inspect and compare CNC controller parameter dumps (ALL.PRM)")]
#[command(version)]
pub struct Cli {
    #[arg(long, short, global = true, help = "Verbose mode: log parser and diff progress")]
    pub verbose: bool,
    #[arg(
        long,
        global = true,
        conflicts_with = "allow_duplicates",
        help = "Fail when a parameter key appears twice in one dump"
    )]
    pub strict_duplicates: bool,
    #[arg(long, global = true, help = "Silently keep the last value of a duplicated key")]
    pub allow_duplicates: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show header metadata and parameters of a dump")]
    Info {
        #[arg(help = "Path to the ALL.PRM dump")]
        path: String,
        #[arg(long, short, value_name = "XLSX", help = "Write the parameter report to this workbook")]
        output: Option<String>,
        #[arg(long, value_name = "YAML", help = "Parameter descriptions lookup")]
        descriptions: Option<String>,
        #[arg(long, help = "Show axis qualifiers by their configured names")]
        axis_names: bool,
        #[arg(long, default_value_t = 10, help = "Number of parameters to print")]
        limit: usize,
    },
    #[command(about = "Compare two dumps")]
    Diff {
        #[arg(help = "Path to the old/base dump")]
        old: String,
        #[arg(help = "Path to the new/changed dump")]
        new: String,
        #[arg(
            long,
            short,
            value_name = "XLSX",
            default_value = "diff.xlsx",
            help = "Write the diff report to this workbook"
        )]
        output: String,
        #[arg(long, value_name = "YAML", help = "Parameter descriptions lookup")]
        descriptions: Option<String>,
        #[arg(long, help = "Show axis qualifiers by their configured names")]
        axis_names: bool,
        #[arg(long, short, value_enum, default_value = "text", help = "Stdout format")]
        format: OutputFormat,
        #[arg(long, short, help = "Quiet mode: only show summary")]
        quiet: bool,
    },
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Jsonl,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let parse_config = parse_config_from_flags(cli.strict_duplicates, cli.allow_duplicates);

    let result = match cli.command {
        Commands::Info {
            path,
            output,
            descriptions,
            axis_names,
            limit,
        } => commands::info::run(
            &path,
            output.as_deref(),
            descriptions.as_deref(),
            axis_names,
            limit,
            &parse_config,
        ),
        Commands::Diff {
            old,
            new,
            output,
            descriptions,
            axis_names,
            format,
            quiet,
        } => commands::diff::run(
            &old,
            &new,
            &output,
            descriptions.as_deref(),
            axis_names,
            format,
            quiet,
            &parse_config,
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for_error(&e)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn parse_config_from_flags(strict: bool, allow: bool) -> ParseConfig {
    let duplicate_keys = if strict {
        DuplicateKeyPolicy::Reject
    } else if allow {
        DuplicateKeyPolicy::Overwrite
    } else {
        DuplicateKeyPolicy::Warn
    };
    ParseConfig { duplicate_keys }
}

fn exit_code_for_error(err: &anyhow::Error) -> ExitCode {
    if is_input_error(err) {
        ExitCode::from(2)
    } else {
        ExitCode::from(3)
    }
}

/// Malformed or unreadable inputs; anything else is a failure on our side.
fn is_input_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.is::<ParseError>() || cause.is::<FormatError>() || cause.is::<DescriptionError>()
    })
}
