//! VEP summary worker main executable

pub mod common;
pub mod err;
pub mod seqvars;

use std::process::{ExitCode, Termination};

use clap::{Args, Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Summarise VEP consequence annotations",
    long_about = "This tool extends VEP-annotated VCF files with primary transcript, \
                  gene cross-reference, and effect prediction annotations"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Sequence variant related commands.
    Seqvars(Seqvars),
}

/// Parsing of "seqvars *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Seqvars {
    /// The sub command to run
    #[command(subcommand)]
    command: SeqvarsCommands,
}

/// Enum supporting the parsing of "seqvars *" sub commands.
#[derive(Debug, Subcommand)]
enum SeqvarsCommands {
    Summarise(seqvars::summarise::Args),
    PassFilter(seqvars::pass_filter::Args),
}

fn main() -> Result<ExitCode, anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    let term = Term::stderr();
    let result = tracing::subscriber::with_default(collector, || {
        match &cli.command {
            Commands::Seqvars(seqvars) => match &seqvars.command {
                SeqvarsCommands::Summarise(args) => {
                    seqvars::summarise::run(&cli.common, args)?;
                }
                SeqvarsCommands::PassFilter(args) => {
                    seqvars::pass_filter::run(&cli.common, args)?;
                }
            },
        }

        Ok::<(), anyhow::Error>(())
    });

    // Pipeline-halting conditions map to dedicated exit codes.
    if let Err(e) = result {
        return match e.downcast::<err::SummariseError>() {
            Ok(e) => {
                term.write_line(&format!("{}", &e))?;
                Ok(e.report())
            }
            Err(e) => Err(e),
        };
    }
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(ExitCode::SUCCESS)
}
