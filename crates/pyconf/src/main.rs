use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use pyconf_static::EnvVars;
use pyconf_warnings::write_error_chain;

use crate::commands::ExitStatus;
use crate::printer::Printer;

mod commands;
mod logging;
mod printer;

#[derive(Parser)]
#[command(name = "pyconf", author, version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Do not print any output.
    #[arg(global = true, long, short, conflicts_with = "verbose")]
    quiet: bool,

    /// Use verbose output.
    #[arg(global = true, long, short, conflicts_with = "quiet")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved setuptools configuration of a project.
    Show(ShowArgs),
    /// Check that the setuptools configuration of a project is valid.
    Check(CheckArgs),
    /// Show the layout, packages and modules of a project.
    Discover(DiscoverArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// The project directory, or its `pyproject.toml`.
    ///
    /// Defaults to the current directory.
    #[arg(long, env = EnvVars::PYCONF_PROJECT, value_hint = ValueHint::AnyPath)]
    project: Option<PathBuf>,

    /// Report directives that fail to resolve as warnings instead of errors.
    ///
    /// The affected fields are left unset. Invalid `pyproject.toml` files are still an error.
    #[arg(long, env = EnvVars::PYCONF_IGNORE_OPTION_ERRORS, value_parser = BoolishValueParser::new())]
    ignore_option_errors: bool,
}

#[derive(Args)]
struct ShowArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Don't resolve dynamic fields, discover packages or expand globs.
    #[arg(long, env = EnvVars::PYCONF_NO_EXPAND, value_parser = BoolishValueParser::new())]
    no_expand: bool,

    /// The format in which to show the configuration.
    #[arg(long, value_enum, default_value_t, env = EnvVars::PYCONF_OUTPUT_FORMAT)]
    format: OutputFormat,
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Only check the static configuration.
    #[arg(long, env = EnvVars::PYCONF_NO_EXPAND, value_parser = BoolishValueParser::new())]
    no_expand: bool,
}

#[derive(Args)]
struct DiscoverArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// The format in which to show the packages.
    #[arg(long, value_enum, default_value_t, env = EnvVars::PYCONF_OUTPUT_FORMAT)]
    format: OutputFormat,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON, using the key names of `pyproject.toml`.
    Json,
}

fn inner() -> Result<ExitStatus> {
    let cli = Cli::parse();

    logging::setup_logging(if cli.verbose {
        logging::Level::Verbose
    } else {
        logging::Level::Default
    });

    let printer = if cli.quiet {
        Printer::Quiet
    } else if cli.verbose {
        Printer::Verbose
    } else {
        Printer::Default
    };

    if !cli.quiet {
        pyconf_warnings::enable();
    }

    match cli.command {
        Commands::Show(args) => commands::show(
            args.project.project.as_deref(),
            args.project.ignore_option_errors,
            args.no_expand,
            args.format,
            printer,
        ),
        Commands::Check(args) => commands::check(
            args.project.project.as_deref(),
            args.project.ignore_option_errors,
            args.no_expand,
            printer,
        ),
        Commands::Discover(args) => commands::discover(
            args.project.project.as_deref(),
            args.project.ignore_option_errors,
            args.format,
            printer,
        ),
    }
}

fn main() -> ExitCode {
    match inner() {
        Ok(code) => code.into(),
        Err(err) => {
            let mut stderr = String::new();
            if write_error_chain(&*err, &mut stderr).is_ok() {
                #[allow(clippy::print_stderr)]
                {
                    anstream::eprint!("{stderr}");
                }
            }
            ExitStatus::Error.into()
        }
    }
}
