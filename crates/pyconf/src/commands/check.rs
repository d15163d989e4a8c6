use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use tracing::debug;

use pyconf_fs::Simplified;
use pyconf_project::{ReadOptions, read_configuration};
use pyconf_warnings::write_error_chain;

use crate::commands::{ExitStatus, pyproject_toml};
use crate::printer::Printer;

/// Validate the configuration, reporting the first error.
pub(crate) fn check(
    project: Option<&Path>,
    ignore_option_errors: bool,
    no_expand: bool,
    printer: Printer,
) -> Result<ExitStatus> {
    let pyproject_toml = pyproject_toml(project);
    let options = ReadOptions {
        expand: !no_expand,
        ignore_option_errors,
    };

    let configuration = match read_configuration(&pyproject_toml, &options) {
        Ok(configuration) => configuration,
        Err(err) => {
            debug!("`{}` is invalid", pyproject_toml.user_display());
            write_error_chain(&err, printer.stderr())?;
            return Ok(ExitStatus::Failure);
        }
    };

    let name = configuration.name();
    match configuration.version() {
        Some(version) => writeln!(
            printer.stdout(),
            "{} {}: {}",
            name.bold(),
            version.bold(),
            "valid".green()
        )?,
        None => writeln!(printer.stdout(), "{}: {}", name.bold(), "valid".green())?,
    }
    if !configuration.warnings.is_empty() {
        debug!("Found {} warnings", configuration.warnings.len());
    }
    Ok(ExitStatus::Success)
}
