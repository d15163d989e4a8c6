use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use pyconf_discovery::{Layout, PackageDir};
use pyconf_project::{ReadOptions, read_configuration};

use crate::OutputFormat;
use crate::commands::show::{write_field, write_list, write_package_dir};
use crate::commands::{ExitStatus, pyproject_toml};
use crate::printer::Printer;

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Discovered<'a> {
    layout: Option<Layout>,
    package_dir: &'a PackageDir,
    packages: &'a [String],
    py_modules: &'a [String],
}

/// Show how the packages and modules of a project are determined.
pub(crate) fn discover(
    project: Option<&Path>,
    ignore_option_errors: bool,
    format: OutputFormat,
    printer: Printer,
) -> Result<ExitStatus> {
    let options = ReadOptions {
        expand: true,
        ignore_option_errors,
    };
    let configuration = read_configuration(&pyproject_toml(project), &options)?;
    let options = &configuration.options;

    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            match options.layout {
                Some(layout) => write_field(&mut output, "layout", layout)?,
                None => write_field(&mut output, "layout", "unknown")?,
            }
            write_package_dir(options, &mut output)?;
            write_list(&mut output, "packages", &options.packages)?;
            write_list(&mut output, "py-modules", &options.py_modules)?;
            if options.packages.is_empty() && options.py_modules.is_empty() {
                writeln!(output, "No packages or modules found")?;
            }
            write!(printer.stdout(), "{output}")?;
        }
        OutputFormat::Json => {
            let discovered = Discovered {
                layout: options.layout,
                package_dir: &options.package_dir,
                packages: &options.packages,
                py_modules: &options.py_modules,
            };
            writeln!(
                printer.stdout(),
                "{}",
                serde_json::to_string_pretty(&discovered)?
            )?;
        }
    }
    Ok(ExitStatus::Success)
}
