use std::fmt::{self, Display, Write};
use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use pyconf_project::{
    Configuration, Contact, License, Metadata, Options, ReadOptions, read_configuration,
};

use crate::OutputFormat;
use crate::commands::{ExitStatus, pyproject_toml};
use crate::printer::Printer;

/// Show the resolved configuration.
pub(crate) fn show(
    project: Option<&Path>,
    ignore_option_errors: bool,
    no_expand: bool,
    format: OutputFormat,
    printer: Printer,
) -> Result<ExitStatus> {
    let options = ReadOptions {
        expand: !no_expand,
        ignore_option_errors,
    };
    let configuration = read_configuration(&pyproject_toml(project), &options)?;

    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            write_configuration(&configuration, &mut output)?;
            write!(printer.stdout(), "{output}")?;
        }
        OutputFormat::Json => {
            let output = serde_json::to_string_pretty(&configuration)?;
            writeln!(printer.stdout(), "{output}")?;
        }
    }
    Ok(ExitStatus::Success)
}

fn write_configuration(configuration: &Configuration, w: &mut impl Write) -> fmt::Result {
    write_metadata(&configuration.metadata, w)?;
    writeln!(w)?;
    write_options(&configuration.options, w)?;
    if let Some(build_system) = &configuration.build_system {
        writeln!(w)?;
        write_list(w, "build-system.requires", &build_system.requires)?;
        if let Some(backend) = &build_system.build_backend {
            write_field(w, "build-system.build-backend", backend)?;
        }
    }
    Ok(())
}

fn write_metadata(metadata: &Metadata, w: &mut impl Write) -> fmt::Result {
    write_field(w, "name", &metadata.name)?;
    if let Some(version) = &metadata.version {
        write_field(w, "version", version)?;
    }
    if let Some(description) = &metadata.description {
        write_field(w, "description", description)?;
    }
    if let Some(readme) = &metadata.readme {
        let source = match (&readme.file, &readme.text) {
            (Some(file), _) => file.clone(),
            (None, Some(text)) => format!("<{} characters>", text.chars().count()),
            (None, None) => String::new(),
        };
        match &readme.content_type {
            Some(content_type) => write_field(w, "readme", format!("{source} ({content_type})"))?,
            None => write_field(w, "readme", source)?,
        }
    }
    if let Some(requires_python) = &metadata.requires_python {
        write_field(w, "requires-python", requires_python)?;
    }
    match &metadata.license {
        Some(License::Spdx(expression)) => write_field(w, "license", expression)?,
        Some(License::Text { text }) => write_field(w, "license", text.trim())?,
        Some(License::File { file }) => write_field(w, "license", file.display())?,
        None => {}
    }
    write_list(w, "license-files", &metadata.license_files)?;
    let authors: Vec<String> = metadata.authors.iter().map(contact).collect();
    write_list(w, "authors", &authors)?;
    let maintainers: Vec<String> = metadata.maintainers.iter().map(contact).collect();
    write_list(w, "maintainers", &maintainers)?;
    write_list(w, "keywords", &metadata.keywords)?;
    write_list(w, "classifiers", &metadata.classifiers)?;
    write_table(w, "urls", &metadata.urls)?;
    write_list(w, "dependencies", &metadata.dependencies)?;
    if !metadata.optional_dependencies.is_empty() {
        writeln!(w, "{}", "optional-dependencies:".bold())?;
        for (extra, requirements) in &metadata.optional_dependencies {
            writeln!(w, "  {extra}:")?;
            for requirement in requirements {
                writeln!(w, "    - {requirement}")?;
            }
        }
    }
    write_table(w, "scripts", &metadata.scripts)?;
    write_table(w, "gui-scripts", &metadata.gui_scripts)?;
    if !metadata.entry_points.is_empty() {
        writeln!(w, "{}", "entry-points:".bold())?;
        for (group, entries) in &metadata.entry_points {
            writeln!(w, "  {group}:")?;
            for (name, value) in entries {
                writeln!(w, "    {name} = {value}")?;
            }
        }
    }
    let dynamic: Vec<String> = metadata.dynamic.iter().map(ToString::to_string).collect();
    write_list(w, "dynamic", &dynamic)?;
    Ok(())
}

fn write_options(options: &Options, w: &mut impl Write) -> fmt::Result {
    if let Some(layout) = options.layout {
        write_field(w, "layout", layout)?;
    }
    write_package_dir(options, w)?;
    write_list(w, "packages", &options.packages)?;
    write_list(w, "py-modules", &options.py_modules)?;
    let ext_modules: Vec<String> = options
        .ext_modules
        .iter()
        .map(|module| format!("{} ({})", module.name, module.sources.join(", ")))
        .collect();
    write_list(w, "ext-modules", &ext_modules)?;
    write_field(w, "include-package-data", options.include_package_data)?;
    write_globs(w, "package-data", &options.package_data)?;
    write_globs(w, "exclude-package-data", &options.exclude_package_data)?;
    write_globs(w, "package-data-files", &options.package_data_files)?;
    if let Some(zip_safe) = options.zip_safe {
        write_field(w, "zip-safe", zip_safe)?;
    }
    write_list(w, "platforms", &options.platforms)?;
    write_list(w, "eager-resources", &options.eager_resources)?;
    write_list(w, "script-files", &options.script_files)?;
    write_globs(w, "data-files", &options.data_files)?;
    write_list(w, "namespace-packages", &options.namespace_packages)?;
    write_list(w, "provides", &options.provides)?;
    write_list(w, "obsoletes", &options.obsoletes)?;
    write_table(w, "cmdclass", &options.cmdclass)?;
    Ok(())
}

/// The `package-dir` mapping, with the root package shown as `""`.
pub(super) fn write_package_dir(options: &Options, w: &mut impl Write) -> fmt::Result {
    if options.package_dir.is_empty() {
        return Ok(());
    }
    writeln!(w, "{}", "package-dir:".bold())?;
    for (package, directory) in options.package_dir.iter() {
        if package.is_empty() {
            writeln!(w, "  \"\" = {directory}")?;
        } else {
            writeln!(w, "  {package} = {directory}")?;
        }
    }
    Ok(())
}

pub(super) fn write_field(w: &mut impl Write, key: &str, value: impl Display) -> fmt::Result {
    writeln!(w, "{} {value}", format!("{key}:").bold())
}

/// A list with one entry per line, omitted if empty.
pub(super) fn write_list(w: &mut impl Write, key: &str, values: &[String]) -> fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    writeln!(w, "{}", format!("{key}:").bold())?;
    for value in values {
        writeln!(w, "  - {value}")?;
    }
    Ok(())
}

fn write_table<'a>(
    w: &mut impl Write,
    key: &str,
    table: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> fmt::Result {
    let mut table = table.into_iter().peekable();
    if table.peek().is_none() {
        return Ok(());
    }
    writeln!(w, "{}", format!("{key}:").bold())?;
    for (name, value) in table {
        writeln!(w, "  {name} = {value}")?;
    }
    Ok(())
}

fn write_globs<'a>(
    w: &mut impl Write,
    key: &str,
    table: impl IntoIterator<Item = (&'a String, &'a Vec<String>)>,
) -> fmt::Result {
    let mut table = table.into_iter().peekable();
    if table.peek().is_none() {
        return Ok(());
    }
    writeln!(w, "{}", format!("{key}:").bold())?;
    for (name, values) in table {
        writeln!(w, "  {name} = {}", values.join(", "))?;
    }
    Ok(())
}

fn contact(contact: &Contact) -> String {
    match contact {
        Contact::NameEmail { name, email } => format!("{name} <{email}>"),
        Contact::Name { name } => name.clone(),
        Contact::Email { email } => email.clone(),
    }
}
