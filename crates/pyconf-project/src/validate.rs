use std::path::Path;
use std::str::FromStr;

use pep440_rs::{Version, VersionParseError, VersionSpecifiers, VersionSpecifiersParseError};
use pep508_rs::{Pep508Error, Requirement};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use pyconf_discovery::{DiscoveryError, check_license_glob};
use pyconf_fs::Simplified;
use pyconf_normalize::{DottedName, ExtraName, Identifier, InvalidNameError};

use crate::Warnings;
use crate::dynamic::{Directive, DynamicField, DynamicTable};
use crate::pyproject::{BuildSystem, License, Project, Readme, SETUPTOOLS_BACKENDS};
use crate::settings::{Packages, ToolSetuptools};

/// The content types a readme may have.
pub(crate) const README_CONTENT_TYPES: [&str; 3] = ["text/plain", "text/x-rst", "text/markdown"];

#[derive(Debug, Error)]
pub enum ValidationError {
    /// Only the default, UTF-8, is supported.
    #[error(
        "Charsets other than UTF-8 are not supported. Please convert your README to UTF-8 and remove `project.readme.charset`."
    )]
    ReadmeCharset,
    #[error(
        "Unknown Readme extension `{0}`, can't determine content type. Please use a supported extension (`.md`, `.rst`, `.txt`) or set the content type manually."
    )]
    UnknownExtension(String),
    #[error("Unsupported content type: `{0}`")]
    UnsupportedContentType(String),
    #[error("`project.description` must be a single line")]
    DescriptionNewlines,
    #[error("`name` can't be listed in `project.dynamic`")]
    DynamicName,
    #[error("`project.{0}` is listed in `project.dynamic`, but also set statically")]
    StaticAndDynamic(DynamicField),
    #[error("`{0}` only supports the `file` directive")]
    FileDirectiveOnly(String),
    #[error("`content-type` is only supported for `tool.setuptools.dynamic.readme`")]
    ContentTypeOutsideReadme,
    #[error("`project.version` is not a valid PEP 440 version: `{0}`")]
    InvalidVersion(String, #[source] VersionParseError),
    #[error("`project.requires-python` is not a valid PEP 440 specifier: `{0}`")]
    InvalidRequiresPython(String, #[source] VersionSpecifiersParseError),
    #[error("Invalid requirement in `{field}`: `{requirement}`")]
    InvalidRequirement {
        field: String,
        requirement: String,
        #[source]
        source: Box<Pep508Error>,
    },
    #[error("Invalid extra name in `project.optional-dependencies`: `{0}`")]
    InvalidExtra(String, #[source] InvalidNameError),
    #[error("`{table}` defines both `{first}` and `{second}`, which are the same extra `{extra}`")]
    DuplicateExtra {
        table: &'static str,
        first: String,
        second: String,
        extra: ExtraName,
    },
    #[error(
        "When `project.license-files` is defined, `project.license` must be an SPDX expression string"
    )]
    MixedLicenseGenerations,
    #[error("`project.license` is not a valid SPDX expression: `{0}`")]
    InvalidSpdx(String, #[source] spdx::error::ParseError),
    #[error(
        "`project.license-files` and `tool.setuptools.license-files` can't be used together, remove `tool.setuptools.license-files`"
    )]
    ConflictingLicenseFiles,
    #[error(transparent)]
    LicenseGlob(DiscoveryError),
    #[error(
        "Entrypoint groups must consist of letters and numbers separated by dots, invalid group: `{0}`"
    )]
    InvalidGroup(String),
    #[error(
        "Entrypoint names must consist of letters, numbers, dots, underscores and dashes; invalid name: `{0}`"
    )]
    InvalidName(String),
    #[error("Use `project.scripts` instead of `project.entry-points.console_scripts`")]
    ReservedScripts,
    #[error("Use `project.gui-scripts` instead of `project.entry-points.gui_scripts`")]
    ReservedGuiScripts,
    #[error("Keys of `tool.setuptools.{table}` must be `*` or a dotted package name, found `{key}`")]
    InvalidPackageDataKey { table: &'static str, key: String },
    #[error(
        "`tool.setuptools.cmdclass.{command}` must be a qualified class name such as `module.Class`, found `{value}`"
    )]
    InvalidCmdclass { command: String, value: String },
    #[error("Entries of `tool.setuptools.{table}` must be dotted Python names, found `{name}`")]
    InvalidModuleName { table: &'static str, name: String },
}

/// Check the static `[project]` fields.
pub(crate) fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if let Some(description) = &project.description {
        check_description(description)?;
    }
    if let Some(readme) = &project.readme {
        readme_content_type(readme)?;
    }
    if let Some(version) = &project.version {
        parse_version(version)?;
    }
    if let Some(requires_python) = &project.requires_python {
        VersionSpecifiers::from_str(requires_python).map_err(|err| {
            ValidationError::InvalidRequiresPython(requires_python.clone(), err)
        })?;
    }
    for requirement in project.dependencies.iter().flatten() {
        parse_requirement("project.dependencies", requirement)?;
    }
    if let Some(optional_dependencies) = &project.optional_dependencies {
        check_extras("project.optional-dependencies", optional_dependencies.keys())?;
    }
    for (extra, requirements) in project.optional_dependencies.iter().flatten() {
        for requirement in requirements {
            parse_requirement(
                &format!("project.optional-dependencies.{extra}"),
                requirement,
            )?;
        }
    }
    check_entry_points(project)?;
    check_license(project)?;
    Ok(())
}

/// Check that the extra names are valid and distinct after normalization.
fn check_extras<'a>(
    table: &'static str,
    extras: impl IntoIterator<Item = &'a String>,
) -> Result<(), ValidationError> {
    let mut seen: FxHashMap<ExtraName, &String> = FxHashMap::default();
    for extra in extras {
        let name = ExtraName::from_str(extra)
            .map_err(|err| ValidationError::InvalidExtra(extra.clone(), err))?;
        if let Some(first) = seen.get(&name) {
            return Err(ValidationError::DuplicateExtra {
                table,
                first: (*first).clone(),
                second: extra.clone(),
                extra: name,
            });
        }
        seen.insert(name, extra);
    }
    Ok(())
}

/// Check that the description is a single line.
pub(crate) fn check_description(description: &str) -> Result<(), ValidationError> {
    if description.contains('\n') {
        return Err(ValidationError::DescriptionNewlines);
    }
    Ok(())
}

/// Parse a version, which must be PEP 440 compliant.
pub(crate) fn parse_version(version: &str) -> Result<Version, ValidationError> {
    Version::from_str(version.trim())
        .map_err(|err| ValidationError::InvalidVersion(version.to_string(), err))
}

pub(crate) fn parse_requirement(
    field: &str,
    requirement: &str,
) -> Result<Requirement, ValidationError> {
    Requirement::from_str(requirement).map_err(|err| ValidationError::InvalidRequirement {
        field: field.to_string(),
        requirement: requirement.to_string(),
        source: Box::new(err),
    })
}

/// The content type of a static readme, inferred from the file extension if not set.
///
/// Files without an extension have no content type.
pub(crate) fn readme_content_type(readme: &Readme) -> Result<Option<String>, ValidationError> {
    if let Some(charset) = readme.charset() {
        if !charset.eq_ignore_ascii_case("utf-8") {
            return Err(ValidationError::ReadmeCharset);
        }
    }
    match readme {
        Readme::String(path) => content_type_from_extension(path),
        Readme::File { content_type, .. } | Readme::Text { content_type, .. } => {
            check_content_type(content_type)?;
            Ok(Some(content_type.clone()))
        }
    }
}

fn content_type_from_extension(path: &Path) -> Result<Option<String>, ValidationError> {
    let Some(extension) = path.extension() else {
        debug!(
            "Readme `{}` has no extension, leaving the content type unset",
            path.user_display()
        );
        return Ok(None);
    };
    let content_type = match extension.to_str().map(str::to_ascii_lowercase).as_deref() {
        Some("txt") => "text/plain",
        Some("rst") => "text/x-rst",
        Some("md") => "text/markdown",
        _ => {
            return Err(ValidationError::UnknownExtension(
                extension.to_string_lossy().into_owned(),
            ));
        }
    };
    Ok(Some(content_type.to_string()))
}

/// Check a content type, ignoring parameters such as `; charset=UTF-8` or `; variant=GFM`.
pub(crate) fn check_content_type(content_type: &str) -> Result<(), ValidationError> {
    let mime = content_type
        .split_once(';')
        .map_or(content_type, |(mime, _)| mime)
        .trim();
    if !README_CONTENT_TYPES.contains(&mime) {
        return Err(ValidationError::UnsupportedContentType(
            content_type.to_string(),
        ));
    }
    Ok(())
}

fn check_entry_points(project: &Project) -> Result<(), ValidationError> {
    for name in project
        .scripts
        .iter()
        .chain(project.gui_scripts.iter())
        .flat_map(|scripts| scripts.keys())
    {
        check_entry_point_name(name)?;
    }
    for (group, entries) in project.entry_points.iter().flatten() {
        if group == "console_scripts" {
            return Err(ValidationError::ReservedScripts);
        }
        if group == "gui_scripts" {
            return Err(ValidationError::ReservedGuiScripts);
        }
        check_entry_point_group(group)?;
        for name in entries.keys() {
            check_entry_point_name(name)?;
        }
    }
    Ok(())
}

pub(crate) fn check_entry_point_group(group: &str) -> Result<(), ValidationError> {
    if !group
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
        || !group
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '_')
    {
        return Err(ValidationError::InvalidGroup(group.to_string()));
    }
    Ok(())
}

pub(crate) fn check_entry_point_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(ValidationError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn check_license(project: &Project) -> Result<(), ValidationError> {
    match &project.license {
        Some(License::Spdx(expression)) => {
            spdx::Expression::parse(expression)
                .map_err(|err| ValidationError::InvalidSpdx(expression.clone(), err))?;
        }
        Some(License::Text { .. } | License::File { .. }) => {
            if project.license_files.is_some() {
                return Err(ValidationError::MixedLicenseGenerations);
            }
        }
        None => {}
    }
    for pattern in project.license_files.iter().flatten() {
        check_license_glob(pattern).map_err(ValidationError::LicenseGlob)?;
    }
    Ok(())
}

/// Check `project.dynamic` against the static fields and the `tool.setuptools.dynamic` table.
pub(crate) fn validate_dynamic(
    project: &Project,
    table: &DynamicTable,
    warnings: &mut Warnings,
) -> Result<(), ValidationError> {
    for field in project.dynamic.iter().flatten().copied() {
        if field == DynamicField::Name {
            return Err(ValidationError::DynamicName);
        }
        if project.is_static(field) {
            return Err(ValidationError::StaticAndDynamic(field));
        }
    }

    for field in table.fields() {
        if !project.is_dynamic(field) {
            warnings.push(format!(
                "`tool.setuptools.dynamic.{field}` is ignored, since `{field}` is not listed in `project.dynamic`"
            ));
        }
    }

    for field in [
        DynamicField::Description,
        DynamicField::Readme,
        DynamicField::Classifiers,
        DynamicField::EntryPoints,
        DynamicField::Dependencies,
    ] {
        if let Some(Directive::Attr(_)) = table.get(field) {
            return Err(ValidationError::FileDirectiveOnly(format!(
                "tool.setuptools.dynamic.{field}"
            )));
        }
    }
    if let Some(optional_dependencies) = &table.optional_dependencies {
        for (extra, directive) in optional_dependencies {
            if let Directive::Attr(_) = directive {
                return Err(ValidationError::FileDirectiveOnly(format!(
                    "tool.setuptools.dynamic.optional-dependencies.{extra}"
                )));
            }
        }
        check_extras(
            "tool.setuptools.dynamic.optional-dependencies",
            optional_dependencies.keys(),
        )?;
    }

    let content_types = [
        DynamicField::Version,
        DynamicField::Description,
        DynamicField::Classifiers,
        DynamicField::EntryPoints,
        DynamicField::Dependencies,
    ]
    .into_iter()
    .filter_map(|field| table.get(field))
    .chain(table.optional_dependencies.iter().flat_map(|table| table.values()));
    for directive in content_types {
        if let Directive::File {
            content_type: Some(_),
            ..
        } = directive
        {
            return Err(ValidationError::ContentTypeOutsideReadme);
        }
    }
    if let Some(Directive::File {
        content_type: Some(content_type),
        ..
    }) = &table.readme
    {
        check_content_type(content_type)?;
    }
    Ok(())
}

/// Check the names and references in `[tool.setuptools]`.
pub(crate) fn validate_settings(settings: &ToolSetuptools) -> Result<(), ValidationError> {
    for (table, globs) in [
        ("package-data", &settings.package_data),
        ("exclude-package-data", &settings.exclude_package_data),
    ] {
        for key in globs.keys() {
            if key != "*" && DottedName::from_str(key).is_err() {
                return Err(ValidationError::InvalidPackageDataKey {
                    table,
                    key: key.clone(),
                });
            }
        }
    }

    for (command, value) in &settings.cmdclass {
        let valid = DottedName::from_str(value).is_ok_and(|name| name.len() >= 2);
        if !valid {
            return Err(ValidationError::InvalidCmdclass {
                command: command.clone(),
                value: value.clone(),
            });
        }
    }

    for name in settings.py_modules.iter().flatten() {
        if DottedName::from_str(name).is_err() {
            return Err(ValidationError::InvalidModuleName {
                table: "py-modules",
                name: name.clone(),
            });
        }
    }
    if let Some(Packages::List(packages)) = &settings.packages {
        for name in packages {
            if !is_package_name(name) {
                return Err(ValidationError::InvalidModuleName {
                    table: "packages",
                    name: name.clone(),
                });
            }
        }
    }
    for name in settings.namespace_packages.iter().flatten() {
        if !is_package_name(name) {
            return Err(ValidationError::InvalidModuleName {
                table: "namespace-packages",
                name: name.clone(),
            });
        }
    }
    Ok(())
}

/// A dotted name, where the top-level package may be a stub-only package (`foo-stubs`).
fn is_package_name(name: &str) -> bool {
    let mut segments = name.split('.');
    let top_level = segments.next().unwrap_or_default();
    let top_level = top_level.strip_suffix("-stubs").unwrap_or(top_level);
    Identifier::is_valid(top_level) && segments.all(Identifier::is_valid)
}

/// Check the two generations of license file configuration against each other.
pub(crate) fn validate_license_files(
    project: &Project,
    settings: &ToolSetuptools,
) -> Result<(), ValidationError> {
    if project.license_files.is_some() && settings.license_files.is_some() {
        return Err(ValidationError::ConflictingLicenseFiles);
    }
    for pattern in settings.license_files.iter().flatten() {
        check_license_glob(pattern).map_err(ValidationError::LicenseGlob)?;
    }
    Ok(())
}

/// Check the `[build-system]` table.
///
/// The requirements must be valid, and a backend other than setuptools is reported as a warning,
/// since it won't read `[tool.setuptools]`.
pub(crate) fn check_build_system(
    build_system: &BuildSystem,
    warnings: &mut Warnings,
) -> Result<(), ValidationError> {
    for requirement in &build_system.requires {
        parse_requirement("build-system.requires", requirement)?;
    }
    if let Some(backend) = &build_system.build_backend {
        if !SETUPTOOLS_BACKENDS.contains(&backend.as_str()) {
            warnings.push(format!(
                "The value for `build-system.build-backend` should be `\"setuptools.build_meta\"`, not `\"{backend}\"`; other backends don't read `[tool.setuptools]`"
            ));
        }
    }
    Ok(())
}
