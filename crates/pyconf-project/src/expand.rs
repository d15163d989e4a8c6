use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use configparser::ini::{Ini, IniDefault};
use itertools::Itertools;
use tracing::debug;

use pyconf_discovery::PackageDir;
use pyconf_fs::{Simplified, is_inside, read_to_string_transcode};
use pyconf_literal::{PyLiteral, StaticModule};
use pyconf_normalize::{DottedName, ExtraName, Identifier};
use pyconf_requirements::{RequirementsError, RequirementsFile};

use crate::configuration::{Metadata, ReadmeMetadata};
use crate::dynamic::{Directive, DynamicField, DynamicTable};
use crate::pyproject::Project;
use crate::validate::{
    ValidationError, check_content_type, check_description, check_entry_point_group,
    check_entry_point_name, parse_version,
};
use crate::{Error, Warnings};

/// The content type of a readme read through the `file` directive, unless configured.
const DEFAULT_README_CONTENT_TYPE: &str = "text/x-rst";

#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    #[error("Failed to read `{}`", _0.user_display())]
    Read(PathBuf, #[source] io::Error),
    #[error("`{0}` is outside of the project root")]
    OutsideRoot(String),
    #[error("Invalid `attr` value `{0}`, expected a dotted path such as `mypkg.__version__`")]
    InvalidAttr(String),
    #[error("Module `{module}` not found in `{}`", root.user_display())]
    ModuleNotFound { module: String, root: PathBuf },
    #[error("Failed to statically evaluate `{attribute}` in `{}`", path.user_display())]
    Literal {
        attribute: String,
        path: PathBuf,
        #[source]
        source: pyconf_literal::Error,
    },
    #[error("`{}` has no module-level assignment to `{attribute}`", path.user_display())]
    AttributeNotFound { attribute: String, path: PathBuf },
    #[error("Failed to parse requirements from {}", format_files(files))]
    Requirements {
        files: Vec<String>,
        #[source]
        source: RequirementsError,
    },
    #[error("Failed to parse entry points from {}: {message}", format_files(files))]
    EntryPoints { files: Vec<String>, message: String },
    #[error("Entry point `{name}` in group `{group}` has no object reference")]
    EntryPointWithoutValue { group: String, name: String },
    #[error(
        "Entry points define `[{group}]`, but `{field}` is not listed in `project.dynamic`"
    )]
    UndeclaredScripts {
        group: &'static str,
        field: DynamicField,
    },
    #[error(
        "`{0}` can only be resolved through `tool.setuptools.dynamic.entry-points`, but `entry-points` is not listed in `project.dynamic`"
    )]
    ScriptsWithoutEntryPoints(DynamicField),
    #[error("No configuration found for dynamic `{0}`, expected `tool.setuptools.dynamic.{0}`")]
    MissingDirective(DynamicField),
    #[error("No configuration found for dynamic `{0}`, setuptools can't resolve it dynamically")]
    Unsupported(DynamicField),
    #[error("Failed to resolve the optional dependencies of `{extra}`")]
    Extra {
        extra: String,
        #[source]
        source: Box<ExpandError>,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

fn format_files(files: &[String]) -> String {
    files.iter().map(|file| format!("`{file}`")).join(", ")
}

/// Resolves the fields in `project.dynamic` through the `tool.setuptools.dynamic` directives.
pub(crate) struct Expander<'a> {
    root: &'a Path,
    package_dir: &'a PackageDir,
    ignore_option_errors: bool,
    warnings: &'a mut Warnings,
}

impl<'a> Expander<'a> {
    pub(crate) fn new(
        root: &'a Path,
        package_dir: &'a PackageDir,
        ignore_option_errors: bool,
        warnings: &'a mut Warnings,
    ) -> Self {
        Self {
            root,
            package_dir,
            ignore_option_errors,
            warnings,
        }
    }

    /// Resolve each dynamic field into `metadata`.
    ///
    /// With `ignore_option_errors`, a field that fails to resolve is reported as a warning and
    /// left unset.
    pub(crate) fn expand(
        &mut self,
        project: &Project,
        table: &DynamicTable,
        metadata: &mut Metadata,
    ) -> Result<(), Error> {
        for field in project.dynamic.iter().flatten().copied() {
            debug!("Resolving dynamic `{field}`");
            if let Err(err) = self.expand_field(field, project, table, metadata) {
                let err = Error::Dynamic { field, source: err };
                if self.ignore_option_errors {
                    self.warnings.push_error(&err);
                } else {
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn expand_field(
        &mut self,
        field: DynamicField,
        project: &Project,
        table: &DynamicTable,
        metadata: &mut Metadata,
    ) -> Result<(), ExpandError> {
        match field {
            DynamicField::Version => {
                let directive = required(table.version.as_ref(), field)?;
                let version = match directive {
                    Directive::Attr(attr) => version_string(&self.read_attr(attr)?),
                    Directive::File { files, .. } => self.read_files(files)?,
                };
                metadata.version = Some(parse_version(&version)?.to_string());
            }
            DynamicField::Description => {
                let directive = required(table.description.as_ref(), field)?;
                let description = self.read_text(directive)?.trim().to_string();
                check_description(&description)?;
                metadata.description = Some(description);
            }
            DynamicField::Readme => {
                let directive = required(table.readme.as_ref(), field)?;
                let content_type = match directive {
                    Directive::File {
                        content_type: Some(content_type),
                        ..
                    } => content_type.clone(),
                    _ => DEFAULT_README_CONTENT_TYPE.to_string(),
                };
                check_content_type(&content_type)?;
                metadata.readme = Some(ReadmeMetadata {
                    text: Some(self.read_text(directive)?),
                    file: None,
                    content_type: Some(content_type),
                });
            }
            DynamicField::Classifiers => {
                let directive = required(table.classifiers.as_ref(), field)?;
                metadata.classifiers = self
                    .read_text(directive)?
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(ToString::to_string)
                    .collect();
            }
            DynamicField::Dependencies => {
                let directive = required(table.dependencies.as_ref(), field)?;
                metadata.dependencies = self.read_requirements(directive)?;
            }
            DynamicField::OptionalDependencies => {
                let groups = table
                    .optional_dependencies
                    .as_ref()
                    .ok_or(ExpandError::MissingDirective(field))?;
                let mut optional_dependencies = BTreeMap::new();
                for (extra, directive) in groups {
                    let requirements =
                        self.read_requirements(directive)
                            .map_err(|err| ExpandError::Extra {
                                extra: extra.clone(),
                                source: Box::new(err),
                            })?;
                    let extra = ExtraName::from_str(extra).map_err(|err| {
                        ExpandError::Validation(ValidationError::InvalidExtra(extra.clone(), err))
                    })?;
                    optional_dependencies.insert(extra.to_string(), requirements);
                }
                metadata.optional_dependencies = optional_dependencies;
            }
            DynamicField::EntryPoints => {
                let directive = required(table.entry_points.as_ref(), field)?;
                let mut groups = self.read_entry_points(directive)?;
                for (group, field) in [
                    ("console_scripts", DynamicField::Scripts),
                    ("gui_scripts", DynamicField::GuiScripts),
                ] {
                    let Some(scripts) = groups.remove(group) else {
                        continue;
                    };
                    if !project.is_dynamic(field) {
                        return Err(ExpandError::UndeclaredScripts { group, field });
                    }
                    match field {
                        DynamicField::Scripts => metadata.scripts = scripts,
                        _ => metadata.gui_scripts = scripts,
                    }
                }
                metadata.entry_points = groups;
            }
            DynamicField::Scripts | DynamicField::GuiScripts => {
                if !project.is_dynamic(DynamicField::EntryPoints) {
                    return Err(ExpandError::ScriptsWithoutEntryPoints(field));
                }
            }
            DynamicField::Name
            | DynamicField::RequiresPython
            | DynamicField::License
            | DynamicField::LicenseFiles
            | DynamicField::Authors
            | DynamicField::Maintainers
            | DynamicField::Keywords
            | DynamicField::Urls => return Err(ExpandError::Unsupported(field)),
        }
        Ok(())
    }

    /// The value of a directive as text: the file contents, or the string form of the attribute.
    fn read_text(&mut self, directive: &Directive) -> Result<String, ExpandError> {
        match directive {
            Directive::Attr(attr) => Ok(match self.read_attr(attr)? {
                PyLiteral::Str(value) => value,
                value => value.to_string(),
            }),
            Directive::File { files, .. } => self.read_files(files),
        }
    }

    /// Read files relative to the project root and join their contents with newlines.
    ///
    /// Missing files are skipped with a warning, files outside of the project root are an error.
    pub(crate) fn read_files(&mut self, files: &[String]) -> Result<String, ExpandError> {
        let mut contents = Vec::with_capacity(files.len());
        for file in files {
            if !is_inside(self.root, file) {
                return Err(ExpandError::OutsideRoot(file.clone()));
            }
            let path = self.root.join(file);
            if !path.is_file() {
                self.warnings
                    .push(format!("File `{file}` cannot be found, skipping it"));
                continue;
            }
            debug!("Reading `{}`", path.user_display());
            let content =
                read_to_string_transcode(&path).map_err(|err| ExpandError::Read(path, err))?;
            contents.push(content);
        }
        Ok(contents.join("\n"))
    }

    /// Read a literal value from a module without importing it.
    ///
    /// `pkg.module.NAME` reads `NAME` from `pkg/module.py` (or `pkg/module/__init__.py`) as
    /// mapped by `package-dir`. A bare `NAME` reads from the `__init__.py` of the root package
    /// directory.
    fn read_attr(&self, attr: &str) -> Result<PyLiteral, ExpandError> {
        let attr = attr.trim();
        let (module, attribute) = attr.rsplit_once('.').unwrap_or(("__init__", attr));
        if !Identifier::is_valid(attribute) || DottedName::from_str(module).is_err() {
            return Err(ExpandError::InvalidAttr(attr.to_string()));
        }

        let path = self
            .package_dir
            .find_module(module, self.root)
            .ok_or_else(|| ExpandError::ModuleNotFound {
                module: module.to_string(),
                root: self
                    .package_dir
                    .root()
                    .map_or_else(|| self.root.to_path_buf(), |root| self.root.join(root)),
            })?;
        debug!("Reading `{attribute}` from `{}`", path.user_display());
        let source =
            read_to_string_transcode(&path).map_err(|err| ExpandError::Read(path.clone(), err))?;
        let module = StaticModule::parse(&source).map_err(|err| ExpandError::Literal {
            attribute: attribute.to_string(),
            path: path.clone(),
            source: err,
        })?;

        match module.get(attribute) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(ExpandError::AttributeNotFound {
                attribute: attribute.to_string(),
                path,
            }),
            Err(err) => Err(ExpandError::Literal {
                attribute: attribute.to_string(),
                path,
                source: err,
            }),
        }
    }

    fn read_requirements(&mut self, directive: &Directive) -> Result<Vec<String>, ExpandError> {
        let text = self.read_text(directive)?;
        let requirements =
            RequirementsFile::parse(&text).map_err(|err| ExpandError::Requirements {
                files: directive_files(directive),
                source: err,
            })?;
        Ok(requirements.to_strings())
    }

    /// Parse entry points in the INI format of `entry_points.txt`, sorted by group and name.
    fn read_entry_points(
        &mut self,
        directive: &Directive,
    ) -> Result<BTreeMap<String, BTreeMap<String, String>>, ExpandError> {
        let text = self.read_text(directive)?;
        // Only `=` separates names from values, and a `#` or `;` after a value is part of it.
        let mut defaults = IniDefault::default();
        defaults.delimiters = vec!['='];
        defaults.enable_inline_comments = false;
        defaults.case_sensitive = true;
        let sections = Ini::new_from_defaults(defaults)
            .read(text)
            .map_err(|message| ExpandError::EntryPoints {
                files: directive_files(directive),
                message,
            })?;

        let mut groups = BTreeMap::new();
        for (group, entries) in sections {
            // Entries before the first section header.
            if group == "default" {
                if entries.is_empty() {
                    continue;
                }
                return Err(ExpandError::EntryPoints {
                    files: directive_files(directive),
                    message: "entry points must be declared below a `[group]` header".to_string(),
                });
            }
            check_entry_point_group(&group)?;
            let mut resolved = BTreeMap::new();
            for (name, value) in entries {
                check_entry_point_name(&name)?;
                let Some(value) = value.filter(|value| !value.is_empty()) else {
                    return Err(ExpandError::EntryPointWithoutValue { group, name });
                };
                resolved.insert(name, value);
            }
            groups.insert(group, resolved);
        }
        Ok(groups)
    }
}

fn required(directive: Option<&Directive>, field: DynamicField) -> Result<&Directive, ExpandError> {
    directive.ok_or(ExpandError::MissingDirective(field))
}

fn directive_files(directive: &Directive) -> Vec<String> {
    match directive {
        Directive::Attr(attr) => vec![attr.clone()],
        Directive::File { files, .. } => files.clone(),
    }
}

/// The version string of an attribute: a string as is, a sequence joined by `.`, anything else
/// in its string form.
fn version_string(value: &PyLiteral) -> String {
    match value {
        PyLiteral::Str(version) => version.clone(),
        value => match value.as_sequence() {
            Some(items) => items.iter().join("."),
            None => value.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_strings() {
        assert_eq!(version_string(&PyLiteral::Str("1.0".to_string())), "1.0");
        assert_eq!(
            version_string(&PyLiteral::Tuple(vec![
                PyLiteral::Int(1),
                PyLiteral::Int(2),
                PyLiteral::Str("post1".to_string())
            ])),
            "1.2.post1"
        );
        assert_eq!(version_string(&PyLiteral::Float(0.5)), "0.5");
        assert_eq!(version_string(&PyLiteral::Int(3)), "3");
    }
}
