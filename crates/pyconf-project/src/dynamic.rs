use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A `project` field that may be listed in `project.dynamic`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum DynamicField {
    /// Never valid, the name is needed before anything can be resolved.
    Name,
    Version,
    Description,
    Readme,
    RequiresPython,
    License,
    LicenseFiles,
    Authors,
    Maintainers,
    Keywords,
    Classifiers,
    Urls,
    Scripts,
    GuiScripts,
    EntryPoints,
    Dependencies,
    OptionalDependencies,
}

impl DynamicField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Version => "version",
            Self::Description => "description",
            Self::Readme => "readme",
            Self::RequiresPython => "requires-python",
            Self::License => "license",
            Self::LicenseFiles => "license-files",
            Self::Authors => "authors",
            Self::Maintainers => "maintainers",
            Self::Keywords => "keywords",
            Self::Classifiers => "classifiers",
            Self::Urls => "urls",
            Self::Scripts => "scripts",
            Self::GuiScripts => "gui-scripts",
            Self::EntryPoints => "entry-points",
            Self::Dependencies => "dependencies",
            Self::OptionalDependencies => "optional-dependencies",
        }
    }

    /// Whether a `tool.setuptools.dynamic` directive can supply the field.
    ///
    /// `scripts` and `gui-scripts` are supplied by the `entry-points` directive.
    pub fn has_directive(self) -> bool {
        matches!(
            self,
            Self::Version
                | Self::Description
                | Self::Readme
                | Self::Classifiers
                | Self::Scripts
                | Self::GuiScripts
                | Self::EntryPoints
                | Self::Dependencies
                | Self::OptionalDependencies
        )
    }
}

impl Display for DynamicField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `[tool.setuptools.dynamic]` table.
///
/// ```toml
/// [tool.setuptools.dynamic]
/// version = { attr = "mypkg.__version__" }
/// readme = { file = ["README.md", "CHANGELOG.md"], content-type = "text/markdown" }
/// optional-dependencies.dev = { file = ["requirements-dev.txt"] }
/// ```
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct DynamicTable {
    pub version: Option<Directive>,
    pub description: Option<Directive>,
    pub readme: Option<Directive>,
    pub classifiers: Option<Directive>,
    pub entry_points: Option<Directive>,
    pub dependencies: Option<Directive>,
    /// One directive per extra.
    pub optional_dependencies: Option<IndexMap<String, Directive>>,
}

impl DynamicTable {
    /// The fields that have a directive, in the order of the table.
    pub fn fields(&self) -> impl Iterator<Item = DynamicField> {
        [
            (self.version.is_some(), DynamicField::Version),
            (self.description.is_some(), DynamicField::Description),
            (self.readme.is_some(), DynamicField::Readme),
            (self.classifiers.is_some(), DynamicField::Classifiers),
            (self.entry_points.is_some(), DynamicField::EntryPoints),
            (self.dependencies.is_some(), DynamicField::Dependencies),
            (
                self.optional_dependencies.is_some(),
                DynamicField::OptionalDependencies,
            ),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, field)| field)
    }

    /// The directive for a field, for all fields but `optional-dependencies`.
    pub fn get(&self, field: DynamicField) -> Option<&Directive> {
        match field {
            DynamicField::Version => self.version.as_ref(),
            DynamicField::Description => self.description.as_ref(),
            DynamicField::Readme => self.readme.as_ref(),
            DynamicField::Classifiers => self.classifiers.as_ref(),
            DynamicField::EntryPoints => self.entry_points.as_ref(),
            DynamicField::Dependencies => self.dependencies.as_ref(),
            _ => None,
        }
    }
}

/// How to resolve a dynamic field.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "RawDirective")]
pub enum Directive {
    /// Read a literal value from a module, e.g. `mypkg.about.__version__`.
    Attr(String),
    /// Concatenate the contents of files relative to the project root.
    File {
        files: Vec<String>,
        /// Only meaningful for `readme`.
        content_type: Option<String>,
    },
}

impl Directive {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Attr(_) => "attr",
            Self::File { .. } => "file",
        }
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attr(attr) => write!(f, "attr = \"{attr}\""),
            Self::File { files, .. } => {
                write!(f, "file = [")?;
                for (index, file) in files.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{file}\"")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawDirective {
    attr: Option<String>,
    file: Option<OneOrMany>,
    content_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged, expecting = "a path or a list of paths")]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<RawDirective> for Directive {
    type Error = String;

    fn try_from(raw: RawDirective) -> Result<Self, Self::Error> {
        match (raw.attr, raw.file, raw.content_type) {
            (Some(attr), None, None) => Ok(Self::Attr(attr)),
            (None, Some(file), content_type) => Ok(Self::File {
                files: match file {
                    OneOrMany::One(file) => vec![file],
                    OneOrMany::Many(files) => files,
                },
                content_type,
            }),
            (Some(_), Some(_), _) => Err("`attr` and `file` are mutually exclusive".to_string()),
            (Some(_), None, Some(_)) => {
                Err("`content-type` can only be used with `file`".to_string())
            }
            (None, None, _) => Err("expected an `attr` or `file` key".to_string()),
        }
    }
}
