use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use pyconf_normalize::PackageName;

use crate::dynamic::DynamicField;
use crate::settings::ToolSetuptools;

/// A `pyproject.toml` as specified in PEP 517 and PEP 621, with the `[tool.setuptools]` table.
///
/// Unknown top-level tables are ignored, since other tools may define them.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct PyProjectToml {
    /// Project metadata.
    pub project: Option<Project>,
    /// Tool-specific settings.
    pub tool: Option<Tool>,
    /// Build-related data.
    pub build_system: Option<BuildSystem>,
}

impl PyProjectToml {
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

/// The `[project]` section of a pyproject.toml as specified in
/// <https://packaging.python.org/en/latest/specifications/pyproject-toml>.
///
/// Fields with a syntax of their own (versions, specifiers, requirements, extra names) are kept as
/// strings and checked during validation, so that errors can name the offending field.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Project {
    /// The name of the project.
    pub name: PackageName,
    /// The version of the project.
    pub version: Option<String>,
    /// The summary description of the project in one line.
    pub description: Option<String>,
    /// The full description of the project (i.e. the README).
    pub readme: Option<Readme>,
    /// The Python version requirements of the project.
    pub requires_python: Option<String>,
    /// The license under which the project is distributed.
    pub license: Option<License>,
    /// The paths to files containing licenses and other legal notices to be distributed with the
    /// project.
    pub license_files: Option<Vec<String>>,
    /// The people or organizations considered to be the "authors" of the project.
    pub authors: Option<Vec<Contact>>,
    /// The people or organizations considered to be the "maintainers" of the project.
    pub maintainers: Option<Vec<Contact>>,
    /// The keywords for the project.
    pub keywords: Option<Vec<String>>,
    /// Trove classifiers which apply to the project.
    pub classifiers: Option<Vec<String>>,
    /// A table of URLs where the key is the URL label and the value is the URL itself.
    pub urls: Option<IndexMap<String, String>>,
    /// The console entrypoints of the project.
    pub scripts: Option<BTreeMap<String, String>>,
    /// The GUI entrypoints of the project.
    pub gui_scripts: Option<BTreeMap<String, String>>,
    /// Entrypoint groups of the project.
    pub entry_points: Option<BTreeMap<String, BTreeMap<String, String>>>,
    /// The dependencies of the project.
    pub dependencies: Option<Vec<String>>,
    /// The optional dependencies of the project.
    pub optional_dependencies: Option<BTreeMap<String, Vec<String>>>,
    /// Specifies which fields listed by PEP 621 were intentionally unspecified so another tool
    /// can/will provide such metadata dynamically.
    pub dynamic: Option<Vec<DynamicField>>,
}

impl Project {
    /// Whether a field is listed in `project.dynamic`.
    pub fn is_dynamic(&self, field: DynamicField) -> bool {
        self.dynamic
            .as_ref()
            .is_some_and(|dynamic| dynamic.contains(&field))
    }

    /// Whether a field has a static value.
    pub fn is_static(&self, field: DynamicField) -> bool {
        match field {
            DynamicField::Name => true,
            DynamicField::Version => self.version.is_some(),
            DynamicField::Description => self.description.is_some(),
            DynamicField::Readme => self.readme.is_some(),
            DynamicField::RequiresPython => self.requires_python.is_some(),
            DynamicField::License => self.license.is_some(),
            DynamicField::LicenseFiles => self.license_files.is_some(),
            DynamicField::Authors => self.authors.is_some(),
            DynamicField::Maintainers => self.maintainers.is_some(),
            DynamicField::Keywords => self.keywords.is_some(),
            DynamicField::Classifiers => self.classifiers.is_some(),
            DynamicField::Urls => self.urls.is_some(),
            DynamicField::Scripts => self.scripts.is_some(),
            DynamicField::GuiScripts => self.gui_scripts.is_some(),
            DynamicField::EntryPoints => self.entry_points.is_some(),
            DynamicField::Dependencies => self.dependencies.is_some(),
            DynamicField::OptionalDependencies => self.optional_dependencies.is_some(),
        }
    }
}

/// The optional `project.readme` key in a pyproject.toml as specified in
/// <https://packaging.python.org/en/latest/specifications/pyproject-toml/#readme>.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged, rename_all_fields = "kebab-case")]
pub enum Readme {
    /// Relative path to the README.
    String(PathBuf),
    /// Relative path to the README.
    File {
        file: PathBuf,
        content_type: String,
        charset: Option<String>,
    },
    /// The full description of the project as inline value.
    Text {
        text: String,
        content_type: String,
        charset: Option<String>,
    },
}

impl Readme {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::String(file) | Self::File { file, .. } => Some(file),
            Self::Text { .. } => None,
        }
    }

    pub fn charset(&self) -> Option<&str> {
        match self {
            Self::String(_) => None,
            Self::File { charset, .. } | Self::Text { charset, .. } => charset.as_deref(),
        }
    }
}

/// The optional `project.license` key in a pyproject.toml as specified in
/// <https://packaging.python.org/en/latest/specifications/pyproject-toml/#license>.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum License {
    /// An SPDX Expression.
    Spdx(String),
    Text {
        /// The full text of the license.
        text: String,
    },
    File {
        /// The file containing the license text.
        file: PathBuf,
    },
}

/// A `project.authors` or `project.maintainers` entry as specified in
/// <https://packaging.python.org/en/latest/specifications/pyproject-toml/#authors-maintainers>.
///
/// The entry is derived from the email format of `John Doe <john.doe@example.net>`. You need to
/// provide at least name or email.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged, expecting = "a table with 'name' and/or 'email' keys")]
pub enum Contact {
    NameEmail { name: String, email: String },
    Name { name: String },
    Email { email: String },
}

/// The `[tool]` section. Only `[tool.setuptools]` is read.
#[derive(Deserialize, Debug, Clone)]
pub struct Tool {
    pub setuptools: Option<ToolSetuptools>,
}

/// The `[build-system]` section of a pyproject.toml as specified in PEP 517.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSystem {
    /// PEP 508 dependencies required to execute the build system.
    pub requires: Vec<String>,
    /// A string naming a Python object that will be used to perform the build.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_backend: Option<String>,
    /// <https://peps.python.org/pep-0517/#in-tree-build-backends>
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_path: Option<Vec<String>>,
}

/// The backends that read `[tool.setuptools]`.
pub(crate) const SETUPTOOLS_BACKENDS: [&str; 2] =
    ["setuptools.build_meta", "setuptools.build_meta:__legacy__"];

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn minimal() {
        let pyproject = PyProjectToml::parse(indoc! {r#"
            [project]
            name = "Hello_World"
            version = "1.0"

            [build-system]
            requires = ["setuptools>=77"]
            build-backend = "setuptools.build_meta"

            [tool.ruff]
            line-length = 100
        "#})
        .unwrap();
        let project = pyproject.project.unwrap();
        assert_eq!(project.name.as_str(), "hello-world");
        assert!(project.is_static(DynamicField::Version));
        assert!(!project.is_dynamic(DynamicField::Version));
        assert!(pyproject.tool.unwrap().setuptools.is_none());
    }

    #[test]
    fn contacts_and_readme() {
        let pyproject = PyProjectToml::parse(indoc! {r#"
            [project]
            name = "hello"
            authors = [{ name = "Ferris" }, { email = "ferris@example.com" }, { name = "Ferris", email = "ferris@example.com" }]
            readme = { file = "README.md", content-type = "text/markdown" }
        "#})
        .unwrap();
        let project = pyproject.project.unwrap();
        let authors = project.authors.unwrap();
        assert!(matches!(authors[0], Contact::Name { .. }));
        assert!(matches!(authors[1], Contact::Email { .. }));
        assert!(matches!(authors[2], Contact::NameEmail { .. }));
        assert_eq!(
            project.readme.as_ref().and_then(Readme::path),
            Some(Path::new("README.md"))
        );
    }

    #[test]
    fn unknown_project_key() {
        let err = PyProjectToml::parse(indoc! {r#"
            [project]
            name = "hello"
            home-page = "https://example.com"
        "#})
        .unwrap_err();
        assert!(err.to_string().contains("unknown field `home-page`"));
    }

    #[test]
    fn unknown_dynamic_field() {
        let err = PyProjectToml::parse(indoc! {r#"
            [project]
            name = "hello"
            dynamic = ["home-page"]
        "#})
        .unwrap_err();
        assert!(err.to_string().contains("unknown variant `home-page`"));
    }
}
