//! Read the setuptools configuration from `pyproject.toml`.
//!
//! The `[project]` table and the `[tool.setuptools]` table are deserialized, validated against
//! each other, and, unless disabled, expanded: the fields in `project.dynamic` are resolved
//! through the `tool.setuptools.dynamic` directives and the packages are discovered from the
//! project tree.
//!
//! ```toml
//! [project]
//! name = "mypkg"
//! dynamic = ["version"]
//!
//! [tool.setuptools.dynamic]
//! version = { attr = "mypkg.__version__" }
//! ```

use std::error::Error as _;
use std::fmt::Write;
use std::io;
use std::iter;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use pyconf_discovery::DiscoveryError;
use pyconf_fs::Simplified;
use pyconf_warnings::{warn_user_chain, warn_user_once};

pub use configuration::{Configuration, Metadata, Options, ReadmeMetadata};
pub use dynamic::{Directive, DynamicField, DynamicTable};
pub use expand::ExpandError;
pub use pyproject::{BuildSystem, Contact, License, Project, PyProjectToml, Readme, Tool};
pub use settings::{ExtModule, FindDirective, FindTable, Packages, ToolSetuptools};
pub use validate::ValidationError;

mod configuration;
mod dynamic;
mod expand;
mod pyproject;
mod settings;
mod validate;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read `{}`", path.user_display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid pyproject.toml")]
    Toml(#[from] toml::de::Error),
    #[error("Missing `[project]` table, it is required to read the setuptools configuration")]
    MissingProject,
    #[error("Invalid pyproject.toml")]
    Validation(#[from] ValidationError),
    #[error("Failed to resolve dynamic `project.{field}`")]
    Dynamic {
        field: DynamicField,
        #[source]
        source: ExpandError,
    },
    #[error("Failed to read the readme `{file}`")]
    Readme {
        file: String,
        #[source]
        source: ExpandError,
    },
    #[error("Failed to discover the packages of the project")]
    Discovery(#[from] DiscoveryError),
    #[error("Failed to resolve `tool.setuptools.package-data`")]
    PackageData(#[source] DiscoveryError),
    #[error("Failed to expand the license files")]
    LicenseFiles(#[source] DiscoveryError),
}

/// How to read the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Resolve dynamic fields, discover packages and match package data and license globs.
    pub expand: bool,
    /// Report failing directives and discovery errors as warnings, leaving the affected fields
    /// unset. Schema and validation errors are still errors.
    pub ignore_option_errors: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            expand: true,
            ignore_option_errors: false,
        }
    }
}

/// Read the configuration from a `pyproject.toml`, relative to the directory containing it.
pub fn read_configuration(
    pyproject_toml: &Path,
    options: &ReadOptions,
) -> Result<Configuration, Error> {
    debug!("Reading `{}`", pyproject_toml.user_display());
    let contents = fs_err::read_to_string(pyproject_toml).map_err(|err| Error::Io {
        path: pyproject_toml.to_path_buf(),
        source: err,
    })?;
    let pyproject = PyProjectToml::parse(&contents)?;
    let root = pyproject_toml.parent().unwrap_or(Path::new("."));
    let root = if root.as_os_str().is_empty() {
        Path::new(".")
    } else {
        root
    };
    Configuration::from_pyproject(pyproject, root, options)
}

/// The warnings of a read, shown to the user as they are emitted.
#[derive(Debug, Default)]
pub(crate) struct Warnings(Vec<String>);

impl Warnings {
    pub(crate) fn push(&mut self, message: String) {
        warn_user_once!("{message}");
        self.0.push(message);
    }

    /// Record an error that was downgraded to a warning, with its causes.
    pub(crate) fn push_error(&mut self, err: &Error) {
        warn_user_chain(err);
        let mut message = err.to_string();
        for source in iter::successors(err.source(), |&err| err.source()) {
            let _ = write!(message, ": {source}");
        }
        self.0.push(message);
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.0
    }
}
