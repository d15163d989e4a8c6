//! Package discovery for setuptools-style projects.
//!
//! Without `packages` or `py-modules` in `[tool.setuptools]`, the packages and modules to ship
//! are discovered from the project tree, either in a src-layout:
//!
//! ```text
//! project/
//! ├── pyproject.toml
//! └── src/
//!     └── mypkg/
//!         └── __init__.py
//! ```
//!
//! or in a flat-layout, with the package next to `pyproject.toml`. A `find` directive searches
//! explicit directories with include and exclude patterns instead.

use std::io;
use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

use pyconf_fs::Simplified;

pub use data::{
    DEFAULT_LICENSE_FILES, check_license_glob, expand_license_files, resolve_package_data,
};
pub use finder::{PackageKind, find_modules, find_packages};
pub use layout::{Discovered, FindOptions, Layout, auto_discover, find};
pub use package_dir::{PackageDir, construct_package_dir, remove_nested_packages, remove_stubs};

mod data;
mod filter;
mod finder;
mod layout;
mod package_dir;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Failed to walk `{}`", path.user_display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Invalid glob `{glob}`")]
    Glob {
        glob: String,
        #[source]
        source: globset::Error,
    },
    #[error(
        "Multiple top-level {kind} discovered in a flat-layout: {}. To avoid accidentally including unwanted files or directories, automatic discovery stops here. Use a `find` directive with `include` or `exclude`, move the sources to a src-layout, or list `packages` or `py-modules` explicitly",
        names.iter().map(|name| format!("`{name}`")).join(", ")
    )]
    MultipleTopLevel {
        kind: &'static str,
        names: Vec<String>,
    },
    #[error("License file glob `{pattern}` {reason}")]
    InvalidLicenseGlob {
        pattern: String,
        reason: &'static str,
    },
    #[error("License file glob `{0}` did not match any files")]
    UnmatchedLicenseGlob(String),
}

#[cfg(test)]
mod tests;
