use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use pyconf_fs::Simplified;

use crate::DiscoveryError;
use crate::finder::{PackageKind, find_modules, find_packages};
use crate::package_dir::{PackageDir, construct_package_dir, remove_nested_packages, remove_stubs};

/// How the packages of a project were determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// `packages` and/or `py-modules` were listed explicitly.
    Explicit,
    /// A `find` directive.
    Find,
    /// Packages found below the explicit `package-dir` mappings.
    PackageDir,
    /// Packages below `src/`, or the directory mapped to `""`.
    Src,
    /// Packages or modules directly in the project root.
    Flat,
}

impl Display for Layout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::Find => write!(f, "find"),
            Self::PackageDir => write!(f, "package-dir"),
            Self::Src => write!(f, "src-layout"),
            Self::Flat => write!(f, "flat-layout"),
        }
    }
}

/// The result of package discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Discovered {
    pub layout: Layout,
    pub packages: Vec<String>,
    pub py_modules: Vec<String>,
    pub package_dir: PackageDir,
}

/// The parameters of a `find` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    /// Directories to search, relative to the project root.
    pub where_: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Whether directories without `__init__.py` are packages.
    pub namespaces: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            where_: vec![".".to_string()],
            include: vec!["*".to_string()],
            exclude: Vec::new(),
            namespaces: true,
        }
    }
}

/// Run a `find` directive, filling in `package_dir` for packages outside of the root.
///
/// With a single search directory other than the root, that directory becomes the root package
/// directory (`"" = where`). Otherwise the top-level packages found in each non-root directory
/// are mapped individually.
pub fn find(
    root: &Path,
    options: &FindOptions,
    package_dir: &mut PackageDir,
) -> Result<Vec<String>, DiscoveryError> {
    let search: Vec<&str> = options
        .where_
        .iter()
        .map(String::as_str)
        .unique()
        .collect();
    let kind = if options.namespaces {
        PackageKind::Namespace
    } else {
        PackageKind::Regular
    };

    if let [single] = search.as_slice() {
        if !is_root(root, single) {
            package_dir.insert_default("", trim_directory(single));
        }
    }

    let mut packages = Vec::new();
    for directory in search {
        let path = nest_path(root, directory);
        let found = find_packages(&path, &options.include, &options.exclude, kind)?;
        debug!(
            "`find` in `{}` discovered packages: {}",
            path.user_display(),
            found.join(", ")
        );
        let mapped_as_root = package_dir.root() == Some(trim_directory(directory));
        if !found.is_empty() && !mapped_as_root && !is_root(root, directory) {
            for (package, directory) in
                construct_package_dir(&found, trim_directory(directory)).iter()
            {
                package_dir.insert(package, directory);
            }
        }
        packages.extend(found);
    }
    Ok(packages)
}

/// Discover packages and modules when neither `packages`, `py-modules` nor `ext-modules` are
/// configured.
///
/// The layouts are tried in order: explicit `package-dir` mappings, the src-layout, and the
/// flat-layout. A flat-layout must contain at most one top-level package (or, without packages,
/// at most one module), to avoid accidentally shipping tests, scripts and the like.
pub fn auto_discover(root: &Path, package_dir: &PackageDir) -> Result<Discovered, DiscoveryError> {
    debug!("No `packages` or `py-modules` configuration, performing automatic discovery");

    if let Some(discovered) = analyse_package_dir(root, package_dir)? {
        return Ok(discovered);
    }
    if let Some(discovered) = analyse_src_layout(root, package_dir)? {
        return Ok(discovered);
    }
    analyse_flat_layout(root, package_dir)
}

/// Packages below each explicitly mapped package directory.
fn analyse_package_dir(
    root: &Path,
    package_dir: &PackageDir,
) -> Result<Option<Discovered>, DiscoveryError> {
    let mut packages = Vec::new();
    let mut any = false;
    for (package, directory) in package_dir.explicit_packages() {
        any = true;
        let path = nest_path(root, directory);
        debug!("Explicit `package-dir` detected, analysing `{}`", path.user_display());
        packages.push(package.to_string());
        let nested = find_packages(&path, &["*".to_string()], &[], PackageKind::Namespace)?;
        packages.extend(nested.into_iter().map(|nested| format!("{package}.{nested}")));
    }
    if !any {
        return Ok(None);
    }
    debug!("Discovered packages: {}", packages.join(", "));
    Ok(Some(Discovered {
        layout: Layout::PackageDir,
        packages,
        py_modules: Vec::new(),
        package_dir: package_dir.clone(),
    }))
}

fn analyse_src_layout(
    root: &Path,
    package_dir: &PackageDir,
) -> Result<Option<Discovered>, DiscoveryError> {
    let src_dir = nest_path(root, package_dir.root().unwrap_or("src"));
    if !src_dir.is_dir() {
        return Ok(None);
    }
    debug!("`src-layout` detected, analysing `{}`", src_dir.user_display());

    let mut package_dir = package_dir.clone();
    let name = src_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    package_dir.insert_default("", name);

    let everything = ["*".to_string()];
    let packages = find_packages(&src_dir, &everything, &[], PackageKind::Namespace)?;
    let py_modules = find_modules(&src_dir, &everything, &[], false)?;
    debug!("Discovered packages: {}", packages.join(", "));
    debug!("Discovered py-modules: {}", py_modules.join(", "));
    Ok(Some(Discovered {
        layout: Layout::Src,
        packages,
        py_modules,
        package_dir,
    }))
}

fn analyse_flat_layout(root: &Path, package_dir: &PackageDir) -> Result<Discovered, DiscoveryError> {
    debug!("`flat-layout` detected, analysing `{}`", root.user_display());
    let everything = ["*".to_string()];

    let packages = find_packages(root, &everything, &[], PackageKind::FlatLayout)?;
    debug!("Discovered packages: {}", packages.join(", "));
    let top_level = remove_nested_packages(&remove_stubs(&packages));
    ensure_single("packages", &top_level)?;

    let py_modules = if top_level.is_empty() {
        let py_modules = find_modules(root, &everything, &[], true)?;
        debug!("Discovered py-modules: {}", py_modules.join(", "));
        ensure_single("modules", &py_modules)?;
        py_modules
    } else {
        Vec::new()
    };

    Ok(Discovered {
        layout: Layout::Flat,
        packages,
        py_modules,
        package_dir: package_dir.clone(),
    })
}

fn ensure_single(kind: &'static str, names: &[String]) -> Result<(), DiscoveryError> {
    if names.len() > 1 {
        return Err(DiscoveryError::MultipleTopLevel {
            kind,
            names: names.to_vec(),
        });
    }
    Ok(())
}

/// Resolve a `/`-separated directory relative to the root, with `.` and `""` meaning the root.
fn nest_path(root: &Path, directory: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(
        directory
            .split('/')
            .filter(|component| !component.is_empty() && *component != "."),
    );
    path
}

fn is_root(root: &Path, directory: &str) -> bool {
    nest_path(root, directory) == root
}

fn trim_directory(directory: &str) -> &str {
    let directory = directory.trim_end_matches('/');
    directory.strip_prefix("./").unwrap_or(directory)
}
