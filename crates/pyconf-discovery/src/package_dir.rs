use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The `package-dir` mapping from package names to directories relative to the project root.
///
/// The empty key `""` maps the root package, i.e. the directory holding all top-level packages
/// that have no mapping of their own. Directories use `/` as separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageDir(IndexMap<String, String>);

impl PackageDir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, package: &str) -> Option<&str> {
        self.0.get(package).map(String::as_str)
    }

    /// The directory of the root package, the `""` entry.
    pub fn root(&self) -> Option<&str> {
        self.get("")
    }

    pub fn insert(&mut self, package: impl Into<String>, directory: impl Into<String>) {
        self.0.insert(package.into(), directory.into());
    }

    /// Insert the mapping unless the package already has one.
    pub fn insert_default(&mut self, package: impl Into<String>, directory: impl Into<String>) {
        self.0.entry(package.into()).or_insert_with(|| directory.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(package, directory)| (package.as_str(), directory.as_str()))
    }

    /// The mappings of named packages, without the root package.
    pub fn explicit_packages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(package, _)| !package.is_empty())
    }

    /// The directory a package lives in, even if it doesn't exist.
    ///
    /// The most specific mapping wins: for `a.b.c`, a mapping for `a.b` is preferred over one for
    /// `a`, which in turn is preferred over the root package mapping.
    pub fn find_package_path(&self, name: &str, root: &Path) -> PathBuf {
        let parts: Vec<&str> = name.split('.').collect();
        for index in (1..=parts.len()).rev() {
            let partial = parts[..index].join(".");
            if let Some(parent) = self.get(&partial) {
                let mut path = join_portable(root, parent);
                path.extend(&parts[index..]);
                return path;
            }
        }
        let mut path = join_portable(root, self.root().unwrap_or_default());
        path.extend(&parts);
        path
    }

    /// The source file of a module: `<path>.py`, or `<path>/__init__.py` for a package.
    pub fn find_module(&self, module: &str, root: &Path) -> Option<PathBuf> {
        let path = self.find_package_path(module, root);
        let mut file = path.clone().into_os_string();
        file.push(".py");
        [PathBuf::from(file), path.join("__init__.py")]
            .into_iter()
            .find(|candidate| candidate.is_file())
    }
}

impl FromIterator<(String, String)> for PackageDir {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Join a `/`-separated relative directory onto a path.
fn join_portable(root: &Path, directory: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(
        directory
            .split('/')
            .filter(|component| !component.is_empty() && *component != "."),
    );
    path
}

/// Map each top-level package to its directory below `prefix`.
///
/// Nested packages are covered by their parents' mapping.
pub fn construct_package_dir(packages: &[String], prefix: &str) -> PackageDir {
    let prefix = prefix.trim_end_matches('/');
    remove_nested_packages(packages)
        .into_iter()
        .map(|package| {
            let directory = std::iter::once(prefix)
                .filter(|prefix| !prefix.is_empty() && *prefix != ".")
                .chain(package.split('.'))
                .collect::<Vec<_>>()
                .join("/");
            (package, directory)
        })
        .collect()
}

/// Keep only the packages whose parent isn't in the list.
pub fn remove_nested_packages(packages: &[String]) -> Vec<String> {
    let mut sorted: Vec<&String> = packages.iter().collect();
    sorted.sort_by_key(|package| package.len());
    let mut top_level: Vec<String> = Vec::new();
    for package in sorted {
        let nested = top_level.iter().any(|parent| {
            package
                .strip_prefix(parent.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
        });
        if !nested && !top_level.contains(package) {
            top_level.push(package.clone());
        }
    }
    top_level
}

/// Drop stub-only packages, i.e. packages whose top-level name ends with `-stubs`.
pub fn remove_stubs(packages: &[String]) -> Vec<String> {
    packages
        .iter()
        .filter(|package| {
            !package
                .split('.')
                .next()
                .is_some_and(|top| top.ends_with("-stubs"))
        })
        .cloned()
        .collect()
}
