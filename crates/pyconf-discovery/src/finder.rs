use std::path::Path;

use itertools::Itertools;
use tracing::trace;
use walkdir::WalkDir;

use pyconf_normalize::Identifier;

use crate::DiscoveryError;
use crate::filter::NameFilter;

/// Excluded by every package finder.
const ALWAYS_EXCLUDE: [&str; 2] = ["ez_setup", "*__pycache__"];

/// Directories that are never packages in a flat layout, each also excluded with `.*`.
const FLAT_LAYOUT_EXCLUDED_PACKAGES: [&str; 35] = [
    "ci",
    "bin",
    "debian",
    "doc",
    "docs",
    "documentation",
    "manpages",
    "news",
    "newsfragments",
    "changelog",
    "test",
    "tests",
    "unit_test",
    "unit_tests",
    "example",
    "examples",
    "scripts",
    "tools",
    "util",
    "utils",
    "python",
    "build",
    "dist",
    "venv",
    "env",
    "requirements",
    "tasks",
    "fabfile",
    "site_scons",
    "benchmark",
    "benchmarks",
    "exercise",
    "exercises",
    "htmlcov",
    "[._]*",
];

/// Files that are never modules in a flat layout.
const FLAT_LAYOUT_EXCLUDED_MODULES: [&str; 22] = [
    "setup",
    "conftest",
    "test",
    "tests",
    "example",
    "examples",
    "build",
    "toxfile",
    "noxfile",
    "pavement",
    "dodo",
    "tasks",
    "fabfile",
    "[Ss][Cc]onstruct",
    "conanfile",
    "manage",
    "benchmark",
    "benchmarks",
    "exercise",
    "exercises",
    "htmlcov",
    "[._]*",
];

/// Which directories count as packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Directories with an `__init__.py`.
    Regular,
    /// Any directory, following PEP 420 implicit namespace packages.
    Namespace,
    /// Any directory whose path segments are identifiers (the top-level one may end in
    /// `-stubs`), minus the conventional non-package directories of a flat layout.
    FlatLayout,
}

/// Find all packages below `where_`, as dotted names relative to it.
///
/// A package matches if it matches any of the `include` patterns and none of the `exclude`
/// patterns. Sub-packages of an excluded package are still searched, unless the exclusion
/// contains `pkg*` or `pkg.*`. The result is sorted.
pub fn find_packages(
    where_: &Path,
    include: &[String],
    exclude: &[String],
    kind: PackageKind,
) -> Result<Vec<String>, DiscoveryError> {
    let include = NameFilter::new(include.iter().map(String::as_str))?;
    let flat_excludes: Vec<String> = if kind == PackageKind::FlatLayout {
        FLAT_LAYOUT_EXCLUDED_PACKAGES
            .iter()
            .flat_map(|pattern| [(*pattern).to_string(), format!("{pattern}.*")])
            .collect()
    } else {
        Vec::new()
    };
    let exclude = NameFilter::new(
        ALWAYS_EXCLUDE
            .into_iter()
            .chain(exclude.iter().map(String::as_str))
            .chain(flat_excludes.iter().map(String::as_str)),
    )?;

    let mut packages = Vec::new();
    if !where_.is_dir() {
        trace!("Not searching missing directory `{}`", where_.display());
        return Ok(packages);
    }

    let mut walker = WalkDir::new(where_)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|err| DiscoveryError::Walk {
            path: where_.to_path_buf(),
            source: err,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(package) = dotted_name(where_, entry.path()) else {
            walker.skip_current_dir();
            continue;
        };
        let name = entry.file_name().to_string_lossy();
        if name.contains('.') || !looks_like_package(entry.path(), &package, kind) {
            walker.skip_current_dir();
            continue;
        }

        if include.matches(&package) && !exclude.matches(&package) {
            packages.push(package.clone());
        }

        // There's nothing left to find below an excluded tree.
        if exclude.contains_pattern(&format!("{package}*"))
            || exclude.contains_pattern(&format!("{package}.*"))
        {
            walker.skip_current_dir();
        }
    }

    packages.sort();
    trace!("Found packages in `{}`: {packages:?}", where_.display());
    Ok(packages)
}

/// Find all top-level modules (`*.py` files) directly in `where_`. The result is sorted.
pub fn find_modules(
    where_: &Path,
    include: &[String],
    exclude: &[String],
    flat_layout: bool,
) -> Result<Vec<String>, DiscoveryError> {
    let include = NameFilter::new(include.iter().map(String::as_str))?;
    let exclude = NameFilter::new(exclude.iter().map(String::as_str).chain(
        FLAT_LAYOUT_EXCLUDED_MODULES
            .into_iter()
            .filter(|_| flat_layout),
    ))?;

    if !where_.is_dir() {
        return Ok(Vec::new());
    }

    let mut modules = Vec::new();
    for entry in fs_err::read_dir(where_)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|extension| extension != "py") {
            continue;
        }
        let Some(module) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if !Identifier::is_valid(module) {
            continue;
        }
        if include.matches(module) && !exclude.matches(module) {
            modules.push(module.to_string());
        }
    }
    modules.sort();
    trace!("Found modules in `{}`: {modules:?}", where_.display());
    Ok(modules)
}

/// Convert a directory below `where_` into a dotted package name.
fn dotted_name(where_: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(where_).ok()?;
    relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()
        .map(|parts| parts.iter().join("."))
}

fn looks_like_package(path: &Path, package: &str, kind: PackageKind) -> bool {
    match kind {
        PackageKind::Regular => path.join("__init__.py").is_file(),
        PackageKind::Namespace => true,
        PackageKind::FlatLayout => {
            let mut names = package.split('.');
            let root_is_valid = names
                .next()
                .is_some_and(|root| Identifier::is_valid(root) || root.ends_with("-stubs"));
            root_is_valid && names.all(Identifier::is_valid)
        }
    }
}
