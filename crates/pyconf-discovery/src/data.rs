use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use tracing::{debug, trace};
use walkdir::WalkDir;

use pyconf_fs::Simplified;

use crate::DiscoveryError;
use crate::filter::NameFilter;
use crate::package_dir::PackageDir;

/// The default license globs, used when no `license-files` are configured.
pub const DEFAULT_LICENSE_FILES: [&str; 4] = ["LICEN[CS]E*", "COPYING*", "NOTICE*", "AUTHORS*"];

/// Resolve the `package-data` globs of each package into the files they match.
///
/// Globs are relative to the package directory and use `*` for a single path segment and `**`
/// for any number of directories. The entries under `*` apply to every package. Files matching
/// an `exclude-package-data` pattern for the package (or `*`) are dropped. Hidden files are
/// never matched.
///
/// Returns the sorted files, relative to their package directory, for each package that has any.
pub fn resolve_package_data(
    root: &Path,
    packages: &[String],
    package_dir: &PackageDir,
    package_data: &IndexMap<String, Vec<String>>,
    exclude_package_data: &IndexMap<String, Vec<String>>,
) -> Result<BTreeMap<String, Vec<String>>, DiscoveryError> {
    let mut resolved = BTreeMap::new();
    for package in packages {
        let patterns: Vec<&str> = patterns_for(package_data, package).collect();
        if patterns.is_empty() {
            continue;
        }
        let includes = glob_set(&patterns)?;
        let excludes = NameFilter::new(patterns_for(exclude_package_data, package))?;

        let directory = package_dir.find_package_path(package, root);
        let mut files: Vec<String> = walk_files(&directory, None)?
            .into_iter()
            .map(|relative| relative.portable_display())
            .filter(|relative| includes.is_match(relative) && !excludes.matches(relative))
            .collect();
        files.sort();
        files.dedup();
        trace!("Package data for `{package}`: {files:?}");
        if !files.is_empty() {
            resolved.insert(package.clone(), files);
        }
    }
    Ok(resolved)
}

fn patterns_for<'a>(
    table: &'a IndexMap<String, Vec<String>>,
    package: &str,
) -> impl Iterator<Item = &'a str> {
    table
        .get("*")
        .into_iter()
        .chain(table.get(package))
        .flatten()
        .map(String::as_str)
}

/// Check that a license glob stays inside the project.
pub fn check_license_glob(pattern: &str) -> Result<(), DiscoveryError> {
    let path = Path::new(pattern);
    if path.has_root() || path.is_absolute() {
        return Err(DiscoveryError::InvalidLicenseGlob {
            pattern: pattern.to_string(),
            reason: "must be relative to the project root",
        });
    }
    if path
        .components()
        .any(|component| component == Component::ParentDir)
    {
        return Err(DiscoveryError::InvalidLicenseGlob {
            pattern: pattern.to_string(),
            reason: "must not contain `..`",
        });
    }
    Ok(())
}

/// Expand license globs relative to the project root.
///
/// Each glob's matches are sorted, and files matched by an earlier glob are not repeated. Backup
/// files ending in `~` are skipped. With `require_matches`, a glob that matches no file is an
/// error; this applies to globs from `project.license-files`, but not to the defaults.
pub fn expand_license_files(
    root: &Path,
    patterns: &[String],
    require_matches: bool,
) -> Result<Vec<String>, DiscoveryError> {
    let mut files: Vec<String> = Vec::new();
    for pattern in patterns {
        check_license_glob(pattern)?;
        let matcher = glob(pattern)?.compile_matcher();
        let max_depth = if pattern.contains("**") {
            None
        } else {
            Some(pattern.trim_start_matches("./").matches('/').count() + 1)
        };

        let mut matched = matching_files(root, &matcher, max_depth)?;
        matched.sort();
        if matched.is_empty() {
            if require_matches {
                return Err(DiscoveryError::UnmatchedLicenseGlob(pattern.clone()));
            }
            debug!("License glob `{pattern}` did not match any files");
        }
        for file in matched {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }
    Ok(files)
}

fn matching_files(
    root: &Path,
    matcher: &GlobMatcher,
    max_depth: Option<usize>,
) -> Result<Vec<String>, DiscoveryError> {
    Ok(walk_files(root, max_depth)?
        .into_iter()
        .map(|relative| relative.portable_display())
        .filter(|relative| !relative.ends_with('~') && matcher.is_match(relative.as_str()))
        .collect())
}

/// All non-hidden files below `directory`, relative to it.
fn walk_files(directory: &Path, max_depth: Option<usize>) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !directory.is_dir() {
        return Ok(Vec::new());
    }
    let mut walker = WalkDir::new(directory).min_depth(1).sort_by_file_name();
    if let Some(max_depth) = max_depth {
        walker = walker.max_depth(max_depth);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|entry| {
        !entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
    }) {
        let entry = entry.map_err(|err| DiscoveryError::Walk {
            path: directory.to_path_buf(),
            source: err,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(directory) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

/// A glob in which `*` doesn't cross directory boundaries, like Python's `glob`.
fn glob(pattern: &str) -> Result<globset::Glob, DiscoveryError> {
    GlobBuilder::new(pattern.trim_start_matches("./"))
        .literal_separator(true)
        .backslash_escape(false)
        .build()
        .map_err(|err| DiscoveryError::Glob {
            glob: pattern.to_string(),
            source: err,
        })
}

fn glob_set(patterns: &[&str]) -> Result<GlobSet, DiscoveryError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(glob(pattern)?);
    }
    builder.build().map_err(|err| DiscoveryError::Glob {
        glob: patterns.join(", "),
        source: err,
    })
}
