use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::DiscoveryError;

/// Match dotted package or module names against `fnmatch`-style patterns.
///
/// `*` matches any sequence of characters including dots, so `pkg*` matches `pkg`, `pkg.sub` and
/// `pkg_extra`. Matching is case-sensitive.
#[derive(Debug, Clone)]
pub(crate) struct NameFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

impl NameFilter {
    pub(crate) fn new<'a>(
        patterns: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, DiscoveryError> {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(false)
                .backslash_escape(false)
                .build()
                .map_err(|err| DiscoveryError::Glob {
                    glob: pattern.to_string(),
                    source: err,
                })?;
            builder.add(glob);
            kept.push(pattern.to_string());
        }
        let set = builder.build().map_err(|err| DiscoveryError::Glob {
            glob: kept.join(", "),
            source: err,
        })?;
        Ok(Self {
            patterns: kept,
            set,
        })
    }

    /// Whether any pattern matches the name.
    pub(crate) fn matches(&self, name: &str) -> bool {
        self.set.is_match(name)
    }

    /// Whether the exact pattern is part of the filter.
    pub(crate) fn contains_pattern(&self, pattern: &str) -> bool {
        self.patterns.iter().any(|current| current == pattern)
    }
}
