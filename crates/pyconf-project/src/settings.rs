use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use pyconf_discovery::FindOptions;

use crate::dynamic::DynamicTable;

/// Settings from the `[tool.setuptools]` section.
///
/// Only the keys setuptools documents for `pyproject.toml` are accepted. A missing key takes the
/// default from [`ToolSetuptools::default`]:
///
/// ```toml
/// [tool.setuptools]
/// include-package-data = true
/// package-dir = {}
/// package-data = {}
/// exclude-package-data = {}
/// cmdclass = {}
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolSetuptools {
    pub platforms: Option<Vec<String>>,
    /// Whether the project can be installed and run from a zip file. When unset, the backend
    /// decides.
    pub zip_safe: Option<bool>,
    /// Deprecated in favor of `project.scripts`.
    pub script_files: Option<Vec<String>>,
    pub eager_resources: Option<Vec<String>>,
    /// Top-level modules to include. Disables package discovery.
    pub py_modules: Option<Vec<String>>,
    /// C extensions to build. Disables package discovery.
    pub ext_modules: Option<Vec<ExtModule>>,
    /// The packages to include, either listed or found with a `find` directive.
    ///
    /// When `packages`, `py-modules` and `ext-modules` are all absent, packages are discovered
    /// automatically.
    pub packages: Option<Packages>,
    /// Maps packages to directories relative to the project root, with `""` mapping the root
    /// package.
    pub package_dir: IndexMap<String, String>,
    /// Globs of data files per package, with `*` matching every package.
    pub package_data: IndexMap<String, Vec<String>>,
    /// Whether to include data files tracked by version control or `MANIFEST.in`.
    pub include_package_data: bool,
    /// Globs of data files to exclude per package, with `*` matching every package.
    pub exclude_package_data: IndexMap<String, Vec<String>>,
    /// Deprecated in favor of `project.license-files`.
    pub license_files: Option<Vec<String>>,
    /// Deprecated, data files should be package data.
    pub data_files: Option<IndexMap<String, Vec<String>>>,
    /// Deprecated in favor of implicit namespace packages.
    pub namespace_packages: Option<Vec<String>>,
    pub provides: Option<Vec<String>>,
    pub obsoletes: Option<Vec<String>>,
    /// Maps command names to qualified class names, e.g. `build_py = "custom.BuildPy"`.
    pub cmdclass: IndexMap<String, String>,
    /// The directives resolving the `project.dynamic` fields.
    pub dynamic: DynamicTable,
}

impl Default for ToolSetuptools {
    fn default() -> Self {
        Self {
            platforms: None,
            zip_safe: None,
            script_files: None,
            eager_resources: None,
            py_modules: None,
            ext_modules: None,
            packages: None,
            package_dir: IndexMap::new(),
            package_data: IndexMap::new(),
            include_package_data: true,
            exclude_package_data: IndexMap::new(),
            license_files: None,
            data_files: None,
            namespace_packages: None,
            provides: None,
            obsoletes: None,
            cmdclass: IndexMap::new(),
            dynamic: DynamicTable::default(),
        }
    }
}

impl ToolSetuptools {
    /// The deprecated keys that are set, with the replacement to suggest.
    pub(crate) fn deprecated_keys(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        [
            (
                self.namespace_packages.is_some(),
                "namespace-packages",
                "use implicit namespace packages (PEP 420) instead",
            ),
            (
                self.data_files.is_some(),
                "data-files",
                "use `package-data` instead",
            ),
            (
                self.provides.is_some(),
                "provides",
                "it is not supported by any packaging tool",
            ),
            (
                self.obsoletes.is_some(),
                "obsoletes",
                "it is not supported by any packaging tool",
            ),
            (
                self.script_files.is_some(),
                "script-files",
                "use `project.scripts` instead",
            ),
            (
                self.license_files.is_some(),
                "license-files",
                "use `project.license-files` instead",
            ),
        ]
        .into_iter()
        .filter(|(set, _, _)| *set)
        .map(|(_, key, hint)| (key, hint))
    }

    /// Whether packages and modules are discovered from the project tree.
    pub(crate) fn auto_discovery(&self) -> bool {
        self.packages.is_none() && self.py_modules.is_none() && self.ext_modules.is_none()
    }
}

/// The `packages` key: a list of package names or a `find` directive.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(
    untagged,
    expecting = "a list of package names or a table with a `find` key"
)]
pub enum Packages {
    List(Vec<String>),
    Find(FindTable),
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FindTable {
    pub find: FindDirective,
}

/// The `find` directive, e.g. `packages = { find = { where = ["src"], exclude = ["tests*"] } }`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FindDirective {
    /// Directories to search, relative to the project root.
    #[serde(rename = "where")]
    pub where_: Vec<String>,
    /// Package name patterns to include, e.g. `mypkg*`.
    pub include: Vec<String>,
    /// Package name patterns to exclude, e.g. `tests*`.
    pub exclude: Vec<String>,
    /// Whether directories without an `__init__.py` are packages.
    pub namespaces: bool,
}

impl Default for FindDirective {
    fn default() -> Self {
        let options = FindOptions::default();
        Self {
            where_: options.where_,
            include: options.include,
            exclude: options.exclude,
            namespaces: options.namespaces,
        }
    }
}

impl From<&FindDirective> for FindOptions {
    fn from(directive: &FindDirective) -> Self {
        Self {
            where_: directive.where_.clone(),
            include: directive.include.clone(),
            exclude: directive.exclude.clone(),
            namespaces: directive.namespaces,
        }
    }
}

/// A C extension module in `tool.setuptools.ext-modules`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExtModule {
    /// The dotted name of the extension, e.g. `mypkg._speedups`.
    pub name: String,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_dirs: Vec<String>,
    /// Macros as `[name, value]` pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub define_macros: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub undef_macros: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library_dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runtime_library_dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_objects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_compile_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_link_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_symbols: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub swig_opts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub py_limited_api: Option<bool>,
}
