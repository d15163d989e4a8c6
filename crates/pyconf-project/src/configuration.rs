use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use pyconf_discovery::{
    DEFAULT_LICENSE_FILES, FindOptions, Layout, PackageDir, auto_discover, expand_license_files,
    find, resolve_package_data,
};
use pyconf_fs::Simplified;
use pyconf_normalize::{ExtraName, PackageName};

use crate::dynamic::DynamicField;
use crate::expand::Expander;
use crate::pyproject::{BuildSystem, Contact, License, Project, PyProjectToml, Readme};
use crate::settings::{ExtModule, FindTable, Packages, ToolSetuptools};
use crate::validate::{
    ValidationError, check_build_system, parse_requirement, readme_content_type, validate_dynamic,
    validate_license_files, validate_project, validate_settings,
};
use crate::{Error, ReadOptions, Warnings};

/// The resolved setuptools configuration of a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    pub metadata: Metadata,
    pub options: Options,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_system: Option<BuildSystem>,
    /// The warnings emitted while reading the configuration.
    #[serde(skip)]
    pub warnings: Vec<String>,
}

/// The `[project]` metadata, with the dynamic fields resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    pub name: PackageName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<ReadmeMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_python: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    /// The license files, or, if not expanded, the configured globs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub license_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Contact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Contact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classifiers: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub urls: IndexMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub gui_scripts: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub entry_points: BTreeMap<String, BTreeMap<String, String>>,
    /// Normalized PEP 508 requirements.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Normalized extra names to normalized PEP 508 requirements.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_dependencies: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dynamic: Vec<DynamicField>,
}

/// The long description of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReadmeMetadata {
    /// The readme file, relative to the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// The `[tool.setuptools]` options, with the packages and package data resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Options {
    /// How the packages were determined, unset if discovery didn't run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    pub packages: Vec<String>,
    pub py_modules: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ext_modules: Vec<ExtModule>,
    pub package_dir: PackageDir,
    pub include_package_data: bool,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub package_data: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub exclude_package_data: IndexMap<String, Vec<String>>,
    /// The files matched by the package data globs, per package.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub package_data_files: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_safe: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub eager_resources: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub script_files: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub data_files: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub namespace_packages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub obsoletes: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub cmdclass: IndexMap<String, String>,
}

impl Configuration {
    pub fn name(&self) -> &PackageName {
        &self.metadata.name
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.version.as_deref()
    }

    /// Validate and resolve a parsed `pyproject.toml` of the project in `root`.
    pub fn from_pyproject(
        pyproject: PyProjectToml,
        root: &Path,
        options: &ReadOptions,
    ) -> Result<Self, Error> {
        let mut warnings = Warnings::default();
        let PyProjectToml {
            project,
            tool,
            build_system,
        } = pyproject;
        let project = project.ok_or(Error::MissingProject)?;
        let settings = tool
            .and_then(|tool| tool.setuptools)
            .unwrap_or_default();

        validate_project(&project)?;
        validate_dynamic(&project, &settings.dynamic, &mut warnings)?;
        validate_settings(&settings)?;
        validate_license_files(&project, &settings)?;
        if let Some(build_system) = &build_system {
            check_build_system(build_system, &mut warnings)?;
        }
        for (key, hint) in settings.deprecated_keys() {
            warnings.push(format!("`tool.setuptools.{key}` is deprecated, {hint}"));
        }

        let mut metadata = Metadata::from_project(&project)?;
        let mut resolver = Resolver {
            root,
            options,
            warnings: &mut warnings,
        };
        let packages = resolver.packages(&settings)?;
        let mut package_data_files = BTreeMap::new();
        if options.expand {
            package_data_files = resolver.package_data(&settings, &packages)?;
            metadata.license_files = resolver.license_files(&project, &settings)?;
            resolver.readme(&project, &mut metadata)?;
            Expander::new(
                root,
                &packages.package_dir,
                options.ignore_option_errors,
                resolver.warnings,
            )
            .expand(&project, &settings.dynamic, &mut metadata)?;
        } else {
            metadata.license_files = project
                .license_files
                .clone()
                .or_else(|| settings.license_files.clone())
                .unwrap_or_default();
        }

        Ok(Self {
            metadata,
            options: Options::new(settings, packages, package_data_files),
            build_system,
            warnings: warnings.into_vec(),
        })
    }
}

impl Metadata {
    /// The static metadata, with requirements and extra names normalized.
    fn from_project(project: &Project) -> Result<Self, Error> {
        let dependencies: Vec<String> = project
            .dependencies
            .iter()
            .flatten()
            .map(|requirement| {
                parse_requirement("project.dependencies", requirement)
                    .map(|requirement| requirement.to_string())
            })
            .collect::<Result<_, _>>()?;

        let mut optional_dependencies = BTreeMap::new();
        for (extra, requirements) in project.optional_dependencies.iter().flatten() {
            let field = format!("project.optional-dependencies.{extra}");
            let requirements = requirements
                .iter()
                .map(|requirement| {
                    parse_requirement(&field, requirement)
                        .map(|requirement| requirement.to_string())
                })
                .collect::<Result<Vec<_>, _>>()?;
            let extra = extra
                .parse::<ExtraName>()
                .map_err(|err| ValidationError::InvalidExtra(extra.clone(), err))?;
            optional_dependencies.insert(extra.to_string(), requirements);
        }

        let readme = match &project.readme {
            Some(readme) => Some(ReadmeMetadata {
                file: readme.path().map(|path| path.portable_display()),
                text: match readme {
                    Readme::Text { text, .. } => Some(text.clone()),
                    Readme::String(_) | Readme::File { .. } => None,
                },
                content_type: readme_content_type(readme)?,
            }),
            None => None,
        };

        Ok(Self {
            name: project.name.clone(),
            version: project.version.clone(),
            description: project.description.clone(),
            readme,
            requires_python: project.requires_python.clone(),
            license: project.license.clone(),
            license_files: Vec::new(),
            authors: project.authors.clone().unwrap_or_default(),
            maintainers: project.maintainers.clone().unwrap_or_default(),
            keywords: project.keywords.clone().unwrap_or_default(),
            classifiers: project.classifiers.clone().unwrap_or_default(),
            urls: project.urls.clone().unwrap_or_default(),
            scripts: project.scripts.clone().unwrap_or_default(),
            gui_scripts: project.gui_scripts.clone().unwrap_or_default(),
            entry_points: project.entry_points.clone().unwrap_or_default(),
            dependencies,
            optional_dependencies,
            dynamic: project.dynamic.clone().unwrap_or_default(),
        })
    }
}

/// The packages and modules of a project.
#[derive(Debug, Clone, Default)]
struct ResolvedPackages {
    layout: Option<Layout>,
    packages: Vec<String>,
    py_modules: Vec<String>,
    package_dir: PackageDir,
}

impl Options {
    fn new(
        settings: ToolSetuptools,
        packages: ResolvedPackages,
        package_data_files: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            layout: packages.layout,
            packages: packages.packages,
            py_modules: packages.py_modules,
            ext_modules: settings.ext_modules.unwrap_or_default(),
            package_dir: packages.package_dir,
            include_package_data: settings.include_package_data,
            package_data: settings.package_data,
            exclude_package_data: settings.exclude_package_data,
            package_data_files,
            zip_safe: settings.zip_safe,
            platforms: settings.platforms.unwrap_or_default(),
            eager_resources: settings.eager_resources.unwrap_or_default(),
            script_files: settings.script_files.unwrap_or_default(),
            data_files: settings.data_files.unwrap_or_default(),
            namespace_packages: settings.namespace_packages.unwrap_or_default(),
            provides: settings.provides.unwrap_or_default(),
            obsoletes: settings.obsoletes.unwrap_or_default(),
            cmdclass: settings.cmdclass,
        }
    }
}

/// Resolves the parts of the configuration that depend on the project tree.
struct Resolver<'a> {
    root: &'a Path,
    options: &'a ReadOptions,
    warnings: &'a mut Warnings,
}

impl Resolver<'_> {
    /// Report an error, or with `ignore_option_errors`, turn it into a warning.
    fn option_error(&mut self, err: Error) -> Result<(), Error> {
        if self.options.ignore_option_errors {
            self.warnings.push_error(&err);
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Determine the packages and modules from `packages`, `py-modules` or the project tree.
    ///
    /// Without `expand`, neither the `find` directive nor auto-discovery run.
    fn packages(&mut self, settings: &ToolSetuptools) -> Result<ResolvedPackages, Error> {
        let mut resolved = ResolvedPackages {
            py_modules: settings.py_modules.clone().unwrap_or_default(),
            package_dir: settings
                .package_dir
                .iter()
                .map(|(package, directory)| (package.clone(), directory.clone()))
                .collect(),
            ..ResolvedPackages::default()
        };

        match &settings.packages {
            Some(Packages::List(packages)) => {
                resolved.layout = Some(Layout::Explicit);
                resolved.packages.clone_from(packages);
            }
            Some(Packages::Find(FindTable { find: directive })) => {
                if !self.options.expand {
                    return Ok(resolved);
                }
                let options = FindOptions::from(directive);
                match find(self.root, &options, &mut resolved.package_dir) {
                    Ok(packages) => {
                        resolved.layout = Some(Layout::Find);
                        resolved.packages = packages;
                    }
                    Err(err) => self.option_error(Error::Discovery(err))?,
                }
            }
            None if settings.auto_discovery() => {
                if !self.options.expand {
                    return Ok(resolved);
                }
                match auto_discover(self.root, &resolved.package_dir) {
                    Ok(discovered) => {
                        debug!(
                            "Discovered a {} in `{}`",
                            discovered.layout,
                            self.root.user_display()
                        );
                        resolved.layout = Some(discovered.layout);
                        resolved.packages = discovered.packages;
                        resolved.py_modules = discovered.py_modules;
                        resolved.package_dir = discovered.package_dir;
                    }
                    Err(err) => self.option_error(Error::Discovery(err))?,
                }
            }
            None => resolved.layout = Some(Layout::Explicit),
        }
        Ok(resolved)
    }

    fn package_data(
        &mut self,
        settings: &ToolSetuptools,
        packages: &ResolvedPackages,
    ) -> Result<BTreeMap<String, Vec<String>>, Error> {
        match resolve_package_data(
            self.root,
            &packages.packages,
            &packages.package_dir,
            &settings.package_data,
            &settings.exclude_package_data,
        ) {
            Ok(files) => Ok(files),
            Err(err) => {
                self.option_error(Error::PackageData(err))?;
                Ok(BTreeMap::new())
            }
        }
    }

    /// Expand `project.license-files`, the deprecated `tool.setuptools.license-files`, or the
    /// default globs, in that order.
    fn license_files(
        &mut self,
        project: &Project,
        settings: &ToolSetuptools,
    ) -> Result<Vec<String>, Error> {
        let result = if let Some(patterns) = &project.license_files {
            expand_license_files(self.root, patterns, true)
        } else if let Some(patterns) = &settings.license_files {
            expand_license_files(self.root, patterns, false)
        } else {
            let defaults: Vec<String> = DEFAULT_LICENSE_FILES
                .iter()
                .map(ToString::to_string)
                .collect();
            expand_license_files(self.root, &defaults, false)
        };
        match result {
            Ok(files) => Ok(files),
            Err(err) => {
                self.option_error(Error::LicenseFiles(err))?;
                Ok(Vec::new())
            }
        }
    }

    /// Read the text of a static readme file.
    fn readme(&mut self, project: &Project, metadata: &mut Metadata) -> Result<(), Error> {
        let Some(readme) = metadata.readme.as_mut() else {
            return Ok(());
        };
        let Some(file) = project.readme.as_ref().and_then(Readme::path) else {
            return Ok(());
        };
        let file = file.portable_display();
        let package_dir = PackageDir::default();
        let mut expander = Expander::new(
            self.root,
            &package_dir,
            self.options.ignore_option_errors,
            &mut *self.warnings,
        );
        match expander.read_files(std::slice::from_ref(&file)) {
            Ok(text) => readme.text = Some(text),
            Err(err) => self.option_error(Error::Readme { file, source: err })?,
        }
        Ok(())
    }
}
