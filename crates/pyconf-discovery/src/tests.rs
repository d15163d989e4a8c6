use indexmap::IndexMap;
use insta::assert_snapshot;
use tempfile::TempDir;

use super::*;

/// Create files (or directories, with a trailing slash) below a temporary root.
fn tree(paths: &[&str]) -> TempDir {
    let root = TempDir::new().unwrap();
    for path in paths {
        let full = root.path().join(path);
        if path.ends_with('/') {
            fs_err::create_dir_all(&full).unwrap();
        } else {
            fs_err::create_dir_all(full.parent().unwrap()).unwrap();
            fs_err::write(&full, "").unwrap();
        }
    }
    root
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[test]
fn src_layout() {
    let root = tree(&[
        "src/pkg/__init__.py",
        "src/pkg/sub/__init__.py",
        "src/nspkg/module.py",
        "src/single.py",
        "tests/test_pkg.py",
    ]);
    let discovered = auto_discover(root.path(), &PackageDir::new()).unwrap();
    assert_eq!(discovered.layout, Layout::Src);
    assert_eq!(discovered.packages, strings(&["nspkg", "pkg", "pkg.sub"]));
    assert_eq!(discovered.py_modules, strings(&["single"]));
    assert_eq!(discovered.package_dir.root(), Some("src"));
}

#[test]
fn src_layout_from_package_dir() {
    let root = tree(&["lib/pkg/__init__.py", "src/other/__init__.py"]);
    let package_dir = [(String::new(), "lib".to_string())].into_iter().collect();
    let discovered = auto_discover(root.path(), &package_dir).unwrap();
    assert_eq!(discovered.layout, Layout::Src);
    assert_eq!(discovered.packages, strings(&["pkg"]));
    assert_eq!(discovered.package_dir.root(), Some("lib"));
}

#[test]
fn explicit_package_dir() {
    let root = tree(&["code/__init__.py", "code/inner/__init__.py", "src/ignored/__init__.py"]);
    let package_dir = [("mypkg".to_string(), "code".to_string())]
        .into_iter()
        .collect();
    let discovered = auto_discover(root.path(), &package_dir).unwrap();
    assert_eq!(discovered.layout, Layout::PackageDir);
    assert_eq!(discovered.packages, strings(&["mypkg", "mypkg.inner"]));
}

#[test]
fn flat_layout_single_package() {
    let root = tree(&[
        "mypkg/__init__.py",
        "mypkg/data/",
        "tests/__init__.py",
        "docs/conf.py",
        ".venv/lib/",
        "build/lib/mypkg/__init__.py",
        "setup.py",
        "mypkg-stubs/__init__.pyi",
    ]);
    let discovered = auto_discover(root.path(), &PackageDir::new()).unwrap();
    assert_eq!(discovered.layout, Layout::Flat);
    assert_eq!(
        discovered.packages,
        strings(&["mypkg", "mypkg-stubs", "mypkg.data"])
    );
    assert!(discovered.py_modules.is_empty());
}

#[test]
fn flat_layout_single_module() {
    let root = tree(&["mymodule.py", "setup.py", "conftest.py", "noxfile.py", "_private.py"]);
    let discovered = auto_discover(root.path(), &PackageDir::new()).unwrap();
    assert_eq!(discovered.layout, Layout::Flat);
    assert!(discovered.packages.is_empty());
    assert_eq!(discovered.py_modules, strings(&["mymodule"]));
}

#[test]
fn flat_layout_empty() {
    let root = tree(&["tests/test_a.py", "README.md"]);
    let discovered = auto_discover(root.path(), &PackageDir::new()).unwrap();
    assert_eq!(discovered.layout, Layout::Flat);
    assert!(discovered.packages.is_empty());
    assert!(discovered.py_modules.is_empty());
}

#[test]
fn flat_layout_multiple_packages() {
    let root = tree(&["pkg_a/__init__.py", "pkg_b/__init__.py"]);
    let err = auto_discover(root.path(), &PackageDir::new()).unwrap_err();
    assert_snapshot!(err, @"Multiple top-level packages discovered in a flat-layout: `pkg_a`, `pkg_b`. To avoid accidentally including unwanted files or directories, automatic discovery stops here. Use a `find` directive with `include` or `exclude`, move the sources to a src-layout, or list `packages` or `py-modules` explicitly");
}

#[test]
fn flat_layout_multiple_modules() {
    let root = tree(&["one.py", "two.py"]);
    let err = auto_discover(root.path(), &PackageDir::new()).unwrap_err();
    assert!(matches!(
        err,
        DiscoveryError::MultipleTopLevel { kind: "modules", .. }
    ));
}

#[test]
fn find_regular_packages() {
    let root = tree(&[
        "pkg/__init__.py",
        "pkg/sub/__init__.py",
        "pkg/namespace/module.py",
        "pkg/__pycache__/x.pyc",
        "pkg.old/__init__.py",
        "ez_setup/__init__.py",
    ]);
    let options = FindOptions {
        namespaces: false,
        ..FindOptions::default()
    };
    let mut package_dir = PackageDir::new();
    let packages = find(root.path(), &options, &mut package_dir).unwrap();
    assert_eq!(packages, strings(&["pkg", "pkg.sub"]));
    assert!(package_dir.is_empty());
}

#[test]
fn find_namespaces_with_patterns() {
    let root = tree(&[
        "pkg/__init__.py",
        "pkg/tests/__init__.py",
        "pkg/tests/deep/__init__.py",
        "pkg/ns/module.py",
        "other/__init__.py",
    ]);
    let options = FindOptions {
        include: strings(&["pkg*"]),
        exclude: strings(&["pkg.tests*"]),
        ..FindOptions::default()
    };
    let mut package_dir = PackageDir::new();
    let packages = find(root.path(), &options, &mut package_dir).unwrap();
    assert_eq!(packages, strings(&["pkg", "pkg.ns"]));
}

#[test]
fn find_excluded_parent_keeps_children() {
    let root = tree(&["pkg/__init__.py", "pkg/sub/__init__.py"]);
    let options = FindOptions {
        exclude: strings(&["pkg"]),
        ..FindOptions::default()
    };
    let packages = find(root.path(), &options, &mut PackageDir::new()).unwrap();
    assert_eq!(packages, strings(&["pkg.sub"]));
}

#[test]
fn find_single_where_sets_root_package_dir() {
    let root = tree(&["lib/pkg/__init__.py", "lib/pkg/sub/__init__.py"]);
    let options = FindOptions {
        where_: strings(&["lib"]),
        ..FindOptions::default()
    };
    let mut package_dir = PackageDir::new();
    let packages = find(root.path(), &options, &mut package_dir).unwrap();
    assert_eq!(packages, strings(&["pkg", "pkg.sub"]));
    assert_eq!(package_dir.root(), Some("lib"));
    assert_eq!(package_dir.get("pkg"), None);
}

#[test]
fn find_multiple_where_maps_packages() {
    let root = tree(&["a/one/__init__.py", "b/two/__init__.py", "b/two/sub/__init__.py"]);
    let options = FindOptions {
        where_: strings(&["a", "b", "a"]),
        ..FindOptions::default()
    };
    let mut package_dir = PackageDir::new();
    let packages = find(root.path(), &options, &mut package_dir).unwrap();
    assert_eq!(packages, strings(&["one", "two", "two.sub"]));
    assert_eq!(package_dir.root(), None);
    assert_eq!(package_dir.get("one"), Some("a/one"));
    assert_eq!(package_dir.get("two"), Some("b/two"));
    assert_eq!(package_dir.get("two.sub"), None);
}

#[test]
fn package_data() {
    let root = tree(&[
        "src/pkg/__init__.py",
        "src/pkg/data/a.json",
        "src/pkg/data/b.json",
        "src/pkg/data/nested/c.json",
        "src/pkg/data/.hidden.json",
        "src/pkg/py.typed",
        "src/pkg/sub/__init__.py",
        "src/pkg/sub/py.typed",
        "src/pkg/sub/skip.txt",
    ]);
    let package_dir = [(String::new(), "src".to_string())].into_iter().collect();
    let packages = strings(&["pkg", "pkg.sub"]);
    let package_data: IndexMap<String, Vec<String>> = [
        ("*".to_string(), strings(&["py.typed"])),
        ("pkg".to_string(), strings(&["data/*.json", "data/**/*.json"])),
        ("pkg.sub".to_string(), strings(&["*.txt"])),
    ]
    .into_iter()
    .collect();
    let exclude: IndexMap<String, Vec<String>> = [("pkg".to_string(), strings(&["*b.json"]))]
        .into_iter()
        .collect();

    let resolved =
        resolve_package_data(root.path(), &packages, &package_dir, &package_data, &exclude)
            .unwrap();
    assert_eq!(
        resolved["pkg"],
        strings(&["data/a.json", "data/nested/c.json", "py.typed"])
    );
    assert_eq!(resolved["pkg.sub"], strings(&["py.typed", "skip.txt"]));
}

#[test]
fn license_files() {
    let root = tree(&[
        "LICENSE",
        "LICENSE.txt~",
        "COPYING.md",
        "NOTICE",
        "licenses/APACHE.txt",
        "licenses/MIT.txt",
        "src/pkg/LICENSE",
    ]);
    let defaults = strings(&DEFAULT_LICENSE_FILES);
    let files = expand_license_files(root.path(), &defaults, false).unwrap();
    assert_eq!(files, strings(&["LICENSE", "COPYING.md", "NOTICE"]));

    let patterns = strings(&["licenses/*.txt", "LICENSE", "licenses/MIT.txt"]);
    let files = expand_license_files(root.path(), &patterns, true).unwrap();
    assert_eq!(
        files,
        strings(&["licenses/APACHE.txt", "licenses/MIT.txt", "LICENSE"])
    );

    let err = expand_license_files(root.path(), &strings(&["AUTHORS*"]), true).unwrap_err();
    assert_snapshot!(err, @"License file glob `AUTHORS*` did not match any files");
}

#[test]
fn license_globs_stay_inside_the_project() {
    assert_snapshot!(
        check_license_glob("../LICENSE").unwrap_err(),
        @"License file glob `../LICENSE` must not contain `..`"
    );
    assert_snapshot!(
        check_license_glob("/etc/LICENSE").unwrap_err(),
        @"License file glob `/etc/LICENSE` must be relative to the project root"
    );
    assert!(check_license_glob("licenses/**/*.txt").is_ok());
}

#[test]
fn missing_directories() {
    let root = tree(&[]);
    let packages = find_packages(
        &root.path().join("missing"),
        &strings(&["*"]),
        &[],
        PackageKind::Namespace,
    )
    .unwrap();
    assert!(packages.is_empty());
}
