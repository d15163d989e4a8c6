use anyhow::Result;
use indoc::indoc;
use predicates::prelude::*;

use crate::{project, pyconf};

const PYPROJECT_TOML: &str = indoc! {r#"
    [project]
    name = "hello"
    dynamic = ["version", "readme", "dependencies"]
    license = "MIT"
    authors = [{ name = "Ferris", email = "ferris@example.com" }]

    [project.scripts]
    hello = "hello.cli:main"

    [tool.setuptools.dynamic]
    version = { attr = "hello.VERSION" }
    readme = { file = "README.md", content-type = "text/markdown" }
    dependencies = { file = "requirements.txt" }

    [tool.setuptools.package-data]
    hello = ["*.json"]

    [build-system]
    requires = ["setuptools>=77"]
    build-backend = "setuptools.build_meta"
"#};

fn hello() -> Result<assert_fs::TempDir> {
    project(&[
        ("pyproject.toml", PYPROJECT_TOML),
        ("src/hello/__init__.py", "VERSION = (1, 4)\n"),
        ("src/hello/cli.py", "def main(): ...\n"),
        ("src/hello/schema.json", "{}"),
        ("README.md", "# Hello"),
        ("requirements.txt", "Requests >= 2\n"),
        ("LICENSE", "MIT"),
    ])
}

#[test]
fn text() -> Result<()> {
    let dir = hello()?;

    pyconf(&dir)
        .arg("show")
        .assert()
        .success()
        .stderr("")
        .stdout(indoc! {r#"
            name: hello
            version: 1.4
            readme: <7 characters> (text/markdown)
            license: MIT
            license-files:
              - LICENSE
            authors:
              - Ferris <ferris@example.com>
            dependencies:
              - requests>=2
            scripts:
              hello = hello.cli:main
            dynamic:
              - version
              - readme
              - dependencies

            layout: src-layout
            package-dir:
              "" = src
            packages:
              - hello
            include-package-data: true
            package-data:
              hello = *.json
            package-data-files:
              hello = schema.json

            build-system.requires:
              - setuptools>=77
            build-system.build-backend: setuptools.build_meta
        "#});
    Ok(())
}

#[test]
fn json() -> Result<()> {
    let dir = hello()?;

    let output = pyconf(&dir)
        .args(["show", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let configuration: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(configuration["metadata"]["version"], "1.4");
    assert_eq!(configuration["metadata"]["dependencies"][0], "requests>=2");
    assert_eq!(
        configuration["metadata"]["readme"]["content-type"],
        "text/markdown"
    );
    assert_eq!(configuration["options"]["layout"], "src");
    assert_eq!(configuration["options"]["package-dir"][""], "src");
    assert_eq!(
        configuration["options"]["package-data-files"]["hello"][0],
        "schema.json"
    );

    // The format can also be set through the environment.
    pyconf(&dir)
        .arg("show")
        .env("PYCONF_OUTPUT_FORMAT", "json")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\n"));
    Ok(())
}

#[test]
fn no_expand() -> Result<()> {
    let dir = hello()?;

    pyconf(&dir)
        .args(["show", "--no-expand"])
        .assert()
        .success()
        .stdout(predicate::str::contains("version:").not())
        .stdout(predicate::str::contains("layout:").not())
        .stdout(predicate::str::contains(indoc! {"
            dynamic:
              - version
              - readme
              - dependencies
        "}));

    pyconf(&dir)
        .arg("show")
        .env("PYCONF_NO_EXPAND", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("version:").not());
    Ok(())
}

#[test]
fn invalid() -> Result<()> {
    let dir = project(&[(
        "pyproject.toml",
        indoc! {r#"
            [project]
            name = "hello"
            version = "1.0"
            dynamic = ["version"]
        "#},
    )])?;

    pyconf(&dir)
        .arg("show")
        .assert()
        .code(2)
        .stdout("")
        .stderr(indoc! {"
            error: Invalid pyproject.toml
              Caused by: `project.version` is listed in `project.dynamic`, but also set statically
        "});
    Ok(())
}

#[test]
fn verbose() -> Result<()> {
    let dir = hello()?;

    pyconf(&dir)
        .args(["show", "--verbose"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Resolving dynamic `version`"));
    Ok(())
}
