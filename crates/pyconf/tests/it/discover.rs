use anyhow::Result;
use indoc::indoc;
use predicates::prelude::*;

use crate::{project, pyconf};

const PYPROJECT_TOML: &str = indoc! {r#"
    [project]
    name = "hello"
    version = "1.0"
"#};

#[test]
fn flat_layout() -> Result<()> {
    let dir = project(&[
        ("pyproject.toml", PYPROJECT_TOML),
        ("hello/__init__.py", ""),
        ("hello/greeting/__init__.py", ""),
        ("tests/test_hello.py", ""),
        ("setup.py", ""),
    ])?;

    pyconf(&dir)
        .arg("discover")
        .assert()
        .success()
        .stderr("")
        .stdout(indoc! {"
            layout: flat-layout
            packages:
              - hello
              - hello.greeting
        "});
    Ok(())
}

#[test]
fn single_module() -> Result<()> {
    let dir = project(&[("pyproject.toml", PYPROJECT_TOML), ("hello.py", "")])?;

    let output = pyconf(&dir)
        .args(["discover", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let discovered: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(
        discovered,
        serde_json::json!({
            "layout": "flat",
            "package-dir": {},
            "packages": [],
            "py-modules": ["hello"],
        })
    );
    Ok(())
}

#[test]
fn find_directive() -> Result<()> {
    let dir = project(&[
        (
            "pyproject.toml",
            indoc! {r#"
                [project]
                name = "hello"
                version = "1.0"

                [tool.setuptools.packages.find]
                where = ["lib"]
                include = ["hello*"]
            "#},
        ),
        ("lib/hello/__init__.py", ""),
        ("lib/hello_tools/__init__.py", ""),
        ("lib/other/__init__.py", ""),
    ])?;

    pyconf(&dir)
        .arg("discover")
        .assert()
        .success()
        .stdout(indoc! {r#"
            layout: find
            package-dir:
              "" = lib
            packages:
              - hello
              - hello_tools
        "#});
    Ok(())
}

#[test]
fn multiple_top_level_packages() -> Result<()> {
    let dir = project(&[
        ("pyproject.toml", PYPROJECT_TOML),
        ("hello/__init__.py", ""),
        ("world/__init__.py", ""),
    ])?;

    pyconf(&dir)
        .arg("discover")
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with(indoc! {"
            error: Failed to discover the packages of the project
              Caused by: Multiple top-level packages discovered in a flat-layout: `hello`, `world`.
        "}.trim_end()));

    pyconf(&dir)
        .args(["discover", "--ignore-option-errors"])
        .assert()
        .success()
        .stdout(indoc! {"
            layout: unknown
            No packages or modules found
        "})
        .stderr(predicate::str::starts_with(
            "warning: Failed to discover the packages of the project\n",
        ));
    Ok(())
}
