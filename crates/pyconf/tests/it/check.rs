use anyhow::Result;
use indoc::indoc;
use predicates::prelude::*;

use crate::{project, pyconf};

const SRC_LAYOUT: &str = indoc! {r#"
    [project]
    name = "Hello_World"
    dynamic = ["version"]

    [tool.setuptools.dynamic]
    version = { attr = "hello_world.__version__" }

    [build-system]
    requires = ["setuptools>=77"]
    build-backend = "setuptools.build_meta"
"#};

#[test]
fn valid() -> Result<()> {
    let dir = project(&[
        ("pyproject.toml", SRC_LAYOUT),
        ("src/hello_world/__init__.py", "__version__ = \"1.2.0\"\n"),
    ])?;

    pyconf(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout("hello-world 1.2.0: valid\n")
        .stderr("");
    Ok(())
}

#[test]
fn project_argument() -> Result<()> {
    let dir = project(&[
        ("nested/pyproject.toml", SRC_LAYOUT),
        ("nested/src/hello_world/__init__.py", "__version__ = '2.0'\n"),
    ])?;

    pyconf(&dir)
        .args(["check", "--project", "nested"])
        .assert()
        .success()
        .stdout("hello-world 2.0: valid\n");

    pyconf(&dir)
        .args(["check", "--project", "nested/pyproject.toml"])
        .assert()
        .success()
        .stdout("hello-world 2.0: valid\n");

    pyconf(&dir)
        .arg("check")
        .env("PYCONF_PROJECT", "nested")
        .assert()
        .success()
        .stdout("hello-world 2.0: valid\n");
    Ok(())
}

#[test]
fn invalid() -> Result<()> {
    let dir = project(&[(
        "pyproject.toml",
        indoc! {r#"
            [project]
            name = "hello"
            dynamic = ["name", "version"]
        "#},
    )])?;

    pyconf(&dir)
        .arg("check")
        .assert()
        .code(1)
        .stdout("")
        .stderr(indoc! {"
            error: Invalid pyproject.toml
              Caused by: `name` can't be listed in `project.dynamic`
        "});
    Ok(())
}

#[test]
fn missing_pyproject_toml() -> Result<()> {
    let dir = project(&[])?;

    pyconf(&dir)
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with(
            "error: Failed to read `pyproject.toml`\n  Caused by: ",
        ));
    Ok(())
}

#[test]
fn unresolved_version() -> Result<()> {
    let dir = project(&[
        ("pyproject.toml", SRC_LAYOUT),
        ("src/hello_world/__init__.py", "__version__ = read_version()\n"),
    ])?;

    pyconf(&dir)
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with(
            "error: Failed to resolve dynamic `project.version`\n",
        ))
        .stderr(predicate::str::contains(
            "Caused by: line 1: Expected a literal value, found name `read_version`",
        ));

    // Without expansion, only the static configuration is checked.
    pyconf(&dir)
        .args(["check", "--no-expand"])
        .assert()
        .success()
        .stdout("hello-world: valid\n");

    pyconf(&dir)
        .args(["check", "--ignore-option-errors"])
        .assert()
        .success()
        .stdout("hello-world: valid\n")
        .stderr(predicate::str::starts_with(
            "warning: Failed to resolve dynamic `project.version`\n",
        ));
    Ok(())
}

#[test]
fn warnings() -> Result<()> {
    let dir = project(&[
        (
            "pyproject.toml",
            indoc! {r#"
                [project]
                name = "hello"
                version = "1.0"

                [tool.setuptools]
                py-modules = ["hello"]
                obsoletes = ["greeting"]
            "#},
        ),
        ("hello.py", ""),
    ])?;

    pyconf(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout("hello 1.0: valid\n")
        .stderr(
            "warning: `tool.setuptools.obsoletes` is deprecated, it is not supported by any packaging tool\n",
        );

    pyconf(&dir)
        .args(["check", "--quiet"])
        .assert()
        .success()
        .stdout("")
        .stderr("");
    Ok(())
}
