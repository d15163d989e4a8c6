//! this is the single integration test, as documented by matklad
//! in <https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html>

use anyhow::Result;
use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;

use pyconf_static::EnvVars;

mod check;
mod discover;
mod show;

/// A `pyconf` command running in `dir`, isolated from the environment of the test runner.
pub(crate) fn pyconf(dir: &TempDir) -> Command {
    let mut command = Command::cargo_bin("pyconf").expect("the `pyconf` binary is built");
    command
        .current_dir(dir.path())
        .env(EnvVars::NO_COLOR, "1")
        .env_remove(EnvVars::PYCONF_PROJECT)
        .env_remove(EnvVars::PYCONF_NO_EXPAND)
        .env_remove(EnvVars::PYCONF_IGNORE_OPTION_ERRORS)
        .env_remove(EnvVars::PYCONF_OUTPUT_FORMAT)
        .env_remove(EnvVars::RUST_LOG);
    command
}

/// Create a project from `(path, contents)` pairs.
pub(crate) fn project(files: &[(&str, &str)]) -> Result<TempDir> {
    let dir = TempDir::new()?;
    for (path, contents) in files {
        dir.child(path).write_str(contents)?;
    }
    Ok(dir)
}
