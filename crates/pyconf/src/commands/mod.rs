use std::path::{Path, PathBuf};
use std::process::ExitCode;

pub(crate) use check::check;
pub(crate) use discover::discover;
pub(crate) use show::show;

mod check;
mod discover;
mod show;

#[derive(Copy, Clone)]
pub(crate) enum ExitStatus {
    /// The command succeeded.
    Success,

    /// The command failed due to an error in the user input.
    Failure,

    /// The command failed with an unexpected error.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}

/// The `pyproject.toml` of a project: `--project` if it's a file, otherwise the file in the
/// project directory, defaulting to the current directory.
fn pyproject_toml(project: Option<&Path>) -> PathBuf {
    match project {
        Some(path) if path.is_file() => path.to_path_buf(),
        Some(directory) => directory.join("pyproject.toml"),
        None => PathBuf::from("pyproject.toml"),
    }
}
