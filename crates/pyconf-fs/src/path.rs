use std::path::{Component, Path, PathBuf};

use path_slash::PathExt;

/// Rendering of paths in messages and output.
pub trait Simplified {
    /// The path without a Windows `\\?\` prefix or a leading `./`, for messages.
    fn user_display(&self) -> std::path::Display<'_>;

    /// The path with `/` separators on every platform, for `show` and `discover` output.
    fn portable_display(&self) -> String;
}

impl<T: AsRef<Path>> Simplified for T {
    fn user_display(&self) -> std::path::Display<'_> {
        let path = dunce::simplified(self.as_ref());
        path.strip_prefix(".").unwrap_or(path).display()
    }

    fn portable_display(&self) -> String {
        self.as_ref().to_slash_lossy().into_owned()
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` at the root (or at the start of a relative path) is dropped.
pub fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref()
        .components()
        .fold(PathBuf::new(), |mut normalized, component| {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                    normalized.push(component.as_os_str());
                }
            }
            normalized
        })
}

/// Returns `true` if `path`, interpreted relative to `root`, stays inside `root`.
///
/// The check is lexical: a relative path may not climb above `root` through `..` at any point,
/// and an absolute path must be below `root` after normalization.
pub fn is_inside(root: impl AsRef<Path>, path: impl AsRef<Path>) -> bool {
    let root = normalize_path(root);
    let path = path.as_ref();
    if path.is_absolute() || path.has_root() {
        return normalize_path(path).starts_with(&root);
    }

    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir => return false,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::Normal(_) => depth += 1,
        }
    }
    true
}
