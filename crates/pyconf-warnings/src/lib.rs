//! Warnings and error chains as shown on stderr.
//!
//! Warnings are silent until [`enable`] is called, so that library callers and `--quiet` don't
//! print anything.

use std::error::Error;
use std::fmt;
use std::iter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};

use owo_colors::{AnsiColors, OwoColorize};
use rustc_hash::FxHashSet;

/// Whether user-facing warnings are enabled.
pub static ENABLED: AtomicBool = AtomicBool::new(false);

/// Messages that were already shown by [`warn_user_once!`].
static SHOWN: LazyLock<Mutex<FxHashSet<String>>> = LazyLock::new(Mutex::default);

/// Enable user-facing warnings.
pub fn enable() {
    ENABLED.store(true, Ordering::Relaxed);
}

fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Print a warning unless the same message was printed before.
#[macro_export]
macro_rules! warn_user_once {
    ($($arg:tt)*) => {
        $crate::warn_once(format!($($arg)*))
    };
}

#[doc(hidden)]
pub fn warn_once(message: String) {
    if !enabled() {
        return;
    }
    let Ok(mut shown) = SHOWN.lock() else {
        return;
    };
    if shown.contains(&message) {
        return;
    }
    anstream::eprintln!(
        "{}{} {}",
        Level::Warning.label(),
        ":".bold(),
        message.bold()
    );
    shown.insert(message);
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Warning,
    Error,
}

impl Level {
    fn color(self) -> AnsiColors {
        match self {
            Self::Warning => AnsiColors::Yellow,
            Self::Error => AnsiColors::Red,
        }
    }

    fn label(self) -> String {
        let label = match self {
            Self::Warning => "warning",
            Self::Error => "error",
        };
        label.color(self.color()).bold().to_string()
    }
}

/// Write an error followed by one `Caused by:` line per source.
///
/// Continuation lines of a multi-line cause are kept as-is.
fn write_chain(level: Level, err: &dyn Error, mut w: impl fmt::Write) -> fmt::Result {
    writeln!(w, "{}{} {}", level.label(), ":".bold(), err.to_string().trim())?;
    for cause in iter::successors(err.source(), |&cause| cause.source()) {
        let message = cause.to_string();
        let mut lines = message.lines();
        let Some(first) = lines.next() else {
            continue;
        };
        writeln!(
            w,
            "  {}: {}",
            "Caused by".color(level.color()).bold(),
            first.trim()
        )?;
        for line in lines.map(str::trim_end) {
            writeln!(w, "{line}")?;
        }
    }
    Ok(())
}

/// Write an error chain, e.g.:
///
/// ```text
/// error: Failed to resolve dynamic `project.version`
///   Caused by: Module `hello.about` not found in `src`
/// ```
pub fn write_error_chain(err: &dyn Error, w: impl fmt::Write) -> fmt::Result {
    write_chain(Level::Error, err, w)
}

/// Show an error chain as a warning, if warnings are enabled.
pub fn warn_user_chain(err: &dyn Error) {
    if !enabled() {
        return;
    }
    let mut output = String::new();
    if write_chain(Level::Warning, err, &mut output).is_ok() {
        anstream::eprint!("{output}");
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("Permission denied\n(os error 13)")]
    struct Inner;

    #[derive(Debug, thiserror::Error)]
    #[error("Failed to read `README.md`")]
    struct Outer {
        #[source]
        source: Inner,
    }

    fn plain(level: Level, err: &dyn Error) -> String {
        let mut output = String::new();
        write_chain(level, err, &mut output).unwrap();
        anstream::adapter::strip_str(&output).to_string()
    }

    #[test]
    fn error_chain() {
        assert_snapshot!(plain(Level::Error, &Outer { source: Inner }), @r"
        error: Failed to read `README.md`
          Caused by: Permission denied
        (os error 13)
        ");
    }

    #[test]
    fn warning_without_cause() {
        assert_snapshot!(plain(Level::Warning, &Inner), @r"
        warning: Permission denied
        (os error 13)
        ");
    }
}
