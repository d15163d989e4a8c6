/// Declares all environment variable used throughout `pyconf` and its crates.
pub struct EnvVars;

impl EnvVars {
    /// Equivalent to the `--project` command-line argument. The directory containing the
    /// `pyproject.toml` to load.
    pub const PYCONF_PROJECT: &'static str = "PYCONF_PROJECT";

    /// Equivalent to the `--no-expand` command-line argument. If set, dynamic fields and package
    /// discovery are left unresolved.
    pub const PYCONF_NO_EXPAND: &'static str = "PYCONF_NO_EXPAND";

    /// Equivalent to the `--ignore-option-errors` command-line argument. If set, directives that
    /// fail to resolve are reported as warnings instead of errors.
    pub const PYCONF_IGNORE_OPTION_ERRORS: &'static str = "PYCONF_IGNORE_OPTION_ERRORS";

    /// Equivalent to the `--format` command-line argument.
    pub const PYCONF_OUTPUT_FORMAT: &'static str = "PYCONF_OUTPUT_FORMAT";

    /// Disables colored output (takes precedence over `FORCE_COLOR`).
    ///
    /// See [no-color.org](https://no-color.org).
    pub const NO_COLOR: &'static str = "NO_COLOR";

    /// If set, `pyconf` will use this value as the log level for its `--verbose` output. Accepts
    /// any filter compatible with the `tracing_subscriber` crate.
    ///
    /// For example:
    ///
    /// * `RUST_LOG=pyconf=debug` is the equivalent of adding `--verbose` to the command line
    /// * `RUST_LOG=trace` will enable trace-level logging.
    ///
    /// See the [tracing documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#example-syntax)
    /// for more.
    pub const RUST_LOG: &'static str = "RUST_LOG";
}
