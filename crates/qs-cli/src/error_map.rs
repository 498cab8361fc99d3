use std::fmt::Display;
use std::path::Path;

use qs_core::ScriptError;

/// The I/O step a CLI failure happened in. Each step owns one error code,
/// and every message names the path that step was touching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CliStage {
    SourcePath,
    SourceScan,
    SourceRead,
    StateWrite,
    VarsRead,
    VarsInvalid,
}

impl CliStage {
    pub(crate) fn code(self) -> &'static str {
        match self {
            CliStage::SourcePath => "CLI_SOURCE_PATH",
            CliStage::SourceScan => "CLI_SOURCE_SCAN",
            CliStage::SourceRead => "CLI_SOURCE_READ",
            CliStage::StateWrite => "CLI_STATE_WRITE",
            CliStage::VarsRead => "CLI_VARS_READ",
            CliStage::VarsInvalid => "CLI_VARS_INVALID",
        }
    }

    /// Wraps `error` with this stage's code and the offending path.
    pub(crate) fn fail(self, path: &Path, error: impl Display) -> ScriptError {
        ScriptError::new(self.code(), format!("{}: {}", path.display(), error))
    }

    /// Builds a `map_err` adapter bound to `path`.
    pub(crate) fn at<E: Display>(self, path: &Path) -> impl FnOnce(E) -> ScriptError + '_ {
        move |error| self.fail(path, error)
    }
}

/// Directory walk failures name the entry that broke the walk, which may sit
/// deep below the scripts root.
pub(crate) fn map_walk_error(root: &Path, error: walkdir::Error) -> ScriptError {
    let path = error.path().unwrap_or(root).to_path_buf();
    match error.io_error() {
        Some(io) => CliStage::SourceScan.fail(&path, io),
        None => CliStage::SourceScan.fail(&path, &error),
    }
}

/// `--vars` parse failures carry the JSON position as a location, so the
/// report points at the line and column that broke.
pub(crate) fn map_vars_invalid(path: &Path, error: serde_json::Error) -> ScriptError {
    let line = error.line();
    let column = error.column();
    let mut mapped = CliStage::VarsInvalid.fail(path, format!("column {}: {}", column, error));
    if line > 0 {
        mapped = mapped.with_location(path.to_string_lossy().as_ref(), line);
    }
    mapped
}

/// The protocol lines for a fatal error, in print order.
pub(crate) fn error_lines(error: &ScriptError) -> Vec<String> {
    let mut lines = vec![
        "RESULT:ERROR".to_string(),
        format!("ERROR_CODE:{}", error.code),
        format!(
            "ERROR_MSG_JSON:{}",
            serde_json::to_string(&error.message).expect("string json")
        ),
    ];
    if let Some(location) = &error.location {
        lines.push(format!("ERROR_AT:{}", location));
    }
    lines
}

/// Prints the error and returns the process exit status.
pub(crate) fn emit_error(error: ScriptError) -> i32 {
    for line in error_lines(&error) {
        println!("{}", line);
    }
    1
}
