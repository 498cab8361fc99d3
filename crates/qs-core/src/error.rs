use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLocation {
    pub file: String,
    pub line: usize,
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ScriptError {
    pub code: String,
    pub message: String,
    pub location: Option<ScriptLocation>,
}

impl ScriptError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn at(
        code: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            location: Some(ScriptLocation {
                file: file.into(),
                line,
            }),
        }
    }

    /// Attaches a location unless one is already present.
    pub fn with_location(mut self, file: impl Into<String>, line: usize) -> Self {
        if self.location.is_none() {
            self.location = Some(ScriptLocation {
                file: file.into(),
                line,
            });
        }
        self
    }
}
