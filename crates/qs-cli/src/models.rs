use std::collections::BTreeMap;

use qs_core::ScriptError;
use serde::{Deserialize, Serialize};

pub(crate) const RUN_REPORT_SCHEMA: &str = "qs-run-report.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RunEvent {
    End,
    MaxFrames,
}

impl RunEvent {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::End => "END",
            Self::MaxFrames => "MAX_FRAMES",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DiagnosticRecord {
    pub(crate) code: String,
    pub(crate) message: String,
    pub(crate) file: Option<String>,
    pub(crate) line: Option<usize>,
}

impl From<&ScriptError> for DiagnosticRecord {
    fn from(error: &ScriptError) -> Self {
        Self {
            code: error.code.clone(),
            message: error.message.clone(),
            file: error.location.as_ref().map(|location| location.file.clone()),
            line: error.location.as_ref().map(|location| location.line),
        }
    }
}

/// What a headless run left behind, written to `--state-out` as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunReport {
    pub(crate) schema_version: String,
    pub(crate) entry: String,
    pub(crate) event: RunEvent,
    pub(crate) frames: u32,
    pub(crate) dialogs_closed: u32,
    pub(crate) selections: Vec<i32>,
    pub(crate) calls: Vec<String>,
    pub(crate) diagnostics: Vec<DiagnosticRecord>,
    pub(crate) variables: BTreeMap<String, i32>,
}

/// Inputs for one headless run, already resolved from the command line.
#[derive(Debug, Clone)]
pub(crate) struct RunPlan {
    pub(crate) entry: String,
    pub(crate) choices: Vec<i32>,
    pub(crate) max_frames: u32,
    pub(crate) frame_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CheckReport {
    pub(crate) files: usize,
    pub(crate) instructions: usize,
    pub(crate) diagnostics: Vec<DiagnosticRecord>,
}

impl CheckReport {
    pub(crate) fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
