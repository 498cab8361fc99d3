use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use qs_core::ScriptError;

use crate::{map_vars_invalid, CliStage, RunReport};

pub(crate) fn save_run_report(path: &Path, report: &RunReport) -> Result<(), ScriptError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(CliStage::StateWrite.at(parent))?;

    let payload = serde_json::to_string_pretty(report).expect("run report should serialize");
    fs::write(path, payload).map_err(CliStage::StateWrite.at(path))
}

/// Reads a `{"name": 1}` object of starting variables.
pub(crate) fn load_variables(path: &Path) -> Result<BTreeMap<String, i32>, ScriptError> {
    if !path.exists() {
        return Err(ScriptError::new(
            "CLI_VARS_NOT_FOUND",
            format!("Variables file does not exist: {}", path.display()),
        ));
    }
    let raw = fs::read_to_string(path).map_err(CliStage::VarsRead.at(path))?;
    serde_json::from_str(&raw).map_err(|error| map_vars_invalid(path, error))
}

#[cfg(test)]
mod state_store_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::{RunEvent, RUN_REPORT_SCHEMA};

    #[test]
    fn save_run_report_writes_camel_case_json() {
        let path = temp_path("nested").join("report.json");
        let report = RunReport {
            schema_version: RUN_REPORT_SCHEMA.to_string(),
            entry: "main.txt".to_string(),
            event: RunEvent::MaxFrames,
            frames: 600,
            dialogs_closed: 2,
            selections: vec![1],
            calls: vec!["say 0 hi".to_string()],
            diagnostics: Vec::new(),
            variables: BTreeMap::from([("gold".to_string(), 5)]),
        };
        save_run_report(&path, &report).expect("save should pass");

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read report"))
                .expect("report json should parse");
        assert_eq!(saved["schemaVersion"], RUN_REPORT_SCHEMA);
        assert_eq!(saved["event"], "max_frames");
        assert_eq!(saved["dialogsClosed"], 2);
        assert_eq!(saved["variables"]["gold"], 5);

        let error = save_run_report(Path::new("/"), &report).expect_err("writing root should fail");
        assert_eq!(error.code, "CLI_STATE_WRITE");
        assert!(error.message.starts_with("/: "));
    }

    #[test]
    fn load_variables_reads_integers_and_rejects_other_shapes() {
        let good = temp_path("vars.json");
        write_file(&good, r#"{"gold": 30, "chapter": 2}"#);
        let vars = load_variables(&good).expect("load should pass");
        assert_eq!(vars.get("gold"), Some(&30));
        assert_eq!(vars.get("chapter"), Some(&2));

        let bad = temp_path("bad-vars.json");
        write_file(&bad, r#"{"gold": "lots"}"#);
        let error = load_variables(&bad).expect_err("string value should fail");
        assert_eq!(error.code, "CLI_VARS_INVALID");
        assert!(error.message.contains("bad-vars.json"));

        let missing = temp_path("missing-vars.json");
        let error = load_variables(&missing).expect_err("missing file should fail");
        assert_eq!(error.code, "CLI_VARS_NOT_FOUND");
    }
}
