use std::collections::BTreeMap;

use qs_parser::parse_script_lossy;
use qs_runtime::CommandRegistry;
use tracing::debug;

use crate::{CheckReport, DiagnosticRecord};

/// Parses every script and validates each command's name and arity without
/// running anything.
pub(crate) fn check_scripts(
    scripts: &BTreeMap<String, String>,
    registry: &CommandRegistry,
) -> CheckReport {
    let mut diagnostics = Vec::new();
    let mut instructions = 0;

    for (path, source) in scripts {
        let parsed = parse_script_lossy(path, source);
        diagnostics.extend(parsed.errors.iter().map(DiagnosticRecord::from));
        for instruction in &parsed.program.instructions {
            instructions += 1;
            if let Err(error) = registry.validate(instruction) {
                let error = error.with_location(path.as_str(), instruction.source_line);
                diagnostics.push(DiagnosticRecord::from(&error));
            }
        }
        debug!(file = path.as_str(), "script checked");
    }

    CheckReport {
        files: scripts.len(),
        instructions,
        diagnostics,
    }
}

pub(crate) fn emit_check_report(report: &CheckReport) -> i32 {
    println!(
        "RESULT:{}",
        if report.is_clean() { "OK" } else { "INVALID" }
    );
    println!("FILES:{}", report.files);
    println!("INSTRUCTIONS:{}", report.instructions);
    for diagnostic in &report.diagnostics {
        println!(
            "DIAGNOSTIC:{}|{}",
            diagnostic.code,
            serde_json::to_string(diagnostic).expect("diagnostic json")
        );
    }
    if report.is_clean() {
        0
    } else {
        1
    }
}
