use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use qs_core::ScriptError;
use qs_runtime::{
    EngineOptions, MemoryScriptLoader, RecordingWorld, ScriptCache, ScriptDirector, SharedWorld,
    WaitReason,
};
use tracing::{debug, info};

use crate::{DiagnosticRecord, RunEvent, RunPlan, RunReport, RUN_REPORT_SCHEMA};

enum Boundary {
    Selection,
    Dialog,
    Frame,
}

fn pending_boundary(director: &ScriptDirector) -> Boundary {
    match director.pending_event_wait() {
        Some(WaitReason::Input {
            result_variable: Some(_),
        }) => Boundary::Selection,
        Some(WaitReason::Input {
            result_variable: None,
        })
        | Some(WaitReason::TalkQueue { .. }) => Boundary::Dialog,
        _ => Boundary::Frame,
    }
}

/// Drives a director frame by frame, answering UI boundaries on any chain
/// the way a player who never reads anything would: dialogs close at once
/// and selections take the next queued choice.
pub(crate) fn run_headless(
    scripts: BTreeMap<String, String>,
    variables: BTreeMap<String, i32>,
    options: EngineOptions,
    plan: RunPlan,
) -> Result<RunReport, ScriptError> {
    let mut recording = RecordingWorld::default();
    recording.variables = variables;
    let world = Rc::new(RefCell::new(recording));
    let shared: SharedWorld = world.clone();
    let cache = ScriptCache::new(MemoryScriptLoader::new(scripts)).into_shared();
    let mut director = ScriptDirector::new(shared, cache, options);
    let mut choices = plan.choices.iter().copied().collect::<VecDeque<_>>();

    info!(entry = plan.entry.as_str(), "headless run started");
    director.run_script(&plan.entry, None)?;

    let mut diagnostics = Vec::new();
    let mut frames = 0u32;
    let mut dialogs_closed = 0u32;
    let mut selections = Vec::new();
    let event = loop {
        diagnostics.extend(director.take_diagnostics());
        if !director.is_any_running() {
            break RunEvent::End;
        }
        if frames >= plan.max_frames {
            break RunEvent::MaxFrames;
        }
        frames += 1;

        match pending_boundary(&director) {
            Boundary::Selection => {
                let choice = choices.pop_front().unwrap_or(0);
                debug!(choice, "selection answered");
                director.on_selection_made(choice)?;
                selections.push(choice);
            }
            Boundary::Dialog => {
                director.on_dialog_closed()?;
                dialogs_closed += 1;
            }
            Boundary::Frame => director.update(plan.frame_ms),
        }
    };
    info!(frames, event = event.as_str(), "headless run stopped");

    let world = world.borrow();
    Ok(RunReport {
        schema_version: RUN_REPORT_SCHEMA.to_string(),
        entry: plan.entry,
        event,
        frames,
        dialogs_closed,
        selections,
        calls: world.calls.clone(),
        diagnostics: diagnostics.iter().map(DiagnosticRecord::from).collect(),
        variables: world.variables.clone(),
    })
}

pub(crate) fn emit_run_report(report: &RunReport, state_out: Option<&str>) {
    println!("RESULT:OK");
    println!("EVENT:{}", report.event.as_str());
    println!("FRAMES:{}", report.frames);

    for call in &report.calls {
        println!(
            "CALL_JSON:{}",
            serde_json::to_string(call).expect("string json")
        );
    }

    for diagnostic in &report.diagnostics {
        println!(
            "DIAGNOSTIC:{}|{}",
            diagnostic.code,
            serde_json::to_string(diagnostic).expect("diagnostic json")
        );
    }

    println!(
        "VARS_JSON:{}",
        serde_json::to_string(&report.variables).expect("variables json")
    );
    println!("STATE_OUT:{}", state_out.unwrap_or("NONE"));
}

#[cfg(test)]
mod boundary_runner_tests {
    use super::*;

    fn scripts(files: &[(&str, &str)]) -> BTreeMap<String, String> {
        files
            .iter()
            .map(|(path, source)| (path.to_string(), source.to_string()))
            .collect()
    }

    fn plan(choices: Vec<i32>, max_frames: u32) -> RunPlan {
        RunPlan {
            entry: "main.txt".to_string(),
            choices,
            max_frames,
            frame_ms: 16,
        }
    }

    #[test]
    fn dialogs_close_and_selections_follow_the_choice_queue() {
        let report = run_headless(
            scripts(&[
                (
                    "main.txt",
                    "Say(\"Welcome.\");\nChoose(\"Help?\", \"Yes\", \"No\", $answer);\nIf($answer == 0) @Yes;\nAssign($gold, 0);\nReturn();\n@Yes:\nAdd($gold, 10);",
                ),
            ]),
            BTreeMap::from([("gold".to_string(), 5)]),
            EngineOptions::default(),
            plan(vec![0], 50),
        )
        .expect("run should pass");

        assert_eq!(report.event, RunEvent::End);
        assert_eq!(report.dialogs_closed, 1);
        assert_eq!(report.selections, vec![0]);
        assert_eq!(report.variables.get("gold"), Some(&15));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn timers_are_ticked_by_frames_and_the_frame_cap_stops_endless_scripts() {
        let report = run_headless(
            scripts(&[("main.txt", "Sleep(40);\nAssign($slept, 1);")]),
            BTreeMap::new(),
            EngineOptions::default(),
            plan(Vec::new(), 50),
        )
        .expect("run should pass");
        assert_eq!(report.event, RunEvent::End);
        assert_eq!(report.variables.get("slept"), Some(&1));
        assert_eq!(report.frames, 3);

        let endless = run_headless(
            scripts(&[("main.txt", "@Loop:\nSleep(16);\nGoto(Loop);")]),
            BTreeMap::new(),
            EngineOptions::default(),
            plan(Vec::new(), 10),
        )
        .expect("run should pass");
        assert_eq!(endless.event, RunEvent::MaxFrames);
        assert_eq!(endless.frames, 10);
    }

    #[test]
    fn command_diagnostics_are_collected_without_stopping_the_run() {
        let report = run_headless(
            scripts(&[("main.txt", "Dance();\nAssign($after, 1);")]),
            BTreeMap::new(),
            EngineOptions::default(),
            plan(Vec::new(), 10),
        )
        .expect("run should pass");
        assert_eq!(report.event, RunEvent::End);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, "COMMAND_UNKNOWN");
        assert_eq!(report.diagnostics[0].line, Some(1));
        assert_eq!(report.variables.get("after"), Some(&1));
    }

    #[test]
    fn dialogs_held_by_an_npc_chain_count_as_a_boundary() {
        let world: SharedWorld = Rc::new(RefCell::new(RecordingWorld::default()));
        let cache = ScriptCache::new(MemoryScriptLoader::new(scripts(&[(
            "elder.txt",
            "Say(\"Elder: welcome.\", 7);\nAssign($met_elder, 1);",
        )])))
        .into_shared();
        let mut director = ScriptDirector::new(world, cache, EngineOptions::default());
        director
            .run_owned_script(qs_core::BelongObject::npc("Elder"), "elder.txt")
            .expect("run should pass");

        assert!(matches!(pending_boundary(&director), Boundary::Dialog));
        director.on_dialog_closed().expect("close should pass");
        assert!(matches!(pending_boundary(&director), Boundary::Frame));
    }

    #[test]
    fn missing_entry_script_is_an_error() {
        let error = run_headless(
            scripts(&[("other.txt", "Return();")]),
            BTreeMap::new(),
            EngineOptions::default(),
            plan(Vec::new(), 10),
        )
        .expect_err("missing entry should fail");
        assert_eq!(error.code, "CACHE_SCRIPT_NOT_FOUND");
    }
}
