use std::collections::BTreeMap;
use std::rc::Rc;

use qs_core::{BelongObject, Instruction, ScriptProgram, TalkLine};
use serde::Serialize;
use tracing::error;

use crate::wait::WaitReason;

#[derive(Debug, Clone)]
pub struct CallFrame {
    pub program: Rc<ScriptProgram>,
    pub return_line: usize,
}

/// The mutable state of one script chain.
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    pub current_program: Option<Rc<ScriptProgram>>,
    pub current_line: usize,
    pub is_running: bool,
    pub is_paused: bool,
    pub call_stack: Vec<CallFrame>,
    pub pending_wait: Option<WaitReason>,
    pub belong_object: Option<BelongObject>,
    pub label_visits: BTreeMap<String, u32>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hard reset of every field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_program
            .as_ref()
            .map(|program| program.file_name.as_str())
    }

    pub fn current_instruction(&self) -> Option<&Instruction> {
        self.current_program
            .as_ref()
            .and_then(|program| program.instructions.get(self.current_line))
    }

    pub fn is_at_end(&self) -> bool {
        match &self.current_program {
            Some(program) => self.current_line >= program.len(),
            None => true,
        }
    }

    pub fn advance_line(&mut self) {
        self.current_line += 1;
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Parks the chain on `reason`. A chain never holds two waits at once; a
    /// second request while one is active is a handler bug.
    pub fn begin_wait(&mut self, reason: WaitReason) {
        debug_assert!(
            self.pending_wait.is_none(),
            "wait \"{}\" requested while \"{}\" is active",
            reason.name(),
            self.pending_wait
                .as_ref()
                .map(WaitReason::name)
                .unwrap_or_default()
        );
        if let Some(active) = &self.pending_wait {
            error!(
                requested = reason.name(),
                active = active.name(),
                "wait requested while another wait is active"
            );
        }
        self.pending_wait = Some(reason);
    }

    pub fn clear_wait(&mut self) -> Option<WaitReason> {
        self.pending_wait.take()
    }

    /// Queued dialogue lines still to be shown for the active `Talk`.
    pub fn talk_queue(&self) -> Vec<TalkLine> {
        match &self.pending_wait {
            Some(WaitReason::TalkQueue { remaining }) => remaining.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn record_label_visit(&mut self, label: &str) {
        let file = self.current_file().unwrap_or_default().to_string();
        *self
            .label_visits
            .entry(format!("{}#{}", file, label))
            .or_insert(0) += 1;
    }

    pub fn label_visit_count(&self, file: &str, label: &str) -> u32 {
        self.label_visits
            .get(&format!("{}#{}", file, qs_core::normalize_label(label)))
            .copied()
            .unwrap_or(0)
    }

    /// Makes `program` current, saving the active program (line unincremented)
    /// as the return frame.
    pub fn enter_program(&mut self, program: Rc<ScriptProgram>) {
        if let Some(caller) = self.current_program.take() {
            self.call_stack.push(CallFrame {
                program: caller,
                return_line: self.current_line,
            });
        }
        self.current_program = Some(program);
        self.current_line = 0;
        self.pending_wait = None;
        self.is_running = true;
    }

    /// Restores the innermost caller and steps past its call site. Returns
    /// `false` when there is no caller left.
    pub fn return_to_caller(&mut self) -> bool {
        let Some(frame) = self.call_stack.pop() else {
            return false;
        };
        self.current_program = Some(frame.program);
        self.current_line = frame.return_line + 1;
        true
    }

    pub fn finish(&mut self) {
        self.is_running = false;
        self.current_program = None;
        self.current_line = 0;
        self.pending_wait = None;
        self.belong_object = None;
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            file: self.current_file().map(str::to_string),
            line: self.current_line,
            is_running: self.is_running,
            is_paused: self.is_paused,
            call_stack: self
                .call_stack
                .iter()
                .map(|frame| FrameSnapshot {
                    file: frame.program.file_name.clone(),
                    return_line: frame.return_line,
                })
                .collect(),
            pending_wait: self.pending_wait.clone(),
            belong_object: self.belong_object.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub file: String,
    pub return_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSnapshot {
    pub file: Option<String>,
    pub line: usize,
    pub is_running: bool,
    pub is_paused: bool,
    pub call_stack: Vec<FrameSnapshot>,
    pub pending_wait: Option<WaitReason>,
    pub belong_object: Option<BelongObject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(name: &str, lines: usize) -> Rc<ScriptProgram> {
        let instructions = (0..lines)
            .map(|index| {
                Instruction::command("Message", vec![index.to_string()], "", "", index + 1)
            })
            .collect();
        Rc::new(ScriptProgram::new(name, instructions))
    }

    #[test]
    fn enter_and_return_restore_the_line_after_the_call_site() {
        let mut state = ExecutionState::new();
        state.enter_program(program("a.txt", 5));
        state.current_line = 2;
        state.enter_program(program("b.txt", 1));
        assert_eq!(state.call_depth(), 1);
        assert_eq!(state.call_stack[0].return_line, 2);
        assert_eq!(state.current_file(), Some("b.txt"));

        assert!(state.return_to_caller());
        assert_eq!(state.current_file(), Some("a.txt"));
        assert_eq!(state.current_line, 3);
        assert!(!state.return_to_caller());
    }

    #[test]
    fn reset_clears_every_field() {
        let mut state = ExecutionState::new();
        state.enter_program(program("a.txt", 2));
        state.enter_program(program("b.txt", 2));
        state.is_paused = true;
        state.belong_object = Some(BelongObject::npc("Elder"));
        state.begin_wait(WaitReason::FadeIn);
        state.record_label_visit("@loop:");

        state.reset();
        assert!(state.current_program.is_none());
        assert_eq!(state.current_line, 0);
        assert!(!state.is_running);
        assert!(!state.is_paused);
        assert!(state.call_stack.is_empty());
        assert!(state.pending_wait.is_none());
        assert!(state.belong_object.is_none());
        assert!(state.label_visits.is_empty());
    }

    #[test]
    fn talk_queue_reads_from_the_active_wait() {
        let mut state = ExecutionState::new();
        assert!(state.talk_queue().is_empty());
        state.begin_wait(WaitReason::TalkQueue {
            remaining: vec![TalkLine {
                text: "second".to_string(),
                portrait_index: 2,
            }]
            .into(),
        });
        assert_eq!(state.talk_queue().len(), 1);
        assert!(state.clear_wait().is_some());
        assert!(state.talk_queue().is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "requested while")]
    fn begin_wait_rejects_a_second_wait_in_debug_builds() {
        let mut state = ExecutionState::new();
        state.begin_wait(WaitReason::FadeIn);
        state.begin_wait(WaitReason::FadeOut);
    }

    #[test]
    fn snapshot_serializes_wait_and_frames() {
        let mut state = ExecutionState::new();
        state.enter_program(program("a.txt", 3));
        state.enter_program(program("b.txt", 3));
        state.begin_wait(WaitReason::Timer { remaining_ms: 250 });

        let snapshot = state.snapshot();
        assert_eq!(snapshot.file.as_deref(), Some("b.txt"));
        assert_eq!(snapshot.call_stack.len(), 1);
        let json = serde_json::to_value(&snapshot).expect("snapshot should serialize");
        assert_eq!(json["pendingWait"]["kind"], "timer");
        assert_eq!(json["callStack"][0]["file"], "a.txt");
    }
}
