use qs_core::ScriptError;
use tracing::debug;

use super::ScriptEngine;
use crate::wait::WaitReason;

impl ScriptEngine {
    /// The host closed the dialog box. Shows the next queued `Talk` line, or
    /// resumes the chain when nothing is left to show.
    pub fn on_dialog_closed(&mut self) -> Result<(), ScriptError> {
        match self.state.pending_wait.as_mut() {
            Some(WaitReason::TalkQueue { remaining }) => {
                if let Some(line) = remaining.pop_front() {
                    self.world
                        .borrow_mut()
                        .show_dialog(&line.text, line.portrait_index);
                    return Ok(());
                }
            }
            Some(WaitReason::Input {
                result_variable: None,
            }) => {}
            _ => {
                return Err(ScriptError::new(
                    "ENGINE_NO_PENDING_DIALOG",
                    "No dialog is waiting to be closed.",
                ))
            }
        }
        self.resume_after_wait();
        Ok(())
    }

    /// The host picked option `index` of the active selection.
    pub fn on_selection_made(&mut self, index: i32) -> Result<(), ScriptError> {
        let Some(WaitReason::Input {
            result_variable: Some(variable),
        }) = self.state.pending_wait.as_ref()
        else {
            return Err(ScriptError::new(
                "ENGINE_NO_PENDING_SELECTION",
                "No selection is waiting for a choice.",
            ));
        };
        let variable = variable.clone();
        self.world.borrow_mut().set_variable(&variable, index);
        debug!(variable = variable.as_str(), index, "selection made");
        self.resume_after_wait();
        Ok(())
    }

    pub(super) fn resume_after_wait(&mut self) {
        if let Some(wait) = self.state.clear_wait() {
            debug!(wait = wait.name(), "wait cleared");
        }
        self.state.advance_line();
        self.execute();
    }
}
