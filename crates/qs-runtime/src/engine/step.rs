use std::rc::Rc;

use qs_core::{Instruction, ScriptError, ScriptProgram};
use tracing::{debug, trace};

use super::ScriptEngine;
use crate::registry::{CommandContext, Flow};

impl ScriptEngine {
    /// Runs instructions until the chain suspends, pauses, finishes, or hits
    /// the per-call step guard.
    pub fn execute(&mut self) {
        let mut steps = 0usize;
        while self.state.is_running {
            if self.state.is_paused || self.state.pending_wait.is_some() {
                return;
            }
            let Some(program) = self.state.current_program.clone() else {
                self.state.finish();
                return;
            };
            if self.state.current_line >= program.len() {
                self.unwind_finished_program();
                continue;
            }
            if steps >= self.options.max_steps_per_execute {
                let error = ScriptError::at(
                    "ENGINE_STEP_GUARD",
                    format!(
                        "Yielded after {} instructions without a wait.",
                        self.options.max_steps_per_execute
                    ),
                    &program.file_name,
                    program.instructions[self.state.current_line].source_line,
                );
                if self.has_pending_diagnostic("ENGINE_STEP_GUARD") {
                    trace!(
                        script = program.file_name.as_str(),
                        "step guard yield, diagnostic already pending"
                    );
                } else {
                    self.report(error);
                }
                return;
            }
            steps += 1;

            let line = self.state.current_line;
            let instruction = &program.instructions[line];
            if instruction.is_label {
                self.state.record_label_visit(&instruction.name);
                self.state.advance_line();
                continue;
            }

            self.notify_line_executed(&program.file_name, line);
            match self.dispatch(&program, instruction) {
                Flow::Continue => self.state.advance_line(),
                Flow::Jump => {}
                Flow::Suspend => {
                    if self.state.pending_wait.is_none() {
                        self.report(ScriptError::at(
                            "ENGINE_SUSPEND_WITHOUT_WAIT",
                            format!("\"{}\" suspended without a wait.", instruction.name),
                            &program.file_name,
                            instruction.source_line,
                        ));
                        self.state.advance_line();
                    } else {
                        trace!(
                            script = program.file_name.as_str(),
                            line,
                            "chain suspended"
                        );
                        return;
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, program: &Rc<ScriptProgram>, instruction: &Instruction) -> Flow {
        if let Err(error) = self.registry.validate(instruction) {
            self.report(error.with_location(&program.file_name, instruction.source_line));
            return Flow::Continue;
        }
        let Some(spec) = self.registry.get(&instruction.name).copied() else {
            return Flow::Continue;
        };

        debug!(
            script = program.file_name.as_str(),
            line = instruction.source_line,
            command = spec.name,
            "dispatch"
        );
        let depth_before = self.state.call_depth();
        let outcome = {
            let mut world = self.world.borrow_mut();
            let mut ctx = CommandContext {
                state: &mut self.state,
                world: &mut *world,
                cache: &self.cache,
                options: &self.options,
                rng_state: &mut self.rng_state,
                instruction,
            };
            (spec.handler)(&mut ctx)
        };
        self.report_parse_errors();

        match outcome {
            Ok(flow) => {
                if self.state.call_depth() > depth_before {
                    self.notify_script_start();
                }
                flow
            }
            Err(error) => {
                self.report(error.with_location(&program.file_name, instruction.source_line));
                Flow::Continue
            }
        }
    }

    pub(super) fn unwind_finished_program(&mut self) {
        let finished = self.state.current_file().unwrap_or_default().to_string();
        if self.state.return_to_caller() {
            debug!(
                script = finished.as_str(),
                resume = self.state.current_file().unwrap_or_default(),
                line = self.state.current_line,
                "returned to caller"
            );
        } else {
            debug!(script = finished.as_str(), "chain finished");
            self.state.finish();
        }
    }
}
