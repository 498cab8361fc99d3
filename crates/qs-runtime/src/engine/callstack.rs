use std::rc::Rc;

use qs_core::{normalize_script_path, BelongObject, ScriptError, ScriptProgram};
use qs_parser::parse_script_lossy;
use tracing::{debug, info};

use super::ScriptEngine;
use crate::cache::resolve_candidates;

impl ScriptEngine {
    /// Starts `path`, or calls into it when a program is already active. The
    /// caller resumes on the line after its current one once `path` ends.
    pub fn run_script(
        &mut self,
        path: &str,
        belong_object: Option<BelongObject>,
    ) -> Result<(), ScriptError> {
        let candidates = {
            let world = self.world.borrow();
            resolve_candidates(path, self.state.current_file(), &world.current_map_path())
        };
        let loaded = self.cache.borrow_mut().load_first(&candidates);
        self.report_parse_errors();
        match loaded {
            Ok(program) => self.start_program(program, belong_object),
            Err(error) => Err(self.fail_start(error)),
        }
    }

    /// Like [`ScriptEngine::run_script`], for source text that is not on disk
    /// (console input, generated scripts). Unparseable lines are reported and
    /// skipped.
    pub fn run_script_content(
        &mut self,
        file_name: &str,
        content: &str,
        belong_object: Option<BelongObject>,
    ) -> Result<(), ScriptError> {
        let parsed = parse_script_lossy(&normalize_script_path(file_name), content);
        for error in parsed.errors {
            self.report(error);
        }
        self.start_program(Rc::new(parsed.program), belong_object)
    }

    fn start_program(
        &mut self,
        program: Rc<ScriptProgram>,
        belong_object: Option<BelongObject>,
    ) -> Result<(), ScriptError> {
        let depth = self.state.call_depth() + usize::from(self.state.current_program.is_some());
        if depth > self.options.max_call_depth {
            let error = ScriptError::new(
                "ENGINE_CALL_DEPTH",
                format!(
                    "Call depth limit {} reached; \"{}\" not started.",
                    self.options.max_call_depth, program.file_name
                ),
            );
            self.report(error.clone());
            return Err(error);
        }

        info!(
            script = program.file_name.as_str(),
            depth,
            lines = program.len(),
            "script started"
        );
        if belong_object.is_some() {
            self.state.belong_object = belong_object;
        }
        self.state.enter_program(program);
        self.notify_script_start();
        self.execute();
        Ok(())
    }

    /// A failed top-level start ends the chain; a failed nested start leaves
    /// the caller where it was.
    fn fail_start(&mut self, error: ScriptError) -> ScriptError {
        if self.state.current_program.is_none() {
            self.state.finish();
        } else {
            debug!(
                caller = self.state.current_file().unwrap_or_default(),
                "nested start failed, caller keeps running"
            );
        }
        self.report(error.clone());
        error
    }
}
