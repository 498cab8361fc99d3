use std::rc::Rc;

use qs_core::ScriptError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::SharedScriptCache;
use crate::registry::CommandRegistry;
use crate::state::{ChainSnapshot, ExecutionState};
use crate::world::{DebugHooks, SharedWorld};

mod boundary;
mod callstack;
pub(crate) mod rng;
mod step;
mod update;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;
pub const DEFAULT_MAX_STEPS_PER_EXECUTE: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Deepest `RunScript` nesting allowed before a call is refused.
    pub max_call_depth: usize,
    /// Instructions dispatched per `execute` re-entry before yielding.
    pub max_steps_per_execute: usize,
    pub random_seed: Option<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_steps_per_execute: DEFAULT_MAX_STEPS_PER_EXECUTE,
            random_seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChainStatus {
    Idle,
    Running,
    Paused,
    Suspended,
}

/// Runs one script chain: a current program plus the callers parked on its
/// call stack.
pub struct ScriptEngine {
    world: SharedWorld,
    cache: SharedScriptCache,
    registry: Rc<CommandRegistry>,
    options: EngineOptions,
    debug_hooks: Option<Box<dyn DebugHooks>>,
    rng_state: u32,
    state: ExecutionState,
    diagnostics: Vec<ScriptError>,
}

impl ScriptEngine {
    pub fn new(world: SharedWorld, cache: SharedScriptCache, options: EngineOptions) -> Self {
        Self::with_registry(
            world,
            cache,
            Rc::new(CommandRegistry::with_builtins()),
            options,
        )
    }

    pub fn with_registry(
        world: SharedWorld,
        cache: SharedScriptCache,
        registry: Rc<CommandRegistry>,
        options: EngineOptions,
    ) -> Self {
        let rng_state = options.random_seed.unwrap_or(1);
        Self {
            world,
            cache,
            registry,
            options,
            debug_hooks: None,
            rng_state,
            state: ExecutionState::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn set_world(&mut self, world: SharedWorld) {
        self.world = world;
    }

    pub fn set_debug_hooks(&mut self, hooks: Option<Box<dyn DebugHooks>>) {
        self.debug_hooks = hooks;
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn cache(&self) -> &SharedScriptCache {
        &self.cache
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn status(&self) -> ChainStatus {
        if !self.state.is_running {
            ChainStatus::Idle
        } else if self.state.is_paused {
            ChainStatus::Paused
        } else if self.state.pending_wait.is_some() {
            ChainStatus::Suspended
        } else {
            ChainStatus::Running
        }
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        self.state.snapshot()
    }

    pub fn diagnostics(&self) -> &[ScriptError] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<ScriptError> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Drops the whole chain, including any wait, so nothing resumes into
    /// state that a save load replaced.
    pub fn stop_all_scripts(&mut self) {
        self.state.reset();
    }

    fn report(&mut self, error: ScriptError) {
        match &error.location {
            Some(location) => warn!(at = %location, "{}", error),
            None => warn!("{}", error),
        }
        self.diagnostics.push(error);
    }

    /// Reports lines the cache skipped while parsing a script this chain
    /// just loaded.
    fn report_parse_errors(&mut self) {
        let errors = self.cache.borrow_mut().take_parse_errors();
        for error in errors {
            self.report(error);
        }
    }

    fn has_pending_diagnostic(&self, code: &str) -> bool {
        self.diagnostics.iter().any(|error| error.code == code)
    }

    fn notify_script_start(&mut self) {
        let Some(hooks) = self.debug_hooks.as_mut() else {
            return;
        };
        if let Some(program) = &self.state.current_program {
            hooks.on_script_start(&program.file_name, program.len(), &program.literals());
        }
    }

    fn notify_line_executed(&mut self, file: &str, line: usize) {
        if let Some(hooks) = self.debug_hooks.as_mut() {
            hooks.on_line_executed(file, line);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::cache::{MemoryScriptLoader, ScriptCache};
    use crate::recording::RecordingWorld;

    pub(crate) struct Harness {
        pub(crate) world: Rc<RefCell<RecordingWorld>>,
        pub(crate) engine: ScriptEngine,
    }

    impl Harness {
        pub(crate) fn calls(&self) -> Vec<String> {
            self.world.borrow().calls.clone()
        }

        pub(crate) fn var(&self, name: &str) -> i32 {
            self.world.borrow().variables.get(name).copied().unwrap_or(0)
        }

        pub(crate) fn set_var(&self, name: &str, value: i32) {
            self.world
                .borrow_mut()
                .variables
                .insert(name.to_string(), value);
        }

        pub(crate) fn diagnostic_codes(&self) -> Vec<String> {
            self.engine
                .diagnostics()
                .iter()
                .map(|error| error.code.clone())
                .collect()
        }
    }

    pub(crate) fn harness(files: &[(&str, &str)]) -> Harness {
        harness_with(files, RecordingWorld::default(), EngineOptions::default())
    }

    pub(crate) fn harness_with(
        files: &[(&str, &str)],
        world: RecordingWorld,
        options: EngineOptions,
    ) -> Harness {
        let world = Rc::new(RefCell::new(world));
        let cache = ScriptCache::new(MemoryScriptLoader::new(files.iter().copied())).into_shared();
        let shared: SharedWorld = world.clone();
        Harness {
            world,
            engine: ScriptEngine::new(shared, cache, options),
        }
    }
}
