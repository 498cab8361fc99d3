use std::collections::HashMap;
use std::fmt;

use qs_core::{Instruction, ScriptError};

use crate::cache::SharedScriptCache;
use crate::engine::EngineOptions;
use crate::resolver::{resolve_int, substitute, variable_name};
use crate::state::ExecutionState;
use crate::wait::WaitReason;
use crate::world::World;

/// What the engine does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advance to the next line and keep going.
    Continue,
    /// A wait reason was set; park until it clears.
    Suspend,
    /// The handler already placed `current_line`; keep going from there.
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(count: usize) -> Self {
        Self {
            min: count,
            max: Some(count),
        }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", self.min),
            Some(max) => write!(f, "{}..={}", self.min, max),
            None => write!(f, "{} or more", self.min),
        }
    }
}

pub type CommandHandler = fn(&mut CommandContext<'_>) -> Result<Flow, ScriptError>;

#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub arity: Arity,
    pub handler: CommandHandler,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Case-insensitive command name table.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::commands::register_builtins(&mut registry);
        registry
    }

    /// Registers `handler` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &'static str, arity: Arity, handler: CommandHandler) {
        self.commands.insert(
            name.to_lowercase(),
            CommandSpec {
                name,
                arity,
                handler,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names = self
            .commands
            .values()
            .map(|spec| spec.name)
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Checks an instruction against the table without running it.
    pub fn validate(&self, instruction: &Instruction) -> Result<(), ScriptError> {
        if instruction.is_label {
            return Ok(());
        }
        let Some(spec) = self.get(&instruction.name) else {
            return Err(ScriptError::new(
                "COMMAND_UNKNOWN",
                format!("Unknown command \"{}\".", instruction.name),
            ));
        };
        if !spec.arity.accepts(instruction.parameters.len()) {
            return Err(ScriptError::new(
                "COMMAND_ARITY",
                format!(
                    "Command \"{}\" expects {} parameter(s), got {}.",
                    spec.name,
                    spec.arity,
                    instruction.parameters.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Everything a handler may touch while running one instruction.
pub struct CommandContext<'a> {
    pub state: &'a mut ExecutionState,
    pub world: &'a mut dyn World,
    pub cache: &'a SharedScriptCache,
    pub options: &'a EngineOptions,
    pub rng_state: &'a mut u32,
    pub instruction: &'a Instruction,
}

impl<'a> CommandContext<'a> {
    pub fn param_count(&self) -> usize {
        self.instruction.parameters.len()
    }

    pub fn raw(&self, index: usize) -> Result<&'a str, ScriptError> {
        let instruction: &'a Instruction = self.instruction;
        instruction
            .parameters
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                ScriptError::new(
                    "COMMAND_PARAM_MISSING",
                    format!(
                        "Command \"{}\" has no parameter {}.",
                        instruction.name,
                        index + 1
                    ),
                )
            })
    }

    pub fn has(&self, index: usize) -> bool {
        index < self.param_count()
    }

    /// Parameter text with `$name` references expanded.
    pub fn text(&self, index: usize) -> Result<String, ScriptError> {
        Ok(substitute(self.raw(index)?, &*self.world))
    }

    pub fn text_or(&self, index: usize, default: &str) -> Result<String, ScriptError> {
        if self.has(index) {
            self.text(index)
        } else {
            Ok(default.to_string())
        }
    }

    pub fn int(&self, index: usize) -> Result<i32, ScriptError> {
        let raw = self.raw(index)?;
        resolve_int(raw, &*self.world).ok_or_else(|| {
            ScriptError::new(
                "COMMAND_PARAM_INT",
                format!(
                    "Parameter {} of \"{}\" is not an integer: \"{}\".",
                    index + 1,
                    self.instruction.name,
                    raw
                ),
            )
        })
    }

    pub fn int_or(&self, index: usize, default: i32) -> Result<i32, ScriptError> {
        if self.has(index) && !self.raw(index)?.trim().is_empty() {
            self.int(index)
        } else {
            Ok(default)
        }
    }

    /// Name of the variable a `$name` parameter refers to (the write target).
    pub fn variable(&self, index: usize) -> Result<&'a str, ScriptError> {
        let raw = self.raw(index)?;
        variable_name(raw).ok_or_else(|| {
            ScriptError::new(
                "COMMAND_PARAM_VARIABLE",
                format!(
                    "Parameter {} of \"{}\" must be a $variable, got \"{}\".",
                    index + 1,
                    self.instruction.name,
                    raw
                ),
            )
        })
    }

    pub fn result(&self) -> &'a str {
        let instruction: &'a Instruction = self.instruction;
        instruction.result.trim()
    }

    pub fn suspend(&mut self, reason: WaitReason) -> Flow {
        self.state.begin_wait(reason);
        Flow::Suspend
    }

    /// Positions the chain just past `label`, counting the visit.
    pub fn jump_to_label(&mut self, label: &str) -> Result<Flow, ScriptError> {
        let Some(program) = self.state.current_program.clone() else {
            return Err(ScriptError::new(
                "ENGINE_NO_PROGRAM",
                "No program is loaded for a jump.",
            ));
        };
        let normalized = qs_core::normalize_label(label);
        let Some(index) = program.labels.get(&normalized).copied() else {
            return Err(ScriptError::new(
                "ENGINE_LABEL_MISSING",
                format!(
                    "Label \"{}\" not found in \"{}\".",
                    normalized, program.file_name
                ),
            ));
        };
        self.state.record_label_visit(&normalized);
        self.state.current_line = index + 1;
        Ok(Flow::Jump)
    }

    /// Name of the NPC at `index`, or the belong object when the parameter is
    /// absent or empty.
    pub fn actor_or_self(&self, index: usize) -> Result<String, ScriptError> {
        if self.has(index) {
            let name = self.text(index)?;
            if !name.trim().is_empty() {
                return Ok(name);
            }
        }
        self.owner_id()
    }

    /// Id of the NPC or object the running script belongs to.
    pub fn owner_id(&self) -> Result<String, ScriptError> {
        self.state
            .belong_object
            .as_ref()
            .map(|owner| owner.id.clone())
            .ok_or_else(|| {
                ScriptError::new(
                    "COMMAND_NO_BELONG_OBJECT",
                    format!(
                        "Command \"{}\" needs an actor but the script has no owner.",
                        self.instruction.name
                    ),
                )
            })
    }
}
