mod cache;
mod commands;
mod director;
mod engine;
mod recording;
mod registry;
mod resolver;
mod state;
mod wait;
mod world;

pub use cache::{
    resolve_candidates, DirScriptLoader, MemoryScriptLoader, ScriptCache, ScriptLoader,
    SharedScriptCache,
};
pub use director::ScriptDirector;
pub use engine::{
    ChainStatus, EngineOptions, ScriptEngine, DEFAULT_MAX_CALL_DEPTH,
    DEFAULT_MAX_STEPS_PER_EXECUTE,
};
pub use recording::RecordingWorld;
pub use registry::{Arity, CommandContext, CommandHandler, CommandRegistry, CommandSpec, Flow};
pub use resolver::{evaluate_condition, resolve_int, substitute, variable_name, Comparison};
pub use state::{CallFrame, ChainSnapshot, ExecutionState, FrameSnapshot};
pub use wait::WaitReason;
pub use world::{
    DebugHooks, Movement, MovementKind, MovementTarget, PlayerStat, SharedWorld, TradeMode, World,
};
