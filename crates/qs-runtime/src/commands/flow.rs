use qs_core::ScriptError;
use tracing::debug;

use crate::cache::resolve_candidates;
use crate::engine::rng::next_random_in_range;
use crate::registry::{Arity, CommandContext, CommandRegistry, Flow};
use crate::resolver::evaluate_condition;
use crate::wait::WaitReason;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("Goto", Arity::exact(1), goto);
    registry.register("If", Arity::range(1, 2), if_jump);
    registry.register("Return", Arity::exact(0), return_to_caller);
    registry.register("RunScript", Arity::exact(1), run_script);
    registry.register("Sleep", Arity::exact(1), sleep);
    registry.register("Assign", Arity::exact(2), assign);
    registry.register("Add", Arity::exact(2), add);
    registry.register("Sub", Arity::exact(2), sub);
    registry.register("GetRandNum", Arity::exact(3), get_rand_num);
}

fn goto(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let label = ctx.text(0)?;
    ctx.jump_to_label(&label)
}

/// `If(cond) @Label` or `If(cond, @Label)`.
fn if_jump(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let target = if ctx.has(1) {
        ctx.raw(1)?
    } else {
        ctx.result()
    };
    if target.trim().is_empty() {
        return Err(ScriptError::new(
            "COMMAND_IF_TARGET",
            "If needs a label to jump to.",
        ));
    }
    if evaluate_condition(ctx.raw(0)?, &*ctx.world)? {
        ctx.jump_to_label(target)
    } else {
        Ok(Flow::Continue)
    }
}

fn return_to_caller(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    if !ctx.state.return_to_caller() {
        // Same as running off the end.
        let end = ctx
            .state
            .current_program
            .as_ref()
            .map(|program| program.len())
            .unwrap_or_default();
        ctx.state.current_line = end;
    }
    Ok(Flow::Jump)
}

fn run_script(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let target = ctx.text(0)?;
    if ctx.state.call_depth() + 1 > ctx.options.max_call_depth {
        return Err(ScriptError::new(
            "ENGINE_CALL_DEPTH",
            format!(
                "Call depth limit {} reached; \"{}\" not started.",
                ctx.options.max_call_depth, target
            ),
        ));
    }

    let candidates = resolve_candidates(
        &target,
        ctx.state.current_file(),
        &ctx.world.current_map_path(),
    );
    let program = ctx.cache.borrow_mut().load_first(&candidates)?;
    debug!(
        caller = ctx.state.current_file().unwrap_or_default(),
        callee = program.file_name.as_str(),
        depth = ctx.state.call_depth() + 1,
        "nested call"
    );
    ctx.state.enter_program(program);
    Ok(Flow::Jump)
}

fn sleep(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let millis = ctx.int(0)?;
    if millis <= 0 {
        return Ok(Flow::Continue);
    }
    Ok(ctx.suspend(WaitReason::Timer {
        remaining_ms: i64::from(millis),
    }))
}

fn assign(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.variable(0)?;
    let value = ctx.int(1)?;
    ctx.world.set_variable(name, value);
    Ok(Flow::Continue)
}

fn add(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.variable(0)?;
    let value = ctx.world.get_variable(name).wrapping_add(ctx.int(1)?);
    ctx.world.set_variable(name, value);
    Ok(Flow::Continue)
}

fn sub(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.variable(0)?;
    let value = ctx.world.get_variable(name).wrapping_sub(ctx.int(1)?);
    ctx.world.set_variable(name, value);
    Ok(Flow::Continue)
}

fn get_rand_num(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.variable(0)?;
    let min = ctx.int(1)?;
    let max = ctx.int(2)?;
    let value = next_random_in_range(ctx.rng_state, min, max);
    ctx.world.set_variable(name, value);
    Ok(Flow::Continue)
}
