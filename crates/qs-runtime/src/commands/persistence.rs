use qs_core::ScriptError;

use crate::registry::{Arity, CommandContext, CommandRegistry, Flow};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("ClearAllSave", Arity::exact(0), clear_all_save);
    registry.register("EnableSave", Arity::exact(0), enable_save);
    registry.register("DisableSave", Arity::exact(0), disable_save);
    registry.register("SaveMapTrap", Arity::exact(0), save_map_trap);
    registry.register("OpenTimeLimit", Arity::exact(1), open_time_limit);
    registry.register("CloseTimeLimit", Arity::exact(0), close_time_limit);
    registry.register("SetTimeScript", Arity::exact(2), set_time_script);
    registry.register("Memo", Arity::exact(1), memo);
    registry.register("DelMemo", Arity::exact(1), del_memo);
    registry.register("AddToMemo", Arity::exact(1), add_to_memo);
    registry.register("DelFromMemo", Arity::exact(1), del_from_memo);
}

fn clear_all_save(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.clear_all_saves();
    Ok(Flow::Continue)
}

fn enable_save(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.set_save_enabled(true);
    Ok(Flow::Continue)
}

fn disable_save(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.set_save_enabled(false);
    Ok(Flow::Continue)
}

fn save_map_trap(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.save_map_traps();
    Ok(Flow::Continue)
}

fn open_time_limit(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let seconds = ctx.int(0)?;
    ctx.world.open_time_limit(seconds);
    Ok(Flow::Continue)
}

fn close_time_limit(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.close_time_limit();
    Ok(Flow::Continue)
}

/// `SetTimeScript(seconds, script)` registers a script the world runs when
/// the countdown expires.
fn set_time_script(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let seconds = ctx.int(0)?;
    let script = ctx.text(1)?;
    ctx.world.set_time_script(seconds, &script);
    Ok(Flow::Continue)
}

fn memo(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let text = ctx.text(0)?;
    ctx.world.add_memo(&text);
    Ok(Flow::Continue)
}

fn del_memo(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let text = ctx.text(0)?;
    ctx.world.remove_memo(&text);
    Ok(Flow::Continue)
}

fn add_to_memo(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let id = ctx.int(0)?;
    ctx.world.add_memo_by_id(id);
    Ok(Flow::Continue)
}

fn del_from_memo(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let id = ctx.int(0)?;
    ctx.world.remove_memo_by_id(id);
    Ok(Flow::Continue)
}
