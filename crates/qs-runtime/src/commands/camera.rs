use qs_core::ScriptError;

use crate::registry::{Arity, CommandContext, CommandRegistry, Flow};
use crate::wait::WaitReason;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("MoveScreen", Arity::exact(3), move_screen);
    registry.register("MoveScreenEx", Arity::exact(3), move_screen_ex);
}

/// `MoveScreen(direction, distance, speed)` pans relative to the view.
fn move_screen(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (direction, distance, speed) = (ctx.int(0)?, ctx.int(1)?, ctx.int(2)?);
    ctx.world.move_screen(direction, distance, speed);
    Ok(ctx.suspend(WaitReason::MoveScreen))
}

/// `MoveScreenEx(x, y, speed)` pans to an absolute tile.
fn move_screen_ex(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (x, y, speed) = (ctx.int(0)?, ctx.int(1)?, ctx.int(2)?);
    ctx.world.move_screen_to(x, y, speed);
    Ok(ctx.suspend(WaitReason::MoveScreen))
}
