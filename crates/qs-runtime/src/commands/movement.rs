use qs_core::ScriptError;

use crate::registry::{Arity, CommandContext, CommandRegistry, Flow};
use crate::wait::WaitReason;
use crate::world::{Movement, MovementKind, MovementTarget};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("NpcGoto", Arity::exact(3), npc_goto);
    registry.register("NpcGotoEx", Arity::exact(3), npc_goto_ex);
    registry.register("NpcGotoDir", Arity::exact(3), npc_goto_dir);
    registry.register("PlayerGoto", Arity::exact(2), player_goto);
    registry.register("PlayerGotoEx", Arity::exact(2), player_goto_ex);
    registry.register("PlayerRunTo", Arity::exact(2), player_run_to);
    registry.register("PlayerRunToEx", Arity::exact(2), player_run_to_ex);
    registry.register("PlayerJumpTo", Arity::exact(2), player_jump_to);
    registry.register("PlayerGotoDir", Arity::exact(2), player_goto_dir);
}

/// Hands the movement to the world; the `Ex` variants do not wait for it.
fn start(ctx: &mut CommandContext<'_>, movement: Movement, wait: bool) -> Flow {
    ctx.world.start_movement(&movement);
    if wait {
        ctx.suspend(WaitReason::Movement(movement))
    } else {
        Flow::Continue
    }
}

fn npc_tile(ctx: &CommandContext<'_>, kind: MovementKind) -> Result<Movement, ScriptError> {
    Ok(Movement {
        kind,
        actor: ctx.actor_or_self(0)?,
        target: MovementTarget::Tile {
            x: ctx.int(1)?,
            y: ctx.int(2)?,
        },
    })
}

fn player_tile(ctx: &CommandContext<'_>, kind: MovementKind) -> Result<Movement, ScriptError> {
    Ok(Movement {
        kind,
        actor: String::new(),
        target: MovementTarget::Tile {
            x: ctx.int(0)?,
            y: ctx.int(1)?,
        },
    })
}

fn npc_goto(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let movement = npc_tile(ctx, MovementKind::NpcGoto)?;
    Ok(start(ctx, movement, true))
}

fn npc_goto_ex(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let movement = npc_tile(ctx, MovementKind::NpcGoto)?;
    Ok(start(ctx, movement, false))
}

fn npc_goto_dir(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let movement = Movement {
        kind: MovementKind::NpcGotoDir,
        actor: ctx.actor_or_self(0)?,
        target: MovementTarget::Direction {
            direction: ctx.int(1)?,
            steps: ctx.int(2)?,
        },
    };
    Ok(start(ctx, movement, true))
}

fn player_goto(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let movement = player_tile(ctx, MovementKind::PlayerGoto)?;
    Ok(start(ctx, movement, true))
}

fn player_goto_ex(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let movement = player_tile(ctx, MovementKind::PlayerGoto)?;
    Ok(start(ctx, movement, false))
}

fn player_run_to(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let movement = player_tile(ctx, MovementKind::PlayerRunTo)?;
    Ok(start(ctx, movement, true))
}

fn player_run_to_ex(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let movement = player_tile(ctx, MovementKind::PlayerRunTo)?;
    Ok(start(ctx, movement, false))
}

fn player_jump_to(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let movement = player_tile(ctx, MovementKind::PlayerJumpTo)?;
    Ok(start(ctx, movement, true))
}

fn player_goto_dir(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let movement = Movement {
        kind: MovementKind::PlayerGotoDir,
        actor: String::new(),
        target: MovementTarget::Direction {
            direction: ctx.int(0)?,
            steps: ctx.int(1)?,
        },
    };
    Ok(start(ctx, movement, true))
}
