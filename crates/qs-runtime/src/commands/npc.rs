use qs_core::ScriptError;

use crate::registry::{Arity, CommandContext, CommandRegistry, Flow};
use crate::wait::WaitReason;
use crate::world::PlayerStat;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("SetNpcDir", Arity::range(1, 2), set_npc_dir);
    registry.register("SetPlayerDir", Arity::exact(1), set_player_dir);
    registry.register("SetNpcState", Arity::range(1, 2), set_npc_state);
    registry.register("SetPlayerState", Arity::exact(1), set_player_state);
    registry.register("SetNpcLevel", Arity::range(1, 2), set_npc_level);
    registry.register("SetLevel", Arity::exact(1), set_level);
    registry.register("SetNpcRelation", Arity::range(1, 2), set_npc_relation);
    registry.register("SetNpcScript", Arity::range(1, 2), set_npc_script);
    registry.register("HideNpc", Arity::range(0, 1), hide_npc);
    registry.register("ShowNpc", Arity::range(0, 2), show_npc);
    registry.register("NpcSpecialAction", Arity::range(1, 2), npc_special_action);
    registry.register("NpcSpecialActionEx", Arity::range(1, 2), npc_special_action_ex);
    registry.register("PlayerSpecialAction", Arity::exact(1), player_special_action);
    registry.register("DisableNpcAI", Arity::exact(0), disable_npc_ai);
    registry.register("EnableNpcAI", Arity::exact(0), enable_npc_ai);
    registry.register("AddExp", Arity::exact(1), add_exp);
    registry.register("FullLife", Arity::exact(0), full_life);
    registry.register("FullMana", Arity::exact(0), full_mana);
    registry.register("FullThew", Arity::exact(0), full_thew);
    registry.register("AddLife", Arity::exact(1), add_life);
    registry.register("AddMana", Arity::exact(1), add_mana);
    registry.register("AddThew", Arity::exact(1), add_thew);
}

/// Splits `(name, value)` / `(value)` forms; the short form targets the
/// script's owner.
fn actor_and_int(ctx: &CommandContext<'_>) -> Result<(String, i32), ScriptError> {
    if ctx.param_count() >= 2 {
        Ok((ctx.actor_or_self(0)?, ctx.int(1)?))
    } else {
        Ok((ctx.owner_id()?, ctx.int(0)?))
    }
}

fn set_npc_dir(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (name, direction) = actor_and_int(ctx)?;
    ctx.world.set_npc_direction(&name, direction);
    Ok(Flow::Continue)
}

fn set_player_dir(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let direction = ctx.int(0)?;
    ctx.world.set_player_direction(direction);
    Ok(Flow::Continue)
}

fn set_npc_state(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (name, state) = actor_and_int(ctx)?;
    ctx.world.set_npc_state(&name, state);
    Ok(Flow::Continue)
}

fn set_player_state(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let state = ctx.int(0)?;
    ctx.world.set_player_state(state);
    Ok(Flow::Continue)
}

fn set_npc_level(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (name, level) = actor_and_int(ctx)?;
    ctx.world.set_npc_level(&name, level);
    Ok(Flow::Continue)
}

fn set_level(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let level = ctx.int(0)?;
    ctx.world.set_player_level(level);
    Ok(Flow::Continue)
}

fn set_npc_relation(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (name, relation) = actor_and_int(ctx)?;
    ctx.world.set_npc_relation(&name, relation);
    Ok(Flow::Continue)
}

fn set_npc_script(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (name, script) = if ctx.param_count() == 2 {
        (ctx.actor_or_self(0)?, ctx.text(1)?)
    } else {
        (ctx.owner_id()?, ctx.text(0)?)
    };
    ctx.world.set_npc_script(&name, &script);
    Ok(Flow::Continue)
}

fn hide_npc(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.actor_or_self(0)?;
    ctx.world.set_npc_visible(&name, false);
    Ok(Flow::Continue)
}

/// `ShowNpc(name[, flag])`; a zero flag hides instead.
fn show_npc(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.actor_or_self(0)?;
    let visible = ctx.int_or(1, 1)? != 0;
    ctx.world.set_npc_visible(&name, visible);
    Ok(Flow::Continue)
}

fn special_action(ctx: &mut CommandContext<'_>, wait: bool) -> Result<Flow, ScriptError> {
    let (actor, animation) = if ctx.param_count() == 2 {
        (ctx.actor_or_self(0)?, ctx.text(1)?)
    } else {
        (ctx.owner_id()?, ctx.text(0)?)
    };
    ctx.world.start_special_action(&actor, &animation);
    if wait {
        Ok(ctx.suspend(WaitReason::SpecialAction { actor }))
    } else {
        Ok(Flow::Continue)
    }
}

fn npc_special_action(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    special_action(ctx, true)
}

fn npc_special_action_ex(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    special_action(ctx, false)
}

fn player_special_action(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let animation = ctx.text(0)?;
    ctx.world.start_special_action("", &animation);
    Ok(ctx.suspend(WaitReason::SpecialAction {
        actor: String::new(),
    }))
}

fn disable_npc_ai(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.set_npc_ai_enabled(false);
    Ok(Flow::Continue)
}

fn enable_npc_ai(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    ctx.world.set_npc_ai_enabled(true);
    Ok(Flow::Continue)
}

fn add_exp(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let amount = ctx.int(0)?;
    ctx.world.add_player_exp(amount);
    Ok(Flow::Continue)
}

fn restore(ctx: &mut CommandContext<'_>, stat: PlayerStat, amount: bool) -> Result<Flow, ScriptError> {
    let amount = if amount { Some(ctx.int(0)?) } else { None };
    ctx.world.restore_player(stat, amount);
    Ok(Flow::Continue)
}

fn full_life(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    restore(ctx, PlayerStat::Life, false)
}

fn full_mana(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    restore(ctx, PlayerStat::Mana, false)
}

fn full_thew(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    restore(ctx, PlayerStat::Thew, false)
}

fn add_life(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    restore(ctx, PlayerStat::Life, true)
}

fn add_mana(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    restore(ctx, PlayerStat::Mana, true)
}

fn add_thew(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    restore(ctx, PlayerStat::Thew, true)
}

#[cfg(test)]
mod tests {
    use qs_core::BelongObject;

    use crate::engine::test_support::harness;
    use crate::engine::ChainStatus;

    #[test]
    fn npc_setters_accept_named_and_owner_forms() {
        let mut h = harness(&[(
            "npc.txt",
            "SetNpcDir(\"Guard\", 4);\nSetNpcDir(2);\nSetNpcState(1);\nSetNpcLevel(\"Guard\", 9);\nSetNpcRelation(\"Guard\", 1);\nSetNpcScript(\"talk2.txt\");\nHideNpc(\"Guard\");\nShowNpc(\"Guard\", 0);\nShowNpc();",
        )]);
        h.engine
            .run_script("npc.txt", Some(BelongObject::npc("Elder")))
            .expect("run should pass");
        assert_eq!(
            h.calls(),
            vec![
                "npc_dir Guard 4",
                "npc_dir Elder 2",
                "npc_state Elder 1",
                "npc_level Guard 9",
                "npc_relation Guard 1",
                "npc_script Elder talk2.txt",
                "npc_visible Guard false",
                "npc_visible Guard false",
                "npc_visible Elder true",
            ]
        );
    }

    #[test]
    fn player_commands_reach_the_world() {
        let mut h = harness(&[(
            "main.txt",
            "SetPlayerDir(3);\nSetPlayerState(2);\nSetLevel(5);\nAddExp(120);\nFullLife();\nAddMana(30);\nAddThew($bonus);\nDisableNpcAI();\nEnableNpcAI();",
        )]);
        h.set_var("bonus", 15);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(
            h.calls(),
            vec![
                "player_dir 3",
                "player_state 2",
                "player_level 5",
                "add_exp 120",
                "restore Life full",
                "restore Mana 30",
                "restore Thew 15",
                "npc_ai false",
                "npc_ai true",
            ]
        );
    }

    #[test]
    fn special_action_waits_only_for_the_blocking_form() {
        let mut h = harness(&[(
            "main.txt",
            "NpcSpecialActionEx(\"Cat\", \"jump.asf\");\nNpcSpecialAction(\"Dog\", \"bark.asf\");\nMessage(\"done\");",
        )]);
        h.world.borrow_mut().block("specialAction:Dog");
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(
            h.calls(),
            vec!["special_action Cat jump.asf", "special_action Dog bark.asf"]
        );
        assert_eq!(h.engine.status(), ChainStatus::Suspended);

        h.world.borrow_mut().unblock("specialAction:Dog");
        h.engine.update(16);
        assert_eq!(h.calls().last().map(String::as_str), Some("message done"));
    }
}
