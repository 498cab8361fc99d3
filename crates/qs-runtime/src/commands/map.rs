use qs_core::{ObjectKind, ScriptError};

use crate::registry::{Arity, CommandContext, CommandRegistry, Flow};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("LoadMap", Arity::exact(1), load_map);
    registry.register("LoadNpc", Arity::exact(1), load_npc);
    registry.register("AddNpc", Arity::range(3, 4), add_npc);
    registry.register("DelNpc", Arity::range(0, 1), del_npc);
    registry.register("LoadObj", Arity::exact(1), load_obj);
    registry.register("AddObj", Arity::range(3, 4), add_obj);
    registry.register("DelObj", Arity::exact(1), del_obj);
    registry.register("DelCurObj", Arity::exact(0), del_cur_obj);
    registry.register("SetNpcPos", Arity::range(2, 3), set_npc_pos);
    registry.register("SetPlayerPos", Arity::exact(2), set_player_pos);
    registry.register("SetMapTrap", Arity::range(2, 3), set_map_trap);
    registry.register("SetObjScript", Arity::exact(2), set_obj_script);
}

fn load_map(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let map = ctx.text(0)?;
    ctx.world.load_map(&map);
    Ok(Flow::Continue)
}

fn load_npc(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let file = ctx.text(0)?;
    ctx.world.load_npc_file(&file);
    Ok(Flow::Continue)
}

fn add_npc(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let file = ctx.text(0)?;
    let (x, y) = (ctx.int(1)?, ctx.int(2)?);
    let direction = ctx.int_or(3, 0)?;
    ctx.world.add_npc(&file, x, y, direction);
    Ok(Flow::Continue)
}

fn del_npc(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.actor_or_self(0)?;
    ctx.world.delete_npc(&name);
    Ok(Flow::Continue)
}

fn load_obj(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let file = ctx.text(0)?;
    ctx.world.load_object_file(&file);
    Ok(Flow::Continue)
}

fn add_obj(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let file = ctx.text(0)?;
    let (x, y) = (ctx.int(1)?, ctx.int(2)?);
    let direction = ctx.int_or(3, 0)?;
    ctx.world.add_object(&file, x, y, direction);
    Ok(Flow::Continue)
}

fn del_obj(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.text(0)?;
    ctx.world.delete_object(&name);
    Ok(Flow::Continue)
}

/// Removes the object that owns the running script.
fn del_cur_obj(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let owner = match &ctx.state.belong_object {
        Some(owner) if owner.kind == ObjectKind::Obj => owner.id.clone(),
        _ => {
            return Err(ScriptError::new(
                "COMMAND_NO_BELONG_OBJECT",
                "DelCurObj needs a script owned by an object.",
            ))
        }
    };
    ctx.world.delete_object(&owner);
    Ok(Flow::Continue)
}

/// `SetNpcPos(name, x, y)`, or `SetNpcPos(x, y)` for the owning NPC.
fn set_npc_pos(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (name, first) = if ctx.param_count() == 3 {
        (ctx.actor_or_self(0)?, 1)
    } else {
        (ctx.owner_id()?, 0)
    };
    let (x, y) = (ctx.int(first)?, ctx.int(first + 1)?);
    ctx.world.set_npc_position(&name, x, y);
    Ok(Flow::Continue)
}

fn set_player_pos(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (x, y) = (ctx.int(0)?, ctx.int(1)?);
    ctx.world.set_player_position(x, y);
    Ok(Flow::Continue)
}

/// `SetMapTrap(map, index, script)`, or `SetMapTrap(index, script)` for the
/// current map.
fn set_map_trap(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let (map, first) = if ctx.param_count() == 3 {
        (ctx.text(0)?, 1)
    } else {
        (ctx.world.current_map_path(), 0)
    };
    let index = ctx.int(first)?;
    let script = ctx.text(first + 1)?;
    ctx.world.set_map_trap(&map, index, &script);
    Ok(Flow::Continue)
}

fn set_obj_script(ctx: &mut CommandContext<'_>) -> Result<Flow, ScriptError> {
    let name = ctx.text(0)?;
    let script = ctx.text(1)?;
    ctx.world.set_object_script(&name, &script);
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use qs_core::BelongObject;

    use crate::engine::test_support::harness;

    #[test]
    fn map_and_object_commands_reach_the_world() {
        let mut h = harness(&[(
            "main.txt",
            "LoadMap(\"map/village.map\");\nLoadNpc(\"village.npc\");\nAddNpc(\"guard.ini\", 10, 12, 3);\nAddObj(\"box.ini\", 4, 5);\nDelObj(\"Barrel\");\nSetPlayerPos(7, 8);\nSetMapTrap(2, \"trap2.txt\");\nSetMapTrap(\"map/cave.map\", 1, \"trap1.txt\");\nSetObjScript(\"Chest\", \"open.txt\");",
        )]);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert_eq!(
            h.calls(),
            vec![
                "load_map map/village.map",
                "load_npc village.npc",
                "add_npc guard.ini 10 12 3",
                "add_obj box.ini 4 5 0",
                "delete_obj Barrel",
                "player_pos 7 8",
                "map_trap map/village.map 2 trap2.txt",
                "map_trap map/cave.map 1 trap1.txt",
                "obj_script Chest open.txt",
            ]
        );
    }

    #[test]
    fn owner_defaults_apply_to_npc_and_object_commands() {
        let mut h = harness(&[
            ("npc.txt", "SetNpcPos(3, 4);\nDelNpc();"),
            ("obj.txt", "DelCurObj();"),
        ]);
        h.engine
            .run_script("npc.txt", Some(BelongObject::npc("Elder")))
            .expect("run should pass");
        h.engine
            .run_script("obj.txt", Some(BelongObject::obj("Crate")))
            .expect("run should pass");
        assert_eq!(
            h.calls(),
            vec!["npc_pos Elder 3 4", "delete_npc Elder", "delete_obj Crate"]
        );
    }

    #[test]
    fn del_cur_obj_without_object_owner_is_reported() {
        let mut h = harness(&[("main.txt", "DelCurObj();\nDelNpc();")]);
        h.engine.run_script("main.txt", None).expect("run should pass");
        assert!(h.calls().is_empty());
        assert_eq!(
            h.diagnostic_codes(),
            vec!["COMMAND_NO_BELONG_OBJECT", "COMMAND_NO_BELONG_OBJECT"]
        );
    }
}
