//! Built-in command handlers, one module per command family.

use crate::registry::CommandRegistry;

mod camera;
mod dialogue;
mod effects;
mod flow;
mod goods;
mod map;
mod movement;
mod npc;
mod persistence;

pub(crate) fn register_builtins(registry: &mut CommandRegistry) {
    flow::register(registry);
    dialogue::register(registry);
    map::register(registry);
    movement::register(registry);
    npc::register(registry);
    camera::register(registry);
    goods::register(registry);
    effects::register(registry);
    persistence::register(registry);
}
