use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use qs_core::{BelongObject, ObjectKind, ScriptError};
use tracing::{debug, info};

use crate::cache::SharedScriptCache;
use crate::engine::{EngineOptions, ScriptEngine};
use crate::registry::CommandRegistry;
use crate::wait::WaitReason;
use crate::world::{DebugHooks, SharedWorld};

/// Owns every script chain in a scene: one global chain, plus one chain per
/// NPC or object running its own script. Dialogue events go to the global
/// chain when it waits on one, otherwise to the first owned chain that does.
/// Chains share the world (and therefore its variables) and the program
/// cache, and nothing else.
pub struct ScriptDirector {
    world: SharedWorld,
    cache: SharedScriptCache,
    registry: Rc<CommandRegistry>,
    options: EngineOptions,
    global: ScriptEngine,
    owned: BTreeMap<String, ScriptEngine>,
    hooks: Option<Rc<RefCell<dyn DebugHooks>>>,
}

fn boxed_hooks(hooks: &Option<Rc<RefCell<dyn DebugHooks>>>) -> Option<Box<dyn DebugHooks>> {
    hooks
        .as_ref()
        .map(|hooks| Box::new(Rc::clone(hooks)) as Box<dyn DebugHooks>)
}

fn is_dialog_wait(wait: &WaitReason) -> bool {
    matches!(
        wait,
        WaitReason::Input {
            result_variable: None
        } | WaitReason::TalkQueue { .. }
    )
}

fn is_selection_wait(wait: &WaitReason) -> bool {
    matches!(
        wait,
        WaitReason::Input {
            result_variable: Some(_)
        }
    )
}

fn chain_key(owner: &BelongObject) -> String {
    match owner.kind {
        ObjectKind::Npc => format!("npc:{}", owner.id),
        ObjectKind::Obj => format!("obj:{}", owner.id),
    }
}

impl ScriptDirector {
    pub fn new(world: SharedWorld, cache: SharedScriptCache, options: EngineOptions) -> Self {
        let registry = Rc::new(CommandRegistry::with_builtins());
        let global = ScriptEngine::with_registry(
            Rc::clone(&world),
            Rc::clone(&cache),
            Rc::clone(&registry),
            options.clone(),
        );
        Self {
            world,
            cache,
            registry,
            options,
            global,
            owned: BTreeMap::new(),
            hooks: None,
        }
    }

    pub fn global(&self) -> &ScriptEngine {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut ScriptEngine {
        &mut self.global
    }

    pub fn chain(&self, owner: &BelongObject) -> Option<&ScriptEngine> {
        self.owned.get(&chain_key(owner))
    }

    pub fn chain_mut(&mut self, owner: &BelongObject) -> Option<&mut ScriptEngine> {
        self.owned.get_mut(&chain_key(owner))
    }

    pub fn owned_chain_count(&self) -> usize {
        self.owned.len()
    }

    /// Installs `hooks` on every chain, including owned chains created later.
    pub fn set_debug_hooks(&mut self, hooks: Option<Rc<RefCell<dyn DebugHooks>>>) {
        self.global.set_debug_hooks(boxed_hooks(&hooks));
        for chain in self.owned.values_mut() {
            chain.set_debug_hooks(boxed_hooks(&hooks));
        }
        self.hooks = hooks;
    }

    pub fn is_any_running(&self) -> bool {
        self.global.is_running() || self.owned.values().any(ScriptEngine::is_running)
    }

    /// Runs `path` on the global chain (cutscenes, map entry, traps).
    pub fn run_script(
        &mut self,
        path: &str,
        belong_object: Option<BelongObject>,
    ) -> Result<(), ScriptError> {
        self.global.run_script(path, belong_object)
    }

    /// Runs `path` on the chain owned by `owner`, creating it on first use.
    pub fn run_owned_script(&mut self, owner: BelongObject, path: &str) -> Result<(), ScriptError> {
        let key = chain_key(&owner);
        let chain = self.owned.entry(key.clone()).or_insert_with(|| {
            debug!(chain = key.as_str(), "chain created");
            let mut chain = ScriptEngine::with_registry(
                Rc::clone(&self.world),
                Rc::clone(&self.cache),
                Rc::clone(&self.registry),
                self.options.clone(),
            );
            chain.set_debug_hooks(boxed_hooks(&self.hooks));
            chain
        });
        chain.run_script(path, Some(owner))
    }

    /// Ticks every chain and drops owned chains that have finished.
    pub fn update(&mut self, delta_ms: i64) {
        self.global.update(delta_ms);
        for chain in self.owned.values_mut() {
            chain.update(delta_ms);
        }
        self.owned.retain(|key, chain| {
            let keep = chain.is_running() || !chain.diagnostics().is_empty();
            if !keep {
                debug!(chain = key.as_str(), "chain finished");
            }
            keep
        });
    }

    /// The first event-driven wait among the chains, global chain first.
    pub fn pending_event_wait(&self) -> Option<&WaitReason> {
        std::iter::once(&self.global)
            .chain(self.owned.values())
            .filter_map(|chain| chain.state().pending_wait.as_ref())
            .find(|wait| wait.is_event_driven())
    }

    fn awaiting_mut(&mut self, accepts: fn(&WaitReason) -> bool) -> &mut ScriptEngine {
        let global_waits = self.global.state().pending_wait.as_ref().is_some_and(accepts);
        if global_waits {
            return &mut self.global;
        }
        let owned = self.owned.iter_mut().find(|(_, chain)| {
            chain.state().pending_wait.as_ref().is_some_and(accepts)
        });
        match owned {
            Some((key, chain)) => {
                debug!(chain = key.as_str(), "event routed to owned chain");
                chain
            }
            None => &mut self.global,
        }
    }

    /// Closes the dialog of the global chain, or else of the first owned
    /// chain showing one.
    pub fn on_dialog_closed(&mut self) -> Result<(), ScriptError> {
        self.awaiting_mut(is_dialog_wait).on_dialog_closed()
    }

    pub fn on_selection_made(&mut self, index: i32) -> Result<(), ScriptError> {
        self.awaiting_mut(is_selection_wait).on_selection_made(index)
    }

    /// Hard stop of every chain plus a cache flush, for save loads and map
    /// transitions.
    pub fn stop_all_scripts(&mut self) {
        info!(owned = self.owned.len(), "stopping all scripts");
        self.global.stop_all_scripts();
        self.owned.clear();
        self.cache.borrow_mut().clear();
    }

    /// Diagnostics from every chain, global first.
    pub fn take_diagnostics(&mut self) -> Vec<ScriptError> {
        let mut all = self.global.take_diagnostics();
        for chain in self.owned.values_mut() {
            all.extend(chain.take_diagnostics());
        }
        self.owned.retain(|_, chain| chain.is_running());
        all
    }
}
