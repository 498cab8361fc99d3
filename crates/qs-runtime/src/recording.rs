use std::collections::{BTreeMap, BTreeSet};

use qs_core::TalkLine;

use crate::world::{Movement, MovementTarget, PlayerStat, TradeMode, World};

/// An in-memory [`World`] that records every effect as a readable call line.
///
/// Completion polls report "finished" unless the matching key was blocked
/// with [`RecordingWorld::block`]: `fadeIn`, `fadeOut`, `moveScreen`, `trade`,
/// `movement:<actor>` (empty actor is `player`) or `specialAction:<actor>`.
#[derive(Debug, Default, Clone)]
pub struct RecordingWorld {
    pub variables: BTreeMap<String, i32>,
    pub calls: Vec<String>,
    pub talk_table: BTreeMap<i32, TalkLine>,
    pub map_path: String,
    pub money: i32,
    pub goods: BTreeMap<String, i32>,
    pub npc_positions: BTreeMap<String, (i32, i32)>,
    pub player_position: (i32, i32),
    blocked: BTreeSet<String>,
}

impl RecordingWorld {
    pub fn block(&mut self, key: &str) {
        self.blocked.insert(key.to_string());
    }

    pub fn unblock(&mut self, key: &str) {
        self.blocked.remove(key);
    }

    pub fn unblock_all(&mut self) {
        self.blocked.clear();
    }

    pub fn is_blocked(&self, key: &str) -> bool {
        self.blocked.contains(key)
    }

    pub fn with_talk(mut self, id: i32, text: &str, portrait_index: i32) -> Self {
        self.talk_table.insert(
            id,
            TalkLine {
                text: text.to_string(),
                portrait_index,
            },
        );
        self
    }

    /// Calls whose line starts with `prefix`.
    pub fn calls_starting_with(&self, prefix: &str) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    fn record(&mut self, call: String) {
        self.calls.push(call);
    }
}

fn actor_key(actor: &str) -> &str {
    if actor.is_empty() {
        "player"
    } else {
        actor
    }
}

impl World for RecordingWorld {
    fn get_variable(&self, name: &str) -> i32 {
        self.variables.get(name).copied().unwrap_or(0)
    }

    fn set_variable(&mut self, name: &str, value: i32) {
        self.variables.insert(name.to_string(), value);
    }

    fn show_dialog(&mut self, text: &str, portrait_index: i32) {
        self.record(format!("dialog {} {}", portrait_index, text));
    }

    fn show_message(&mut self, text: &str) {
        self.record(format!("message {}", text));
    }

    fn show_selection(&mut self, message: &str, option_a: &str, option_b: &str) {
        self.record(format!("selection {} [{}|{}]", message, option_a, option_b));
    }

    fn show_multi_selection(&mut self, columns: i32, message: &str, options: &[String]) {
        self.record(format!(
            "multi_selection {} {} [{}]",
            columns,
            message,
            options.join("|")
        ));
    }

    fn talk_lines(&self, start_id: i32, end_id: i32) -> Vec<TalkLine> {
        self.talk_table
            .range(start_id..=end_id)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn load_map(&mut self, map: &str) {
        self.map_path = map.to_string();
        self.record(format!("load_map {}", map));
    }

    fn current_map_path(&self) -> String {
        self.map_path.clone()
    }

    fn load_npc_file(&mut self, file: &str) {
        self.record(format!("load_npc {}", file));
    }

    fn add_npc(&mut self, file: &str, x: i32, y: i32, direction: i32) {
        self.record(format!("add_npc {} {} {} {}", file, x, y, direction));
    }

    fn delete_npc(&mut self, name: &str) {
        self.npc_positions.remove(name);
        self.record(format!("delete_npc {}", name));
    }

    fn load_object_file(&mut self, file: &str) {
        self.record(format!("load_obj {}", file));
    }

    fn add_object(&mut self, file: &str, x: i32, y: i32, direction: i32) {
        self.record(format!("add_obj {} {} {} {}", file, x, y, direction));
    }

    fn delete_object(&mut self, name: &str) {
        self.record(format!("delete_obj {}", name));
    }

    fn set_object_script(&mut self, name: &str, script: &str) {
        self.record(format!("obj_script {} {}", name, script));
    }

    fn set_npc_position(&mut self, name: &str, x: i32, y: i32) {
        self.npc_positions.insert(name.to_string(), (x, y));
        self.record(format!("npc_pos {} {} {}", name, x, y));
    }

    fn set_player_position(&mut self, x: i32, y: i32) {
        self.player_position = (x, y);
        self.record(format!("player_pos {} {}", x, y));
    }

    fn npc_position(&self, name: &str) -> Option<(i32, i32)> {
        self.npc_positions.get(name).copied()
    }

    fn player_position(&self) -> (i32, i32) {
        self.player_position
    }

    fn set_map_trap(&mut self, map: &str, trap_index: i32, script: &str) {
        self.record(format!("map_trap {} {} {}", map, trap_index, script));
    }

    fn start_movement(&mut self, movement: &Movement) {
        let target = match movement.target {
            MovementTarget::Tile { x, y } => format!("{} {}", x, y),
            MovementTarget::Direction { direction, steps } => {
                format!("dir {} x{}", direction, steps)
            }
        };
        self.record(format!(
            "move {:?} {} {}",
            movement.kind,
            actor_key(&movement.actor),
            target
        ));
    }

    fn is_movement_finished(&self, movement: &Movement) -> bool {
        !self.is_blocked(&format!("movement:{}", actor_key(&movement.actor)))
    }

    fn set_npc_direction(&mut self, name: &str, direction: i32) {
        self.record(format!("npc_dir {} {}", name, direction));
    }

    fn set_player_direction(&mut self, direction: i32) {
        self.record(format!("player_dir {}", direction));
    }

    fn set_npc_state(&mut self, name: &str, state: i32) {
        self.record(format!("npc_state {} {}", name, state));
    }

    fn set_player_state(&mut self, state: i32) {
        self.record(format!("player_state {}", state));
    }

    fn set_npc_level(&mut self, name: &str, level: i32) {
        self.record(format!("npc_level {} {}", name, level));
    }

    fn set_npc_relation(&mut self, name: &str, relation: i32) {
        self.record(format!("npc_relation {} {}", name, relation));
    }

    fn set_npc_script(&mut self, name: &str, script: &str) {
        self.record(format!("npc_script {} {}", name, script));
    }

    fn set_npc_visible(&mut self, name: &str, visible: bool) {
        self.record(format!("npc_visible {} {}", name, visible));
    }

    fn start_special_action(&mut self, actor: &str, animation: &str) {
        self.record(format!("special_action {} {}", actor_key(actor), animation));
    }

    fn is_special_action_finished(&self, actor: &str) -> bool {
        !self.is_blocked(&format!("specialAction:{}", actor_key(actor)))
    }

    fn set_npc_ai_enabled(&mut self, enabled: bool) {
        self.record(format!("npc_ai {}", enabled));
    }

    fn add_player_exp(&mut self, amount: i32) {
        self.record(format!("add_exp {}", amount));
    }

    fn set_player_level(&mut self, level: i32) {
        self.record(format!("player_level {}", level));
    }

    fn restore_player(&mut self, stat: PlayerStat, amount: Option<i32>) {
        match amount {
            Some(amount) => self.record(format!("restore {:?} {}", stat, amount)),
            None => self.record(format!("restore {:?} full", stat)),
        }
    }

    fn move_screen(&mut self, direction: i32, distance: i32, speed: i32) {
        self.record(format!("move_screen {} {} {}", direction, distance, speed));
    }

    fn move_screen_to(&mut self, x: i32, y: i32, speed: i32) {
        self.record(format!("move_screen_to {} {} {}", x, y, speed));
    }

    fn is_camera_move_finished(&self) -> bool {
        !self.is_blocked("moveScreen")
    }

    fn add_goods(&mut self, name: &str, count: i32) {
        *self.goods.entry(name.to_string()).or_insert(0) += count;
        self.record(format!("add_goods {} {}", name, count));
    }

    fn remove_goods(&mut self, name: &str, count: i32) {
        let entry = self.goods.entry(name.to_string()).or_insert(0);
        *entry = (*entry - count).max(0);
        self.record(format!("remove_goods {} {}", name, count));
    }

    fn goods_count(&self, name: &str) -> i32 {
        self.goods.get(name).copied().unwrap_or(0)
    }

    fn equip_goods(&mut self, name: &str) {
        self.record(format!("equip {}", name));
    }

    fn add_money(&mut self, amount: i32) {
        self.money = self.money.saturating_add(amount).max(0);
        self.record(format!("add_money {}", amount));
    }

    fn set_money(&mut self, amount: i32) {
        self.money = amount.max(0);
        self.record(format!("set_money {}", amount));
    }

    fn money(&self) -> i32 {
        self.money
    }

    fn open_trade_menu(&mut self, mode: TradeMode, list_file: &str) {
        self.record(format!("trade {:?} {}", mode, list_file));
    }

    fn is_trade_finished(&self) -> bool {
        !self.is_blocked("trade")
    }

    fn play_music(&mut self, file: &str) {
        self.record(format!("play_music {}", file));
    }

    fn stop_music(&mut self) {
        self.record("stop_music".to_string());
    }

    fn play_sound(&mut self, file: &str, position: Option<(i32, i32)>) {
        match position {
            Some((x, y)) => self.record(format!("play_sound {} at {} {}", file, x, y)),
            None => self.record(format!("play_sound {}", file)),
        }
    }

    fn fade_in(&mut self) {
        self.record("fade_in".to_string());
    }

    fn fade_out(&mut self) {
        self.record("fade_out".to_string());
    }

    fn is_fade_in_finished(&self) -> bool {
        !self.is_blocked("fadeIn")
    }

    fn is_fade_out_finished(&self) -> bool {
        !self.is_blocked("fadeOut")
    }

    fn set_map_tint(&mut self, red: i32, green: i32, blue: i32) {
        self.record(format!("map_tint {} {} {}", red, green, blue));
    }

    fn set_sprite_tint(&mut self, red: i32, green: i32, blue: i32) {
        self.record(format!("sprite_tint {} {} {}", red, green, blue));
    }

    fn begin_rain(&mut self, file: &str) {
        self.record(format!("begin_rain {}", file));
    }

    fn end_rain(&mut self) {
        self.record("end_rain".to_string());
    }

    fn set_snow(&mut self, enabled: bool) {
        self.record(format!("snow {}", enabled));
    }

    fn save_map_traps(&mut self) {
        self.record("save_map_traps".to_string());
    }

    fn clear_all_saves(&mut self) {
        self.record("clear_all_saves".to_string());
    }

    fn set_save_enabled(&mut self, enabled: bool) {
        self.record(format!("save_enabled {}", enabled));
    }

    fn open_time_limit(&mut self, seconds: i32) {
        self.record(format!("open_time_limit {}", seconds));
    }

    fn close_time_limit(&mut self) {
        self.record("close_time_limit".to_string());
    }

    fn set_time_script(&mut self, seconds: i32, script: &str) {
        self.record(format!("time_script {} {}", seconds, script));
    }

    fn add_memo(&mut self, text: &str) {
        self.record(format!("add_memo {}", text));
    }

    fn remove_memo(&mut self, text: &str) {
        self.record(format!("remove_memo {}", text));
    }

    fn add_memo_by_id(&mut self, id: i32) {
        self.record(format!("add_memo_id {}", id));
    }

    fn remove_memo_by_id(&mut self, id: i32) {
        self.record(format!("remove_memo_id {}", id));
    }
}
