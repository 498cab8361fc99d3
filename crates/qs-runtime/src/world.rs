use std::cell::RefCell;
use std::rc::Rc;

use qs_core::TalkLine;
use serde::{Deserialize, Serialize};

/// The game-world surface the engine drives.
///
/// Effect methods default to no-ops and completion polls default to
/// "finished", so a host only implements what its game supports. Failures
/// inside an effect (an addressed NPC no longer exists, say) are absorbed by
/// the implementation; the engine never inspects them.
pub trait World {
    // variables
    fn get_variable(&self, name: &str) -> i32;
    fn set_variable(&mut self, name: &str, value: i32);

    // dialogue
    fn show_dialog(&mut self, _text: &str, _portrait_index: i32) {}
    fn show_message(&mut self, _text: &str) {}
    fn show_selection(&mut self, _message: &str, _option_a: &str, _option_b: &str) {}
    fn show_multi_selection(&mut self, _columns: i32, _message: &str, _options: &[String]) {}
    fn talk_lines(&self, _start_id: i32, _end_id: i32) -> Vec<TalkLine> {
        Vec::new()
    }

    // map
    fn load_map(&mut self, _map: &str) {}
    fn current_map_path(&self) -> String {
        String::new()
    }
    fn load_npc_file(&mut self, _file: &str) {}
    fn add_npc(&mut self, _file: &str, _x: i32, _y: i32, _direction: i32) {}
    fn delete_npc(&mut self, _name: &str) {}
    fn load_object_file(&mut self, _file: &str) {}
    fn add_object(&mut self, _file: &str, _x: i32, _y: i32, _direction: i32) {}
    fn delete_object(&mut self, _name: &str) {}
    fn set_object_script(&mut self, _name: &str, _script: &str) {}
    fn set_npc_position(&mut self, _name: &str, _x: i32, _y: i32) {}
    fn set_player_position(&mut self, _x: i32, _y: i32) {}
    fn npc_position(&self, _name: &str) -> Option<(i32, i32)> {
        None
    }
    fn player_position(&self) -> (i32, i32) {
        (0, 0)
    }
    fn set_map_trap(&mut self, _map: &str, _trap_index: i32, _script: &str) {}

    // movement
    fn start_movement(&mut self, _movement: &Movement) {}
    fn is_movement_finished(&self, _movement: &Movement) -> bool {
        true
    }

    // npc and player control
    fn set_npc_direction(&mut self, _name: &str, _direction: i32) {}
    fn set_player_direction(&mut self, _direction: i32) {}
    fn set_npc_state(&mut self, _name: &str, _state: i32) {}
    fn set_player_state(&mut self, _state: i32) {}
    fn set_npc_level(&mut self, _name: &str, _level: i32) {}
    fn set_npc_relation(&mut self, _name: &str, _relation: i32) {}
    fn set_npc_script(&mut self, _name: &str, _script: &str) {}
    fn set_npc_visible(&mut self, _name: &str, _visible: bool) {}
    fn start_special_action(&mut self, _actor: &str, _animation: &str) {}
    fn is_special_action_finished(&self, _actor: &str) -> bool {
        true
    }
    fn set_npc_ai_enabled(&mut self, _enabled: bool) {}
    fn add_player_exp(&mut self, _amount: i32) {}
    fn set_player_level(&mut self, _level: i32) {}
    fn restore_player(&mut self, _stat: PlayerStat, _amount: Option<i32>) {}

    // camera
    fn move_screen(&mut self, _direction: i32, _distance: i32, _speed: i32) {}
    fn move_screen_to(&mut self, _x: i32, _y: i32, _speed: i32) {}
    fn is_camera_move_finished(&self) -> bool {
        true
    }

    // goods and economy
    fn add_goods(&mut self, _name: &str, _count: i32) {}
    fn remove_goods(&mut self, _name: &str, _count: i32) {}
    fn goods_count(&self, _name: &str) -> i32 {
        0
    }
    fn equip_goods(&mut self, _name: &str) {}
    fn add_money(&mut self, _amount: i32) {}
    fn set_money(&mut self, _amount: i32) {}
    fn money(&self) -> i32 {
        0
    }
    fn open_trade_menu(&mut self, _mode: TradeMode, _list_file: &str) {}
    fn is_trade_finished(&self) -> bool {
        true
    }

    // audio
    fn play_music(&mut self, _file: &str) {}
    fn stop_music(&mut self) {}
    fn play_sound(&mut self, _file: &str, _position: Option<(i32, i32)>) {}

    // visual effects
    fn fade_in(&mut self) {}
    fn fade_out(&mut self) {}
    fn is_fade_in_finished(&self) -> bool {
        true
    }
    fn is_fade_out_finished(&self) -> bool {
        true
    }
    fn set_map_tint(&mut self, _red: i32, _green: i32, _blue: i32) {}
    fn set_sprite_tint(&mut self, _red: i32, _green: i32, _blue: i32) {}
    fn begin_rain(&mut self, _file: &str) {}
    fn end_rain(&mut self) {}
    fn set_snow(&mut self, _enabled: bool) {}

    // persistence
    fn save_map_traps(&mut self) {}
    fn clear_all_saves(&mut self) {}
    fn set_save_enabled(&mut self, _enabled: bool) {}

    // timers
    fn open_time_limit(&mut self, _seconds: i32) {}
    fn close_time_limit(&mut self) {}
    fn set_time_script(&mut self, _seconds: i32, _script: &str) {}

    // memo
    fn add_memo(&mut self, _text: &str) {}
    fn remove_memo(&mut self, _text: &str) {}
    fn add_memo_by_id(&mut self, _id: i32) {}
    fn remove_memo_by_id(&mut self, _id: i32) {}
}

pub type SharedWorld = Rc<RefCell<dyn World>>;

/// Optional observer for debuggers and script history panels.
pub trait DebugHooks {
    fn on_script_start(&mut self, _file: &str, _total_lines: usize, _all_lines: &[String]) {}
    fn on_line_executed(&mut self, _file: &str, _line: usize) {}
}

/// Lets one observer be shared by several chains.
impl<H: DebugHooks + ?Sized> DebugHooks for Rc<RefCell<H>> {
    fn on_script_start(&mut self, file: &str, total_lines: usize, all_lines: &[String]) {
        self.borrow_mut().on_script_start(file, total_lines, all_lines);
    }

    fn on_line_executed(&mut self, file: &str, line: usize) {
        self.borrow_mut().on_line_executed(file, line);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MovementKind {
    NpcGoto,
    NpcGotoDir,
    PlayerGoto,
    PlayerGotoDir,
    PlayerRunTo,
    PlayerJumpTo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MovementTarget {
    Tile { x: i32, y: i32 },
    Direction { direction: i32, steps: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub kind: MovementKind,
    /// NPC name, or empty for the player.
    pub actor: String,
    pub target: MovementTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TradeMode {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerStat {
    Life,
    Mana,
    Thew,
}
