use std::collections::VecDeque;

use qs_core::TalkLine;
use serde::{Deserialize, Serialize};

use crate::world::{Movement, World};

/// The single asynchronous condition blocking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WaitReason {
    Timer {
        remaining_ms: i64,
    },
    Input {
        result_variable: Option<String>,
    },
    TalkQueue {
        remaining: VecDeque<TalkLine>,
    },
    Movement(Movement),
    FadeIn,
    FadeOut,
    SpecialAction {
        actor: String,
    },
    MoveScreen,
    BuyMenu,
}

impl WaitReason {
    /// Event-driven waits are cleared by UI callbacks, never by `update`.
    pub fn is_event_driven(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::TalkQueue { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Timer { .. } => "timer",
            Self::Input { .. } => "input",
            Self::TalkQueue { .. } => "talkQueue",
            Self::Movement(_) => "movement",
            Self::FadeIn => "fadeIn",
            Self::FadeOut => "fadeOut",
            Self::SpecialAction { .. } => "specialAction",
            Self::MoveScreen => "moveScreen",
            Self::BuyMenu => "buyMenu",
        }
    }

    /// Advances a polled wait by one frame and reports whether it is satisfied.
    pub fn poll(&mut self, world: &dyn World, delta_ms: i64) -> bool {
        match self {
            Self::Timer { remaining_ms } => {
                *remaining_ms -= delta_ms;
                *remaining_ms <= 0
            }
            Self::Input { .. } | Self::TalkQueue { .. } => false,
            Self::Movement(movement) => world.is_movement_finished(movement),
            Self::FadeIn => world.is_fade_in_finished(),
            Self::FadeOut => world.is_fade_out_finished(),
            Self::SpecialAction { actor } => world.is_special_action_finished(actor),
            Self::MoveScreen => world.is_camera_move_finished(),
            Self::BuyMenu => world.is_trade_finished(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingWorld;
    use crate::world::{MovementKind, MovementTarget};

    #[test]
    fn timer_counts_down_across_frames() {
        let world = RecordingWorld::default();
        let mut wait = WaitReason::Timer { remaining_ms: 50 };
        assert!(!wait.poll(&world, 20));
        assert!(!wait.poll(&world, 20));
        assert!(wait.poll(&world, 20));
    }

    #[test]
    fn event_driven_waits_never_complete_by_polling() {
        let world = RecordingWorld::default();
        let mut input = WaitReason::Input {
            result_variable: None,
        };
        assert!(input.is_event_driven());
        assert!(!input.poll(&world, 1_000));

        let mut talk = WaitReason::TalkQueue {
            remaining: VecDeque::new(),
        };
        assert!(!talk.poll(&world, 1_000));
    }

    #[test]
    fn polled_waits_ask_the_world() {
        let mut world = RecordingWorld::default();
        world.block("fadeOut");
        let mut fade = WaitReason::FadeOut;
        assert!(!fade.poll(&world, 16));
        world.unblock("fadeOut");
        assert!(fade.poll(&world, 16));

        let mut movement = WaitReason::Movement(Movement {
            kind: MovementKind::NpcGoto,
            actor: "Guard".to_string(),
            target: MovementTarget::Tile { x: 3, y: 4 },
        });
        assert_eq!(movement.name(), "movement");
        assert!(movement.poll(&world, 16));
    }
}
