use super::Character;
use crate::constants::CHARGE_JUMP_HOLD_MS;
use crate::engine::GameEngine;
use crate::types::CharacterId;
use crate::world::get_controls;

const CHARGED_JUMP_MULTIPLIER: f64 = 2.0;
const CHARGED_JUMP_COST: i32 = 1;

/// Jumps as soon as the special key has been held long enough, once per hold.
pub(super) struct Berry;

impl Character for Berry {
    fn id(&self) -> CharacterId {
        CharacterId::Berry
    }

    fn name(&self) -> &'static str {
        "Berry"
    }

    fn color(&self) -> &'static str {
        "#ef5350"
    }

    /// The charge flag latches on the first fire, so a long hold spends one
    /// point instead of one per frame; it clears on key release.
    fn key_hold(&self, engine: &mut GameEngine, slot: usize, key: &str, duration_ms: u64) {
        if key != get_controls(slot).special
            || duration_ms <= CHARGE_JUMP_HOLD_MS
            || engine.players[slot].charging_logged.contains(key)
        {
            return;
        }
        engine.players[slot].charging_logged.insert(key.to_string());
        if engine.super_jump(slot, CHARGED_JUMP_MULTIPLIER, CHARGED_JUMP_COST) {
            engine.log("Berry is charging a jump!".to_string());
        }
    }
}
