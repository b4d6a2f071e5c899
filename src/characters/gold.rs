use super::Character;
use crate::constants::CHARGE_JUMP_HOLD_MS;
use crate::engine::GameEngine;
use crate::types::CharacterId;
use crate::world::get_controls;

const SUPER_JUMP_MULTIPLIER: f64 = 1.5;

/// Charges on a long special hold and launches on release.
pub(super) struct Gold;

impl Character for Gold {
    fn id(&self) -> CharacterId {
        CharacterId::Gold
    }

    fn name(&self) -> &'static str {
        "Gold"
    }

    fn color(&self) -> &'static str {
        "#42a5f5"
    }

    fn key_hold(&self, engine: &mut GameEngine, slot: usize, key: &str, duration_ms: u64) {
        if key != get_controls(slot).special || duration_ms <= CHARGE_JUMP_HOLD_MS {
            return;
        }
        if engine.players[slot].charging_logged.insert(key.to_string()) {
            engine.log("Gold is charging power!".to_string());
        }
    }

    fn key_release(&self, engine: &mut GameEngine, slot: usize, key: &str, duration_ms: u64) {
        if key == get_controls(slot).special
            && duration_ms > CHARGE_JUMP_HOLD_MS
            && engine.super_jump(slot, SUPER_JUMP_MULTIPLIER, 0)
        {
            engine.log("Gold released a super jump!".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::TICK_MS;
    use crate::engine::tests::{approx_eq, grounded_duel};
    use crate::types::{CharacterId, RuntimeEvent};

    #[test]
    fn long_hold_then_release_super_jumps() {
        let mut engine = grounded_duel(CharacterId::Gold, CharacterId::Default);
        engine.key_down("e");
        for _ in 0..70 {
            engine.step(TICK_MS);
        }
        let charge_logs = engine
            .events
            .iter()
            .filter(|e| matches!(e, RuntimeEvent::Log { message } if message.contains("charging")))
            .count();
        assert_eq!(charge_logs, 1);
        engine.key_up("e");
        assert!(approx_eq(engine.players[0].vy, -22.5, 1e-9));
        assert_eq!(engine.players[0].points, 2);
    }

    #[test]
    fn short_tap_does_nothing() {
        let mut engine = grounded_duel(CharacterId::Gold, CharacterId::Default);
        engine.key_down("e");
        engine.step(TICK_MS);
        engine.key_up("e");
        assert_eq!(engine.players[0].vy, 0.0);
    }
}
