use serde::Serialize;

use super::{Character, Kit};
use crate::constants::{
    get_falloff_damage, SMASH_IMPACT_FRAMES, SMASH_MAX_IMPACT_RADIUS, SMASH_POINT_COST,
    SUPER_SMASH_HOLD_MS,
};
use crate::engine::GameEngine;
use crate::types::CharacterId;
use crate::world::get_controls;

const SUPER_SMASH_POWER: f64 = 1.5;
const SUPER_SMASH_COST: i32 = 2;
const SMASH_LAUNCH_X: f64 = 15.0;
const SMASH_LAUNCH_Y: f64 = -10.0;
const SMASH_BOUNCE_VY: f64 = -5.0;

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmasherKit {
    pub is_smashing: bool,
    pub smash_impact_power: f64,
    /// Shockwave ring, grows to the full radius while the timer runs out.
    pub impact_radius: f64,
    pub impact_duration: u32,
}

pub(super) struct Smasher;

impl Character for Smasher {
    fn id(&self) -> CharacterId {
        CharacterId::Smasher
    }

    fn name(&self) -> &'static str {
        "Smasher"
    }

    fn color(&self) -> &'static str {
        "#ff5722"
    }

    fn init(&self) -> Kit {
        Kit::Smasher(SmasherKit::default())
    }

    fn key_press(&self, engine: &mut GameEngine, slot: usize, key: &str, _count: u32) {
        if key == get_controls(slot).down && engine.ground_smash(slot, 1.0, SMASH_POINT_COST) {
            let p = &engine.players[slot];
            let message = format!(
                "{} initiates GROUND SMASH! (-{} point, {} remaining)",
                p.name, SMASH_POINT_COST, p.points
            );
            engine.log(message);
        }
    }

    fn key_release(&self, engine: &mut GameEngine, slot: usize, key: &str, duration_ms: u64) {
        if key == get_controls(slot).special
            && !engine.players[slot].on_ground
            && duration_ms > SUPER_SMASH_HOLD_MS
            && engine.ground_smash(slot, SUPER_SMASH_POWER, SUPER_SMASH_COST)
        {
            let p = &engine.players[slot];
            let message = format!(
                "{} initiates SUPER GROUND SMASH! (-{} points, {} remaining)",
                p.name, SUPER_SMASH_COST, p.points
            );
            engine.log(message);
        }
    }

    fn update(&self, engine: &mut GameEngine, slot: usize) {
        let on_ground = engine.players[slot].on_ground;
        let Kit::Smasher(kit) = &mut engine.players[slot].kit else {
            return;
        };
        if kit.impact_duration > 0 {
            kit.impact_duration -= 1;
            kit.impact_radius = SMASH_MAX_IMPACT_RADIUS
                * (1.0 - kit.impact_duration as f64 / SMASH_IMPACT_FRAMES as f64);
        }
        if !(kit.is_smashing && on_ground) {
            return;
        }
        kit.impact_duration = SMASH_IMPACT_FRAMES;
        kit.impact_radius = 0.0;
        kit.is_smashing = false;
        let power = kit.smash_impact_power;

        let (cx, cy) = engine.players[slot].center();
        for target in engine.opponents_of(slot) {
            let (tx, ty) = engine.players[target].center();
            let dx = tx - cx;
            let damage = get_falloff_damage(power, dx.hypot(ty - cy), SMASH_MAX_IMPACT_RADIUS);
            if damage <= 0 {
                continue;
            }
            engine.hit_player(slot, target, damage, "GROUND SMASH");
            let victim = &mut engine.players[target];
            victim.vx = if dx != 0.0 { dx.signum() * SMASH_LAUNCH_X } else { 0.0 };
            victim.vy = SMASH_LAUNCH_Y;
        }
        engine.players[slot].vy = SMASH_BOUNCE_VY;
    }
}
