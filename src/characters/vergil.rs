use serde::Serialize;

use super::{Character, Kit, Trail};
use crate::animation::AnimationClip;
use crate::engine::GameEngine;
use crate::geometry::{Line, Point};
use crate::types::{CharacterId, JudgementCutPhase};
use crate::world::get_controls;

const SPRITES: &[AnimationClip] = &[
    AnimationClip::looping("idle", 7, 200),
    AnimationClip::looping("teleporting", 4, 100),
    AnimationClip::looping("concentrating", 3, 150),
    AnimationClip::once("slash", 5, 120, "idle"),
    AnimationClip::looping("run", 8, 100),
];

const TRAIL_FADE: f64 = 0.92;
const TELEPORT_FADE_IN: f64 = 0.15;
const RUN_SPEED_THRESHOLD: f64 = 1.0;

/// One polygon of the shattered view. `x`/`y` is its offset from where it
/// was cut.
#[derive(Clone, Debug, Serialize)]
pub struct Shard {
    pub poly: Vec<Point>,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub g: f64,
    pub angle: f64,
    pub vangle: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgementCutEffect {
    pub phase: JudgementCutPhase,
    /// Slash lines in view coordinates.
    pub lines: Vec<Line>,
    pub visible_lines: usize,
    pub shards: Vec<Shard>,
    pub camera_x: f64,
    pub camera_y: f64,
    pub view_width: f64,
    pub view_height: f64,
    pub slide_started_ms: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VergilKit {
    pub judgement_cut_cooldown: u32,
    pub judgement_cut_effect: Option<JudgementCutEffect>,
    pub is_concentrating: bool,
    pub teleport_trail: Option<Trail>,
    pub is_teleporting: bool,
    pub teleport_alpha: f64,
    pub teleport_jump_cooldown: u32,
    pub last_movement_state: &'static str,
}

impl Default for VergilKit {
    fn default() -> Self {
        Self {
            judgement_cut_cooldown: 0,
            judgement_cut_effect: None,
            is_concentrating: false,
            teleport_trail: None,
            is_teleporting: false,
            teleport_alpha: 1.0,
            teleport_jump_cooldown: 0,
            last_movement_state: "idle",
        }
    }
}

pub(super) struct Vergil;

impl Vergil {
    /// Picks the clip for the current movement without cutting into a slash
    /// or a concentration stance.
    fn switch_animation(engine: &mut GameEngine, slot: usize) {
        let now_ms = engine.now_ms();
        let p = &mut engine.players[slot];
        let Kit::Vergil(kit) = &mut p.kit else {
            return;
        };
        let Some(animation) = p.animation.as_ref() else {
            return;
        };
        let current = animation.current();
        if current == Some("slash") && !animation.is_finished() {
            return;
        }
        if current == Some("concentrating") && kit.is_concentrating {
            return;
        }
        if kit.is_teleporting {
            if current != Some("teleporting") {
                p.set_animation("teleporting", now_ms);
            }
            return;
        }
        if kit.is_concentrating || !p.on_ground {
            return;
        }
        let next = if p.vx.abs() > RUN_SPEED_THRESHOLD { "run" } else { "idle" };
        kit.last_movement_state = next;
        if current != Some(next) {
            p.set_animation(next, now_ms);
        }
    }
}

impl Character for Vergil {
    fn id(&self) -> CharacterId {
        CharacterId::Vergil
    }

    fn name(&self) -> &'static str {
        "Vergil"
    }

    fn color(&self) -> &'static str {
        "#4a90e2"
    }

    fn sprites(&self) -> &'static [AnimationClip] {
        SPRITES
    }

    fn init(&self) -> Kit {
        Kit::Vergil(VergilKit::default())
    }

    fn update(&self, engine: &mut GameEngine, slot: usize) {
        Self::switch_animation(engine, slot);

        let now_ms = engine.now_ms();
        let p = &mut engine.players[slot];
        let dashing = p.dash > 0;
        let Kit::Vergil(kit) = &mut p.kit else {
            return;
        };
        kit.judgement_cut_cooldown = kit.judgement_cut_cooldown.saturating_sub(1);
        if let Some(trail) = kit.teleport_trail.as_mut() {
            trail.duration = trail.duration.saturating_sub(1);
            trail.alpha *= TRAIL_FADE;
            if trail.duration == 0 {
                kit.teleport_trail = None;
            }
        }

        let mut settle_into = None;
        if kit.is_teleporting {
            if dashing {
                kit.teleport_alpha = 0.2 + 0.3 * (now_ms as f64 / 50.0).sin();
            } else {
                kit.teleport_alpha += TELEPORT_FADE_IN;
                if kit.teleport_alpha >= 1.0 {
                    kit.teleport_alpha = 1.0;
                    kit.is_teleporting = false;
                    settle_into = Some(kit.last_movement_state);
                }
            }
        }
        kit.teleport_jump_cooldown = kit.teleport_jump_cooldown.saturating_sub(1);
        if let Some(name) = settle_into {
            p.set_animation(name, now_ms);
        }
    }

    fn update_effects(&self, engine: &mut GameEngine, slot: usize) {
        engine.advance_judgement_cut(slot);
    }

    fn key_press(&self, engine: &mut GameEngine, slot: usize, key: &str, _count: u32) {
        if key == get_controls(slot).special {
            engine.begin_judgement_cut(slot);
        }
    }

    fn key_presses(&self, engine: &mut GameEngine, slot: usize, key: &str, count: u32) {
        if count != 2 {
            return;
        }
        let controls = get_controls(slot);
        let p = &engine.players[slot];
        if let Some(dir) = controls.direction_of(key) {
            if p.dash_cooldown == 0 {
                engine.teleport_dash(slot, dir);
            }
        } else if key == controls.up {
            let ready = matches!(&p.kit, Kit::Vergil(kit) if kit.teleport_jump_cooldown == 0);
            if ready {
                engine.teleport_jump(slot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VergilKit;
    use crate::characters::Kit;
    use crate::constants::TICK_MS;
    use crate::engine::tests::{approx_eq, grounded_duel};
    use crate::engine::GameEngine;
    use crate::types::CharacterId;

    fn kit(engine: &GameEngine) -> &VergilKit {
        match &engine.players[0].kit {
            Kit::Vergil(kit) => kit,
            other => panic!("unexpected kit {other:?}"),
        }
    }

    fn double_tap(engine: &mut GameEngine, key: &str) {
        engine.key_down(key);
        engine.key_up(key);
        engine.key_down(key);
        engine.key_up(key);
    }

    #[test]
    fn teleport_dash_leaves_a_fading_trail() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        double_tap(&mut engine, "d");
        engine.step(TICK_MS);
        assert!(approx_eq(engine.players[0].vx, 15.6, 1e-9));
        let trail = kit(&engine).teleport_trail.as_ref().expect("trail");
        assert_eq!(trail.duration, 14);
        assert!(approx_eq(trail.alpha, 0.8 * 0.92, 1e-9));
        assert!(kit(&engine).is_teleporting);
        assert!(kit(&engine).teleport_alpha <= 0.5);
        assert_eq!(
            engine.players[0].animation.as_ref().and_then(|a| a.current()),
            Some("teleporting")
        );

        for _ in 0..30 {
            engine.step(TICK_MS);
        }
        assert!(kit(&engine).teleport_trail.is_none());
        assert!(!kit(&engine).is_teleporting);
        assert_eq!(kit(&engine).teleport_alpha, 1.0);
    }

    #[test]
    fn teleport_jump_has_its_own_cooldown() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        double_tap(&mut engine, "w");
        engine.step(TICK_MS);
        assert!(approx_eq(engine.players[0].vy, -16.5 + 0.7, 1e-9));
        assert_eq!(engine.players[0].jumps, 1);
        assert_eq!(kit(&engine).teleport_jump_cooldown, 59);

        engine.step(TICK_MS);
        double_tap(&mut engine, "w");
        engine.step(TICK_MS);
        assert_eq!(engine.players[0].jumps, 1);
    }

    #[test]
    fn running_switches_to_run_clip() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        engine.key_down("d");
        for _ in 0..3 {
            engine.step(TICK_MS);
        }
        assert_eq!(
            engine.players[0].animation.as_ref().and_then(|a| a.current()),
            Some("run")
        );
        engine.key_up("d");
        for _ in 0..10 {
            engine.step(TICK_MS);
        }
        assert_eq!(
            engine.players[0].animation.as_ref().and_then(|a| a.current()),
            Some("idle")
        );
    }
}
