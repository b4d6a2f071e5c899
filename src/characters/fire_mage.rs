use serde::Serialize;

use super::{Character, Kit};
use crate::animation::AnimationClip;
use crate::constants::{
    get_falloff_damage, FIRE_BURST_MS, FIRE_CHANNEL_MS, FIRE_TRAIL_FRAMES, FLOOR, GRAVITY, HEIGHT,
    METEOR_CHANNEL_MS, METEOR_POINT_COST, PROJECTILE_TRAIL_LEN, WIDTH,
};
use crate::engine::GameEngine;
use crate::geometry::{Point, Rect};
use crate::types::CharacterId;
use crate::world::get_controls;

const SPRITES: &[AnimationClip] = &[
    AnimationClip::looping("idle", 4, 250),
    AnimationClip::looping("casting", 3, 150),
    AnimationClip::looping("walking", 6, 120),
];

const FIRE_DASH_MULTIPLIER: f64 = 1.2;
const FIRE_BURST_RANGE: f64 = 120.0;
const FIRE_BURST_DAMAGE: f64 = 18.0;
const METEOR_SPLASH_RANGE: f64 = 60.0;
const METEOR_SPLASH_DAMAGE: f64 = 10.0;
const METEOR_IMPACT_RANGE: f64 = 80.0;
const METEOR_IMPACT_DAMAGE: f64 = 15.0;
const OFFSCREEN_MARGIN: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Fireball,
    Meteor,
}

#[derive(Clone, Debug, Serialize)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub w: f64,
    pub h: f64,
    pub damage: i32,
    /// Last few positions, oldest first.
    pub trail: Vec<Point>,
}

impl Projectile {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }

    fn is_offscreen(&self) -> bool {
        self.x < -OFFSCREEN_MARGIN || self.x > WIDTH + OFFSCREEN_MARGIN || self.y > HEIGHT + OFFSCREEN_MARGIN
    }
}

/// Fading after-image left behind by a dash.
#[derive(Clone, Debug, Serialize)]
pub struct Trail {
    pub x: f64,
    pub y: f64,
    pub duration: u32,
    pub alpha: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireMageKit {
    pub fireballs: Vec<Projectile>,
    pub fireball_cooldown: u32,
    pub is_channeling: bool,
    pub fire_shield: u32,
    pub fire_trail: Option<Trail>,
    pub charge_time: u64,
}

pub(super) struct FireMage;

impl FireMage {
    /// Moves one projectile and resolves its hits. Returns false once the
    /// projectile is spent.
    fn advance_projectile(engine: &mut GameEngine, slot: usize, projectile: &mut Projectile) -> bool {
        projectile.x += projectile.vx;
        projectile.y += projectile.vy;
        let is_meteor = projectile.kind == ProjectileKind::Meteor;
        if is_meteor {
            projectile.vy += GRAVITY * 0.5;
        }
        projectile.trail.push((projectile.x, projectile.y));
        if projectile.trail.len() > PROJECTILE_TRAIL_LEN {
            projectile.trail.remove(0);
        }

        let opponents = engine.opponents_of(slot);
        let struck = opponents
            .iter()
            .copied()
            .find(|&target| projectile.rect().overlaps(&engine.players[target].rect()));
        if let Some(target) = struck {
            if is_meteor {
                engine.hit_player(slot, target, projectile.damage, "METEOR");
                engine.knockback(slot, target, 12.0, -8.0);
                for &other in opponents.iter().filter(|&&other| other != target) {
                    let distance = (engine.players[other].x - projectile.x).abs();
                    let splash = get_falloff_damage(METEOR_SPLASH_DAMAGE, distance, METEOR_SPLASH_RANGE);
                    engine.hit_player(slot, other, splash, "meteor splash");
                }
            } else {
                engine.hit_player(slot, target, projectile.damage, "fireball");
                engine.knockback(slot, target, 3.0, -2.0);
            }
            return false;
        }

        if is_meteor && projectile.y + projectile.h >= FLOOR {
            for target in opponents {
                let distance = (engine.players[target].x - projectile.x).abs();
                if distance < METEOR_IMPACT_RANGE {
                    let damage = get_falloff_damage(METEOR_IMPACT_DAMAGE, distance, METEOR_IMPACT_RANGE);
                    engine.hit_player(slot, target, damage, "meteor impact");
                    engine.knockback(slot, target, 8.0, -5.0);
                }
            }
            return false;
        }

        !projectile.is_offscreen()
    }
}

impl Character for FireMage {
    fn id(&self) -> CharacterId {
        CharacterId::FireMage
    }

    fn name(&self) -> &'static str {
        "Fire Mage"
    }

    fn color(&self) -> &'static str {
        "#e74c3c"
    }

    fn sprites(&self) -> &'static [AnimationClip] {
        SPRITES
    }

    fn init(&self) -> Kit {
        Kit::FireMage(FireMageKit::default())
    }

    fn key_press(&self, engine: &mut GameEngine, slot: usize, key: &str, _count: u32) {
        let controls = get_controls(slot);
        if key == controls.special {
            engine.throw_fireball(slot);
        }
        if key == controls.down && engine.players[slot].on_ground {
            engine.fire_shield(slot, 0);
        }
        if key == controls.up {
            engine.flame_dash(slot, 0);
        }
    }

    fn key_presses(&self, engine: &mut GameEngine, slot: usize, key: &str, count: u32) {
        let Some(dir) = get_controls(slot).direction_of(key) else {
            return;
        };
        if count != 2 || engine.players[slot].dash_cooldown > 0 {
            return;
        }
        engine.dash(slot, dir, FIRE_DASH_MULTIPLIER);
        let p = &mut engine.players[slot];
        let trail = Trail {
            x: p.x,
            y: p.y,
            duration: FIRE_TRAIL_FRAMES,
            alpha: 1.0,
        };
        let message = format!("{} dashes with fire trail!", p.name);
        if let Kit::FireMage(kit) = &mut p.kit {
            kit.fire_trail = Some(trail);
        }
        engine.log(message);
    }

    fn key_hold(&self, engine: &mut GameEngine, slot: usize, key: &str, duration_ms: u64) {
        if key != get_controls(slot).special || duration_ms <= FIRE_CHANNEL_MS {
            return;
        }
        let now_ms = engine.now_ms();
        let p = &mut engine.players[slot];
        if !p.charging_logged.insert(key.to_string()) {
            return;
        }
        if let Kit::FireMage(kit) = &mut p.kit {
            kit.is_channeling = true;
            kit.charge_time = duration_ms;
        }
        p.set_animation("casting", now_ms);
        let message = format!("{} channels fire magic...", p.name);
        engine.log(message);
    }

    fn key_release(&self, engine: &mut GameEngine, slot: usize, key: &str, duration_ms: u64) {
        if key != get_controls(slot).special {
            return;
        }
        let Kit::FireMage(kit) = &mut engine.players[slot].kit else {
            return;
        };
        if !kit.is_channeling {
            return;
        }
        kit.is_channeling = false;
        kit.charge_time = 0;

        if duration_ms > METEOR_CHANNEL_MS {
            engine.meteor_strike(slot, METEOR_POINT_COST);
        } else if duration_ms > FIRE_BURST_MS {
            engine.fire_burst(slot, FIRE_BURST_RANGE, FIRE_BURST_DAMAGE);
        }
        let now_ms = engine.now_ms();
        engine.players[slot].set_animation("idle", now_ms);
    }

    fn update(&self, engine: &mut GameEngine, slot: usize) {
        let mut projectiles = match &mut engine.players[slot].kit {
            Kit::FireMage(kit) => {
                kit.fireball_cooldown = kit.fireball_cooldown.saturating_sub(1);
                kit.fire_shield = kit.fire_shield.saturating_sub(1);
                if let Some(trail) = kit.fire_trail.as_mut() {
                    trail.duration = trail.duration.saturating_sub(1);
                    if trail.duration == 0 {
                        kit.fire_trail = None;
                    }
                }
                std::mem::take(&mut kit.fireballs)
            }
            _ => return,
        };
        projectiles.retain_mut(|projectile| Self::advance_projectile(engine, slot, projectile));

        let now_ms = engine.now_ms();
        let p = &mut engine.players[slot];
        let Kit::FireMage(kit) = &mut p.kit else {
            return;
        };
        kit.fireballs = projectiles;
        if !kit.is_channeling {
            let walking = p.vx.abs() > 0.5 && p.on_ground;
            p.set_animation(if walking { "walking" } else { "idle" }, now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FireMageKit, ProjectileKind};
    use crate::characters::Kit;
    use crate::constants::TICK_MS;
    use crate::engine::tests::{approx_eq, grounded_duel};
    use crate::engine::GameEngine;
    use crate::types::CharacterId;

    fn kit(engine: &GameEngine) -> &FireMageKit {
        match &engine.players[0].kit {
            Kit::FireMage(kit) => kit,
            other => panic!("unexpected kit {other:?}"),
        }
    }

    fn hold(engine: &mut GameEngine, key: &str, frames: u32) {
        engine.key_down(key);
        for _ in 0..frames {
            engine.step(TICK_MS);
        }
        engine.key_up(key);
    }

    #[test]
    fn fireball_flies_and_hits_once() {
        let mut engine = grounded_duel(CharacterId::FireMage, CharacterId::Default);
        engine.key_down("e");
        engine.key_up("e");
        assert_eq!(kit(&engine).fireballs.len(), 1);
        assert_eq!(kit(&engine).fireballs[0].kind, ProjectileKind::Fireball);
        engine.key_down("e");
        engine.key_up("e");
        assert_eq!(kit(&engine).fireballs.len(), 1);

        for _ in 0..40 {
            engine.step(TICK_MS);
        }
        assert_eq!(engine.players[1].hp, 97);
        assert!(kit(&engine).fireballs.is_empty());
    }

    #[test]
    fn trail_keeps_last_five_positions() {
        let mut engine = grounded_duel(CharacterId::FireMage, CharacterId::Default);
        engine.players[1].x = 10.0;
        engine.key_down("e");
        engine.key_up("e");
        for _ in 0..8 {
            engine.step(TICK_MS);
        }
        let fireball = &kit(&engine).fireballs[0];
        assert_eq!(fireball.trail.len(), 5);
        assert_eq!(fireball.trail[4], (fireball.x, fireball.y));
    }

    #[test]
    fn medium_channel_releases_fire_burst() {
        let mut engine = grounded_duel(CharacterId::FireMage, CharacterId::Default);
        engine.players[1].x = engine.players[0].x - 60.0;
        hold(&mut engine, "e", 70);
        assert_eq!(engine.players[1].hp, 91);
        assert_eq!(engine.players[1].vx, -5.0);
        assert!(!kit(&engine).is_channeling);
        assert_eq!(
            engine.players[0].animation.as_ref().and_then(|a| a.current()),
            Some("idle")
        );
    }

    #[test]
    fn long_channel_drops_a_meteor() {
        let mut engine = grounded_duel(CharacterId::FireMage, CharacterId::Default);
        engine.players[1].x = engine.players[0].x;
        engine.key_down("e");
        for _ in 0..100 {
            engine.step(TICK_MS);
        }
        assert!(kit(&engine).is_channeling);
        assert_eq!(
            engine.players[0].animation.as_ref().and_then(|a| a.current()),
            Some("casting")
        );
        for _ in 0..60 {
            engine.step(TICK_MS);
        }
        engine.key_up("e");
        assert_eq!(engine.players[0].points, 0);
        assert!(kit(&engine)
            .fireballs
            .iter()
            .any(|p| p.kind == ProjectileKind::Meteor));
        for _ in 0..40 {
            engine.step(TICK_MS);
        }
        assert_eq!(engine.players[1].hp, 75);
        assert!(kit(&engine).fireballs.is_empty());
    }

    #[test]
    fn shield_and_fire_trail_dash() {
        let mut engine = grounded_duel(CharacterId::FireMage, CharacterId::Default);
        engine.key_down("s");
        engine.key_up("s");
        assert_eq!(kit(&engine).fire_shield, 180);

        engine.key_down("d");
        engine.key_up("d");
        engine.key_down("d");
        engine.step(TICK_MS);
        assert!(approx_eq(engine.players[0].vx, 15.6, 1e-9));
        assert_eq!(kit(&engine).fire_trail.as_ref().map(|t| t.duration), Some(19));
        assert_eq!(kit(&engine).fire_shield, 179);
    }
}
