use super::*;

use crate::characters::{Projectile, ProjectileKind, Trail, Zombie};
use crate::constants::{
    get_smash_impact_power, FIREBALL_COOLDOWN, FIREBALL_DAMAGE, FIREBALL_SIZE, FIREBALL_SPEED,
    FIRE_SHIELD_FRAMES, METEOR_DAMAGE, METEOR_SIZE, METEOR_SPEED, SMASH_FALL_SPEED,
    TELEPORT_JUMP_COOLDOWN, TELEPORT_TRAIL_FRAMES, ZOMBIE_SPEED,
};

const FLAME_DASH_LIFT: f64 = 1.3;
const FLAME_DASH_SPEED: f64 = 8.0;
const FLAME_DASH_RANGE: f64 = 80.0;
const FLAME_DASH_DAMAGE: i32 = 8;
const TELEPORT_SPEED_MULTIPLIER: f64 = 1.2;
const TELEPORT_JUMP_MULTIPLIER: f64 = 1.1;

impl GameEngine {
    pub(super) fn ability_used(&mut self, slot: usize, ability: &str) {
        self.events.push(RuntimeEvent::AbilityUsed {
            player_id: slot,
            ability: ability.to_string(),
        });
    }

    pub fn dash(&mut self, slot: usize, dir: f64, speed_multiplier: f64) {
        let p = &mut self.players[slot];
        p.vx = dir * DASH_SPEED * speed_multiplier;
        p.dash = DASH_FRAMES;
        p.dash_cooldown = DASH_COOLDOWN;
        let message = format!(
            "{} dashes {}!",
            p.name,
            if dir > 0.0 { "right" } else { "left" }
        );
        self.ability_used(slot, "dash");
        self.log(message);
    }

    /// Launches straight up. A non-zero `cost` must be affordable.
    pub fn super_jump(&mut self, slot: usize, multiplier: f64, cost: i32) -> bool {
        let p = &mut self.players[slot];
        if cost > 0 {
            if p.points < cost {
                return false;
            }
            p.add_points(-cost);
        }
        p.vy = -JUMP_VEL * multiplier;
        self.ability_used(slot, "super_jump");
        true
    }

    /// Airborne dive; impact power grows with the height it starts from.
    pub fn ground_smash(&mut self, slot: usize, power: f64, cost: i32) -> bool {
        let p = &mut self.players[slot];
        let fall_height = FLOOR - p.bottom();
        let on_ground = p.on_ground;
        let affordable = p.points >= cost;
        let Kit::Smasher(kit) = &mut p.kit else {
            return false;
        };
        if on_ground || kit.is_smashing || !affordable {
            return false;
        }
        kit.is_smashing = true;
        kit.smash_impact_power = get_smash_impact_power(fall_height) * power;
        p.vy = SMASH_FALL_SPEED;
        p.vx = 0.0;
        p.add_points(-cost);
        self.ability_used(slot, "ground_smash");
        true
    }

    pub fn throw_fireball(&mut self, slot: usize) -> bool {
        let p = &mut self.players[slot];
        let x = p.x + if p.facing > 0.0 { p.w } else { -10.0 };
        let y = p.y + p.h / 2.0;
        let vx = p.facing * FIREBALL_SPEED;
        let Kit::FireMage(kit) = &mut p.kit else {
            return false;
        };
        if kit.fireball_cooldown > 0 {
            return false;
        }
        kit.fireballs.push(Projectile {
            kind: ProjectileKind::Fireball,
            x,
            y,
            vx,
            vy: 0.0,
            w: FIREBALL_SIZE,
            h: FIREBALL_SIZE,
            damage: FIREBALL_DAMAGE,
            trail: Vec::new(),
        });
        kit.fireball_cooldown = FIREBALL_COOLDOWN;
        let message = format!("{} throws a fireball!", p.name);
        self.ability_used(slot, "fireball");
        self.log(message);
        true
    }

    pub fn fire_shield(&mut self, slot: usize, cost: i32) -> bool {
        let p = &mut self.players[slot];
        if p.points < cost {
            return false;
        }
        p.add_points(-cost);
        let Kit::FireMage(kit) = &mut p.kit else {
            return false;
        };
        kit.fire_shield = FIRE_SHIELD_FRAMES;
        self.ability_used(slot, "fire_shield");
        true
    }

    /// Grounded leap forward that scorches opponents close by.
    pub fn flame_dash(&mut self, slot: usize, cost: i32) -> bool {
        let p = &mut self.players[slot];
        if p.points < cost || !p.on_ground {
            return false;
        }
        p.add_points(-cost);
        p.vy = -JUMP_VEL * FLAME_DASH_LIFT;
        p.vx = p.facing * FLAME_DASH_SPEED;
        let caster_x = p.x;
        for target in self.opponents_of(slot) {
            if (self.players[target].x - caster_x).abs() < FLAME_DASH_RANGE {
                self.hit_player(slot, target, FLAME_DASH_DAMAGE, "flame dash");
                self.knockback(slot, target, 3.0, -2.0);
            }
        }
        self.ability_used(slot, "flame_dash");
        true
    }

    pub fn fire_burst(&mut self, slot: usize, range: f64, damage: f64) -> bool {
        self.ability_used(slot, "fire_burst");
        self.radial_burst(slot, range, damage, (5.0, -3.0), "fire burst") > 0
    }

    pub fn meteor_strike(&mut self, slot: usize, cost: i32) -> bool {
        let p = &mut self.players[slot];
        if p.points < cost {
            return false;
        }
        p.add_points(-cost);
        let x = p.x + p.w / 2.0;
        let message = format!("{} calls down a METEOR STRIKE! (-{cost} points)", p.name);
        let Kit::FireMage(kit) = &mut p.kit else {
            return false;
        };
        kit.fireballs.push(Projectile {
            kind: ProjectileKind::Meteor,
            x,
            y: -50.0,
            vx: 0.0,
            vy: METEOR_SPEED,
            w: METEOR_SIZE,
            h: METEOR_SIZE,
            damage: METEOR_DAMAGE,
            trail: Vec::new(),
        });
        self.ability_used(slot, "meteor_strike");
        self.log(message);
        true
    }

    /// Fires the rider's zombie. Only one zombie can be out at a time.
    pub fn launch_zombie(&mut self, slot: usize) -> bool {
        let p = &mut self.players[slot];
        let zombie = Zombie {
            x: p.x + if p.facing > 0.0 { p.w } else { -20.0 },
            y: p.y,
            vx: p.facing * ZOMBIE_SPEED,
            vy: -2.0,
            w: p.w * 0.6,
            h: p.h * 0.6,
            running: true,
            on_ground: false,
        };
        let Kit::ZombieRider(kit) = &mut p.kit else {
            return false;
        };
        if kit.is_fired {
            return false;
        }
        kit.is_fired = true;
        kit.zombie = Some(zombie);
        self.ability_used(slot, "zombie");
        self.log("Raaaaaahhh".to_string());
        true
    }

    fn leave_teleport_trail(&mut self, slot: usize) {
        let p = &mut self.players[slot];
        let (x, y) = (p.x, p.y);
        if let Kit::Vergil(kit) = &mut p.kit {
            kit.teleport_trail = Some(Trail {
                x,
                y,
                duration: TELEPORT_TRAIL_FRAMES,
                alpha: 0.8,
            });
            kit.is_teleporting = true;
            kit.teleport_alpha = 0.3;
        }
    }

    pub fn teleport_dash(&mut self, slot: usize, dir: f64) {
        self.leave_teleport_trail(slot);
        let p = &mut self.players[slot];
        p.vx = dir * DASH_SPEED * TELEPORT_SPEED_MULTIPLIER;
        p.dash = DASH_FRAMES;
        p.dash_cooldown = DASH_COOLDOWN;
        let message = format!("{} teleports through the shadows!", p.name);
        self.ability_used(slot, "teleport_dash");
        self.log(message);
    }

    pub fn teleport_jump(&mut self, slot: usize) {
        self.leave_teleport_trail(slot);
        let p = &mut self.players[slot];
        p.vy = -JUMP_VEL * TELEPORT_JUMP_MULTIPLIER;
        p.jumps += 1;
        if let Kit::Vergil(kit) = &mut p.kit {
            kit.teleport_jump_cooldown = TELEPORT_JUMP_COOLDOWN;
        }
        let message = format!("{} teleports upward!", p.name);
        self.ability_used(slot, "teleport_jump");
        self.log(message);
    }
}

#[cfg(test)]
mod tests {
    use crate::characters::Kit;
    use crate::constants::{DASH_COOLDOWN, DASH_FRAMES, FLOOR, JUMP_VEL, PLAYER_SIZE};
    use crate::engine::tests::{approx_eq, grounded_duel};
    use crate::types::CharacterId;

    #[test]
    fn dash_sets_speed_frames_and_cooldown() {
        let mut engine = grounded_duel(CharacterId::Default, CharacterId::Default);
        engine.dash(0, -1.0, 1.2);
        let p = &engine.players[0];
        assert!(approx_eq(p.vx, -15.6, 1e-9));
        assert_eq!(p.dash, DASH_FRAMES);
        assert_eq!(p.dash_cooldown, DASH_COOLDOWN);
    }

    #[test]
    fn super_jump_requires_points_only_when_it_costs() {
        let mut engine = grounded_duel(CharacterId::Default, CharacterId::Default);
        engine.players[0].points = 0;
        assert!(!engine.super_jump(0, 2.0, 1));
        assert_eq!(engine.players[0].vy, 0.0);
        assert!(engine.super_jump(0, 1.5, 0));
        assert!(approx_eq(engine.players[0].vy, -JUMP_VEL * 1.5, 1e-9));
    }

    #[test]
    fn ground_smash_scales_with_height_and_spends_points() {
        let mut engine = grounded_duel(CharacterId::Smasher, CharacterId::Default);
        assert!(!engine.ground_smash(0, 1.0, 1));

        engine.players[0].on_ground = false;
        engine.players[0].y = FLOOR - PLAYER_SIZE - 200.0;
        assert!(engine.ground_smash(0, 1.5, 2));
        let p = &engine.players[0];
        assert_eq!(p.points, 0);
        assert_eq!((p.vx, p.vy), (0.0, 20.0));
        let Kit::Smasher(kit) = &p.kit else {
            panic!("smasher kit");
        };
        assert!(kit.is_smashing);
        assert!(approx_eq(kit.smash_impact_power, 25.0 * 1.5, 1e-9));
        assert!(!engine.ground_smash(0, 1.0, 0));
    }

    #[test]
    fn ground_smash_needs_a_smasher() {
        let mut engine = grounded_duel(CharacterId::Default, CharacterId::Default);
        engine.players[0].on_ground = false;
        assert!(!engine.ground_smash(0, 1.0, 1));
        assert_eq!(engine.players[0].points, 2);
    }

    #[test]
    fn flame_dash_burns_only_nearby_opponents() {
        let mut engine = grounded_duel(CharacterId::FireMage, CharacterId::Default);
        engine.players[1].x = engine.players[0].x + 70.0;
        assert!(engine.flame_dash(0, 0));
        assert_eq!(engine.players[1].hp, 92);
        assert!(approx_eq(engine.players[0].vy, -19.5, 1e-9));
        assert_eq!(engine.players[0].vx, 8.0);

        engine.players[0].on_ground = false;
        assert!(!engine.flame_dash(0, 0));
    }

    #[test]
    fn zombie_launch_is_single_shot() {
        let mut engine = grounded_duel(CharacterId::ZombieRider, CharacterId::Default);
        assert!(engine.launch_zombie(0));
        assert!(!engine.launch_zombie(0));
        let Kit::ZombieRider(kit) = &engine.players[0].kit else {
            panic!("zombie kit");
        };
        let zombie = kit.zombie.as_ref().expect("zombie out");
        assert_eq!(zombie.x, engine.players[0].x + PLAYER_SIZE);
        assert_eq!(zombie.vx, 8.0);
    }
}
