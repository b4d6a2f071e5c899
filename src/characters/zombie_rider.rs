use serde::Serialize;

use super::{Character, Kit};
use crate::constants::{FLOOR, GRAVITY, HEIGHT, WIDTH, ZOMBIE_LATCH_FRAMES, ZOMBIE_PARALYZE_FRAMES};
use crate::engine::GameEngine;
use crate::geometry::Rect;
use crate::types::CharacterId;
use crate::world::{get_controls, Platform};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zombie {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub w: f64,
    pub h: f64,
    pub running: bool,
    pub on_ground: bool,
}

impl Zombie {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }

    /// Runs under gravity and lands on the floor or the first platform
    /// it drops onto.
    fn run(&mut self, platforms: &[Platform]) {
        self.vy += GRAVITY;
        self.x += self.vx;
        self.y += self.vy;

        self.on_ground = false;
        if self.y + self.h >= FLOOR {
            self.y = FLOOR - self.h;
            self.vy = 0.0;
            self.on_ground = true;
        }
        for platform in platforms {
            if self.vy >= 0.0
                && self.x + self.w > platform.x
                && self.x < platform.x + platform.w
                && self.y + self.h > platform.y
                && self.y + self.h - self.vy <= platform.y + platform.height()
            {
                self.y = platform.y - self.h;
                self.vy = 0.0;
                self.on_ground = true;
                break;
            }
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZombieRiderKit {
    pub is_fired: bool,
    pub zombie: Option<Zombie>,
    pub latched_opponent: Option<usize>,
    pub latch_time: u32,
}

pub(super) struct ZombieRider;

impl Character for ZombieRider {
    fn id(&self) -> CharacterId {
        CharacterId::ZombieRider
    }

    fn name(&self) -> &'static str {
        "Zombie Rider"
    }

    fn color(&self) -> &'static str {
        "#8BC34A"
    }

    fn init(&self) -> Kit {
        Kit::ZombieRider(ZombieRiderKit::default())
    }

    fn key_press(&self, engine: &mut GameEngine, slot: usize, key: &str, _count: u32) {
        if key == get_controls(slot).special {
            engine.launch_zombie(slot);
        }
    }

    fn update(&self, engine: &mut GameEngine, slot: usize) {
        let (mut zombie, mut latched, mut latch_time) = match &mut engine.players[slot].kit {
            Kit::ZombieRider(kit) => (kit.zombie.take(), kit.latched_opponent, kit.latch_time),
            _ => return,
        };

        if latched.is_none() {
            if let Some(z) = zombie.as_mut() {
                if z.running {
                    z.run(&engine.platforms);
                }
                let victim = engine
                    .opponents_of(slot)
                    .into_iter()
                    .find(|&target| z.rect().overlaps(&engine.players[target].rect()));
                if let Some(target) = victim {
                    latched = Some(target);
                    latch_time = ZOMBIE_LATCH_FRAMES;
                    z.running = false;
                    engine.players[target].set_paralyzed(ZOMBIE_PARALYZE_FRAMES);
                    engine.log(format!(
                        "{}'s zombie latched onto {} and paralyzed them!",
                        engine.players[slot].name, engine.players[target].name
                    ));
                }
            }
            if zombie.as_ref().is_some_and(|z| z.x < 0.0 || z.x + z.w > WIDTH) {
                engine.log("Zombie projectile hit a wall and disappeared!".to_string());
                zombie = None;
            }
            if zombie.as_ref().is_some_and(|z| z.y > HEIGHT) {
                engine.log("Zombie fell off the screen!".to_string());
                zombie = None;
            }
        }

        if let Some(target) = latched.filter(|_| latch_time > 0) {
            latch_time -= 1;
            let victim = &engine.players[target];
            if let Some(z) = zombie.as_mut() {
                z.x = victim.x + victim.w / 2.0 - z.w / 2.0;
                z.y = victim.y - z.h / 2.0;
            }
            if latch_time == 0 {
                let message = format!("Zombie detached from {}", victim.name);
                engine.log(message);
                zombie = None;
                latched = None;
            }
        }

        let Kit::ZombieRider(kit) = &mut engine.players[slot].kit else {
            return;
        };
        if zombie.is_none() && latch_time == 0 {
            kit.is_fired = false;
            latched = None;
        }
        kit.zombie = zombie;
        kit.latched_opponent = latched;
        kit.latch_time = latch_time;
    }
}
