use std::collections::HashSet;

use serde::Serialize;

use crate::animation::AnimationController;
use crate::characters::Kit;
use crate::constants::{BLOCK_MAX, HIT_FLASH_FRAMES, MAX_HP, MAX_POINTS, PLAYER_SIZE, START_POINTS};
use crate::geometry::Rect;
use crate::types::CharacterId;

/// One fighter. Resource fields are only changed through the mutators
/// below so they always stay inside their ranges.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: usize,
    pub name: String,
    pub char_id: CharacterId,
    pub color: &'static str,

    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub w: f64,
    pub h: f64,
    /// `1.0` facing right, `-1.0` facing left.
    pub facing: f64,

    pub hp: i32,
    pub alive: bool,
    pub points: i32,
    pub just_hit: u32,
    pub dashdmg: i32,

    pub on_ground: bool,
    pub jumps: u32,
    pub jump_held: bool,
    pub dash: u32,
    pub dash_cooldown: u32,
    pub movement: bool,

    pub block: f64,
    pub blocking: bool,
    pub was_blocking: bool,

    pub is_paralyzed: bool,
    pub paralyze_timer: u32,
    pub dizzy: u32,
    pub has_dash_hit: bool,
    #[serde(skip)]
    pub charging_logged: HashSet<String>,

    pub animation: Option<AnimationController>,
    pub animation_override: bool,
    /// Bumped every time the roster slot gets a fresh character.
    pub incarnation: u64,
    pub kit: Kit,
}

impl Player {
    pub fn new(
        id: usize,
        name: String,
        char_id: CharacterId,
        x: f64,
        y: f64,
        facing: f64,
        incarnation: u64,
    ) -> Self {
        Self {
            id,
            name,
            char_id,
            color: "#808080",
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            w: PLAYER_SIZE,
            h: PLAYER_SIZE,
            facing,
            hp: MAX_HP,
            alive: true,
            points: START_POINTS,
            just_hit: 0,
            dashdmg: 0,
            on_ground: false,
            jumps: 0,
            jump_held: false,
            dash: 0,
            dash_cooldown: 0,
            movement: true,
            block: BLOCK_MAX,
            blocking: false,
            was_blocking: false,
            is_paralyzed: false,
            paralyze_timer: 0,
            dizzy: 0,
            has_dash_hit: false,
            charging_logged: HashSet::new(),
            animation: None,
            animation_override: false,
            incarnation,
            kit: Kit::Plain,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        self.rect().center()
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Adds `delta` points, clamped to `[0, MAX_POINTS]`. Returns the new total.
    pub fn add_points(&mut self, delta: i32) -> i32 {
        self.points = (self.points + delta).clamp(0, MAX_POINTS);
        self.points
    }

    /// Applies damage, clamps hp and starts the hit flash. Returns the hp left.
    pub fn take_damage(&mut self, damage: i32) -> i32 {
        self.hp = (self.hp - damage).clamp(0, MAX_HP);
        self.just_hit = HIT_FLASH_FRAMES;
        self.hp
    }

    pub fn reduce_block(&mut self, amount: f64) {
        self.block = (self.block - amount).max(0.0);
    }

    pub fn add_block(&mut self, amount: f64) {
        self.block = (self.block + amount).min(BLOCK_MAX);
    }

    pub fn set_paralyzed(&mut self, frames: u32) {
        self.is_paralyzed = true;
        self.paralyze_timer = frames;
        self.movement = false;
    }

    /// Sends this player away from `attacker_x`.
    pub fn knock_back_from(&mut self, attacker_x: f64, strength_x: f64, strength_y: f64) {
        let dir = if self.x < attacker_x { -1.0 } else { 1.0 };
        self.vx = dir * strength_x.abs();
        self.vy = strength_y;
    }

    /// A block only stops attacks from an opponent facing the blocker.
    pub fn is_blocking_against(&self, attacker: &Player) -> bool {
        self.blocking && self.block > 0.0 && self.facing == -attacker.facing
    }

    pub fn set_animation(&mut self, name: &str, now_ms: u64) -> bool {
        if self.animation_override {
            return false;
        }
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };
        let restart = animation.current() != Some(name);
        animation.play(name, restart, now_ms)
    }

    pub fn update_animation(&mut self, now_ms: u64) {
        if let Some(animation) = self.animation.as_mut() {
            animation.update(now_ms);
        }
    }
}
