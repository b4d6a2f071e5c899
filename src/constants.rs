pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const WIDTH: f64 = 900.0;
pub const HEIGHT: f64 = 600.0;
pub const FLOOR: f64 = HEIGHT - 30.0;
pub const PLATFORM_HEIGHT: f64 = 20.0;

pub const PLAYER_SIZE: f64 = 54.0;
pub const PLAYER_SPEED: f64 = 5.0;
pub const GRAVITY: f64 = 0.7;
pub const FRICTION: f64 = 0.7;
pub const JUMP_VEL: f64 = 15.0;
pub const MAX_JUMPS: u32 = 2;
pub const DASH_FRAMES: u32 = 8;
pub const DASH_SPEED: f64 = 13.0;
pub const DASH_COOLDOWN: u32 = 36;
pub const SLOW_FALL_MULTIPLIER: f64 = 0.16;
pub const PARALYZED_DAMPING: f64 = 0.92;
pub const PLATFORM_LANDING_TOLERANCE: f64 = 3.0;

pub const BLOCK_MAX: f64 = 100.0;
pub const BLOCK_DEPLETION: f64 = 1.8;
pub const BLOCK_RECOVERY: f64 = 0.8;
pub const BLOCK_PUSHBACK_X: f64 = 9.0;
pub const BLOCK_PUSHBACK_Y: f64 = -4.0;
pub const BLOCK_HIT_COST: f64 = 12.0;
pub const BLOCK_PARALYZE_FRAMES: u32 = 45;

pub const MAX_HP: i32 = 100;
pub const MAX_POINTS: i32 = 5;
pub const START_POINTS: i32 = 2;
pub const BLOCK_POINT_REWARD: i32 = 1;
pub const SMASH_POINT_COST: i32 = 1;
pub const DASH_DAMAGE: i32 = 10;
pub const HIT_FLASH_FRAMES: u32 = 10;

pub const MULTI_PRESS_WINDOW_MS: u64 = 300;
pub const INTRO_FRAMES: u32 = 180;

pub const CAMERA_PADDING: f64 = 80.0;
pub const CAMERA_MAX_ZOOM: f64 = 1.8;

pub const ZOOM_EFFECT_PEAK: f64 = 1.5;
pub const ZOOM_IN_MS: u64 = 6_300;
pub const ZOOM_HOLD_MS: u64 = 400;
pub const ZOOM_OUT_MS: u64 = 700;

pub const JUDGEMENT_CUT_CAST_DELAY_MS: u64 = 2_000;
pub const JUDGEMENT_CUT_RESUME_DELAY_MS: u64 = 9_500;
pub const JUDGEMENT_CUT_COOLDOWN: u32 = 120;
pub const JUDGEMENT_CUT_DAMAGE: f64 = 35.0;
pub const JUDGEMENT_CUT_RANGE: f64 = 500.0;
pub const JUDGEMENT_CUT_KNOCKBACK_X: f64 = 10.0;
pub const JUDGEMENT_CUT_KNOCKBACK_Y: f64 = -6.0;
pub const JUDGEMENT_CUT_LEADING_LINES: usize = 3;
pub const JUDGEMENT_CUT_LINE_INTERVAL_MS: u64 = 50;
pub const JUDGEMENT_CUT_REMAINING_LINES_DELAY_MS: u64 = 200;
pub const JUDGEMENT_CUT_LINE_DISPLAY_MS: u64 = 1_100;
pub const JUDGEMENT_CUT_SLIDE_START_MS: u64 = JUDGEMENT_CUT_LINE_DISPLAY_MS + 500;
pub const JUDGEMENT_CUT_SLIDE_DURATION_MS: u64 = 5_000;
pub const JUDGEMENT_CUT_SLIDE_SPEED: f64 = 2.0;
pub const JUDGEMENT_CUT_FALL_INITIAL_VY: f64 = -7.0;
pub const JUDGEMENT_CUT_FALL_VX_RANGE: f64 = 3.0;
pub const JUDGEMENT_CUT_FALL_MARGIN: f64 = 100.0;

/// Judgement Cut slash lines as fractions of the camera view: `(x1, y1, x2, y2)`.
pub const JUDGEMENT_CUT_LINES: [(f64, f64, f64, f64); 17] = [
    (0.0, 0.07, 1.0, 0.82),
    (0.0, 0.29, 1.0, 1.0),
    (0.0, 0.52, 0.82, 1.0),
    (0.0, 0.88, 1.0, 0.8),
    (0.0, 0.92, 1.0, 0.51),
    (0.16, 0.0, 1.0, 1.0),
    (0.22, 0.0, 1.0, 0.73),
    (0.3, 0.0, 1.0, 0.48),
    (0.0, 0.2, 1.0, 0.08),
    (0.0, 0.12, 1.0, 0.45),
    (0.0, 0.55, 1.0, 0.23),
    (0.0, 0.75, 1.0, 0.19),
    (0.0, 0.2, 0.55, 1.0),
    (0.0, 1.0, 1.0, 0.25),
    (0.73, 0.0, 1.0, 1.0),
    (1.0, 0.0, 0.34, 1.0),
    (1.0, 0.0, 0.03, 1.0),
];

pub const FIREBALL_COOLDOWN: u32 = 30;
pub const FIREBALL_SPEED: f64 = 10.0;
pub const FIREBALL_SIZE: f64 = 12.0;
pub const FIREBALL_DAMAGE: i32 = 3;
pub const FIRE_SHIELD_FRAMES: u32 = 180;
pub const FIRE_TRAIL_FRAMES: u32 = 20;
pub const FIRE_CHANNEL_MS: u64 = 800;
pub const FIRE_BURST_MS: u64 = 1_000;
pub const METEOR_CHANNEL_MS: u64 = 2_500;
pub const METEOR_SIZE: f64 = 20.0;
pub const METEOR_SPEED: f64 = 15.0;
pub const METEOR_DAMAGE: i32 = 25;
pub const METEOR_POINT_COST: i32 = 2;
pub const PROJECTILE_TRAIL_LEN: usize = 5;

pub const ZOMBIE_SPEED: f64 = 8.0;
pub const ZOMBIE_LATCH_FRAMES: u32 = 300;
pub const ZOMBIE_PARALYZE_FRAMES: u32 = 180;

pub const SMASH_FALL_SPEED: f64 = 20.0;
pub const SMASH_MAX_IMPACT_RADIUS: f64 = 120.0;
pub const SMASH_IMPACT_FRAMES: u32 = 20;
pub const SUPER_SMASH_HOLD_MS: u64 = 300;

pub const CHARGE_JUMP_HOLD_MS: u64 = 1_000;

pub const TELEPORT_TRAIL_FRAMES: u32 = 15;
pub const TELEPORT_JUMP_COOLDOWN: u32 = 60;

/// Impact power of a ground smash before the move's power multiplier,
/// scaled by the height the smasher falls from.
pub fn get_smash_impact_power(fall_height: f64) -> f64 {
    (fall_height / 8.0).clamp(15.0, 35.0)
}

/// Linear falloff used by every radial attack: full damage at the center,
/// zero at `range`.
pub fn get_falloff_damage(base: f64, distance: f64, range: f64) -> i32 {
    if range <= 0.0 || distance >= range {
        return 0;
    }
    (base * (1.0 - distance / range)).round() as i32
}
