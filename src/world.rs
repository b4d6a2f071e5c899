use serde::Serialize;

use crate::constants::{FLOOR, PLATFORM_HEIGHT, WIDTH};
use crate::types::CharacterId;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Platform {
    pub x: f64,
    pub y: f64,
    pub w: f64,
}

impl Platform {
    pub fn height(&self) -> f64 {
        PLATFORM_HEIGHT
    }
}

/// Fixed stage layout: a center step, two high ledges and two low ledges.
pub fn stage_platforms() -> Vec<Platform> {
    vec![
        Platform {
            x: WIDTH / 2.0 - 70.0,
            y: FLOOR - 90.0,
            w: 140.0,
        },
        Platform {
            x: WIDTH / 4.0 - 60.0,
            y: FLOOR - 180.0,
            w: 120.0,
        },
        Platform {
            x: 3.0 * WIDTH / 4.0 - 60.0,
            y: FLOOR - 180.0,
            w: 120.0,
        },
        Platform {
            x: 60.0,
            y: FLOOR - 60.0,
            w: 120.0,
        },
        Platform {
            x: WIDTH - 180.0,
            y: FLOOR - 60.0,
            w: 120.0,
        },
    ]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub left: &'static str,
    pub right: &'static str,
    pub up: &'static str,
    pub down: &'static str,
    pub special: &'static str,
}

impl Controls {
    /// Horizontal direction bound to `key`, if any.
    pub fn direction_of(&self, key: &str) -> Option<f64> {
        if key == self.left {
            Some(-1.0)
        } else if key == self.right {
            Some(1.0)
        } else {
            None
        }
    }
}

pub fn get_controls(player_id: usize) -> Controls {
    if player_id == 0 {
        Controls {
            left: "a",
            right: "d",
            up: "w",
            down: "s",
            special: "e",
        }
    } else {
        Controls {
            left: "k",
            right: ";",
            up: "o",
            down: "l",
            special: "p",
        }
    }
}

/// Number-row shortcuts that swap a roster slot's character.
pub fn character_hotkey(key: &str) -> Option<(usize, CharacterId)> {
    let (slot, name) = match key {
        "1" => (0, "gold"),
        "2" => (0, "berry"),
        "3" => (0, "smasher"),
        "4" => (1, "ninja"),
        "7" => (1, "gold"),
        "8" => (1, "berry"),
        "9" => (1, "smasher"),
        "0" => (1, "ninja"),
        _ => return None,
    };
    Some((slot, CharacterId::resolve(name)))
}

/// Lowercases host key names so `"A"` and `"a"` share one key record.
pub fn normalize_key(raw: &str) -> String {
    raw.to_lowercase()
}
