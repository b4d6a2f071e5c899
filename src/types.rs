use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::world::Platform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterId {
    Default,
    Gold,
    Berry,
    Smasher,
    ZombieRider,
    FireMage,
    Vergil,
}

impl CharacterId {
    pub const ALL: [CharacterId; 7] = [
        CharacterId::Default,
        CharacterId::Gold,
        CharacterId::Berry,
        CharacterId::Smasher,
        CharacterId::ZombieRider,
        CharacterId::FireMage,
        CharacterId::Vergil,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "gold" => Some(Self::Gold),
            "berry" => Some(Self::Berry),
            "smasher" => Some(Self::Smasher),
            "zombie_rider" | "zombieRider" => Some(Self::ZombieRider),
            "fire_mage" | "fireMage" => Some(Self::FireMage),
            "vergil" => Some(Self::Vergil),
            _ => None,
        }
    }

    /// Unregistered ids fall back to the default fighter.
    pub fn resolve(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::Default)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Gold => "gold",
            Self::Berry => "berry",
            Self::Smasher => "smasher",
            Self::ZombieRider => "zombie_rider",
            Self::FireMage => "fire_mage",
            Self::Vergil => "vergil",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: crate::constants::WIDTH,
            height: crate::constants::HEIGHT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Camera {
    pub cx: f64,
    pub cy: f64,
    pub zoom: f64,
}

impl Camera {
    pub fn view_size(&self, viewport: Viewport) -> (f64, f64) {
        (viewport.width / self.zoom, viewport.height / self.zoom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgementCutPhase {
    Lines,
    Preparing,
    Slide,
    Fall,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Knockout,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    DashHit {
        attacker: usize,
        defender: usize,
        damage: i32,
    },
    DashBlocked {
        attacker: usize,
        defender: usize,
    },
    Damaged {
        source: usize,
        target: usize,
        damage: i32,
        cause: String,
    },
    AbilityUsed {
        #[serde(rename = "playerId")]
        player_id: usize,
        ability: String,
    },
    JudgementCutPhase {
        #[serde(rename = "playerId")]
        player_id: usize,
        phase: JudgementCutPhase,
    },
    GamePaused {
        reason: String,
    },
    GameResumed,
    CharacterSwitched {
        #[serde(rename = "playerId")]
        player_id: usize,
        character: CharacterId,
    },
    PlayerDefeated {
        #[serde(rename = "playerId")]
        player_id: usize,
    },
    Log {
        message: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub paused: bool,
    #[serde(rename = "pauseReason")]
    pub pause_reason: Option<String>,
    #[serde(rename = "introFramesLeft")]
    pub intro_frames_left: u32,
    pub ended: bool,
    pub winner: Option<usize>,
    pub camera: Camera,
    #[serde(rename = "zoomMultiplier")]
    pub zoom_multiplier: f64,
    pub players: Vec<Player>,
    pub platforms: Vec<Platform>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchSummary {
    pub reason: Option<GameOverReason>,
    pub winner: Option<usize>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub ticks: u64,
    pub hp: [i32; 2],
    pub points: [i32; 2],
    pub characters: [CharacterId; 2],
}
