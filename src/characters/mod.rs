use serde::Serialize;

use crate::animation::{AnimationClip, AnimationController};
use crate::engine::GameEngine;
use crate::player::Player;
use crate::types::CharacterId;
use crate::world::get_controls;

mod berry;
mod fire_mage;
mod gold;
mod smasher;
mod vergil;
mod zombie_rider;

pub use self::fire_mage::{FireMageKit, Projectile, ProjectileKind, Trail};
pub use self::smasher::SmasherKit;
pub use self::vergil::{JudgementCutEffect, Shard, VergilKit};
pub use self::zombie_rider::{Zombie, ZombieRiderKit};

/// Per-character transient state stored on the player.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Kit {
    Plain,
    Smasher(SmasherKit),
    ZombieRider(ZombieRiderKit),
    FireMage(FireMageKit),
    Vergil(VergilKit),
}

/// Behavior of a playable character. Handlers receive the engine and the
/// roster slot of the player they act for; any handler left at its default
/// keeps the base behavior.
pub trait Character: Sync {
    fn id(&self) -> CharacterId;

    fn name(&self) -> &'static str;

    fn color(&self) -> &'static str {
        "#808080"
    }

    fn sprites(&self) -> &'static [AnimationClip] {
        &[]
    }

    fn init(&self) -> Kit {
        Kit::Plain
    }

    /// Gameplay update, run inside the physics step before movement.
    fn update(&self, _engine: &mut GameEngine, _slot: usize) {}

    /// Cosmetic effects that keep animating while gameplay is paused.
    fn update_effects(&self, _engine: &mut GameEngine, _slot: usize) {}

    fn key_press(&self, _engine: &mut GameEngine, _slot: usize, _key: &str, _count: u32) {}

    fn key_presses(&self, engine: &mut GameEngine, slot: usize, key: &str, count: u32) {
        base_dash(engine, slot, key, count);
    }

    fn key_hold(&self, _engine: &mut GameEngine, _slot: usize, _key: &str, _duration_ms: u64) {}

    fn key_release(&self, _engine: &mut GameEngine, _slot: usize, _key: &str, _duration_ms: u64) {
    }
}

/// Double-tap left/right dash shared by every character.
pub fn base_dash(engine: &mut GameEngine, slot: usize, key: &str, count: u32) {
    let Some(dir) = get_controls(slot).direction_of(key) else {
        return;
    };
    if count == 2 && engine.players[slot].dash_cooldown == 0 {
        engine.dash(slot, dir, 1.0);
    }
}

struct Fighter;

impl Character for Fighter {
    fn id(&self) -> CharacterId {
        CharacterId::Default
    }

    fn name(&self) -> &'static str {
        "Fighter"
    }
}

pub fn character(id: CharacterId) -> &'static dyn Character {
    match id {
        CharacterId::Default => &Fighter,
        CharacterId::Gold => &gold::Gold,
        CharacterId::Berry => &berry::Berry,
        CharacterId::Smasher => &smasher::Smasher,
        CharacterId::ZombieRider => &zombie_rider::ZombieRider,
        CharacterId::FireMage => &fire_mage::FireMage,
        CharacterId::Vergil => &vergil::Vergil,
    }
}

/// Builds a fresh player for `char_id` in roster slot `slot`.
#[allow(clippy::too_many_arguments)]
pub fn create_player(
    slot: usize,
    name: String,
    char_id: CharacterId,
    x: f64,
    y: f64,
    facing: f64,
    incarnation: u64,
    now_ms: u64,
) -> Player {
    let behavior = character(char_id);
    let mut player = Player::new(slot, name, char_id, x, y, facing, incarnation);
    player.color = behavior.color();
    let sprites = behavior.sprites();
    if !sprites.is_empty() {
        player.animation = Some(AnimationController::new(sprites, now_ms));
    }
    player.kit = behavior.init();
    player
}

#[cfg(test)]
mod tests {
    use super::{character, create_player, Kit};
    use crate::types::CharacterId;

    #[test]
    fn registry_covers_every_id() {
        for id in CharacterId::ALL {
            assert_eq!(character(id).id(), id);
        }
        assert_eq!(character(CharacterId::resolve("ninja")).name(), "Fighter");
    }

    #[test]
    fn create_player_applies_character_setup() {
        let vergil = create_player(1, "Player 2".into(), CharacterId::Vergil, 10.0, 20.0, -1.0, 4, 0);
        assert_eq!(vergil.color, "#4a90e2");
        assert!(matches!(vergil.kit, Kit::Vergil(_)));
        assert_eq!(
            vergil.animation.as_ref().and_then(|a| a.current()),
            Some("idle")
        );

        let fighter = create_player(0, "Player 1".into(), CharacterId::Default, 0.0, 0.0, 1.0, 1, 0);
        assert!(matches!(fighter.kit, Kit::Plain));
        assert!(fighter.animation.is_none());
        assert_eq!(fighter.color, "#808080");
    }
}
