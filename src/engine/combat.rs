use super::*;

impl GameEngine {
    /// Dash contact between the two fighters. A dash connects at most once;
    /// the latch clears when the dash runs out.
    pub(super) fn handle_dash_and_block_damage(&mut self) {
        if !self.players[0].alive || !self.players[1].alive {
            return;
        }
        for attacker in 0..2 {
            let defender = 1 - attacker;
            if self.players[attacker].dash > 0
                && !self.players[attacker].has_dash_hit
                && self.players[attacker]
                    .rect()
                    .overlaps(&self.players[defender].rect())
            {
                if self.players[defender].is_blocking_against(&self.players[attacker]) {
                    self.knockback(defender, attacker, BLOCK_PUSHBACK_X, BLOCK_PUSHBACK_Y);
                    self.players[defender].reduce_block(BLOCK_HIT_COST);
                    self.players[attacker].set_paralyzed(BLOCK_PARALYZE_FRAMES);
                    let total = self.players[defender].add_points(BLOCK_POINT_REWARD);
                    self.events.push(RuntimeEvent::DashBlocked { attacker, defender });
                    self.log(format!(
                        "{} gained 1 point for perfect block! (Total: {})",
                        self.players[defender].name, total
                    ));
                } else {
                    self.players[attacker].dashdmg = DASH_DAMAGE;
                    self.players[defender].take_damage(DASH_DAMAGE);
                    let total = self.players[attacker].add_points(1);
                    self.events.push(RuntimeEvent::DashHit {
                        attacker,
                        defender,
                        damage: DASH_DAMAGE,
                    });
                    self.log(format!(
                        "{} hit {} with DASH for {} damage! (+1 point, total: {})",
                        self.players[attacker].name,
                        self.players[defender].name,
                        DASH_DAMAGE,
                        total
                    ));
                }
                self.players[attacker].has_dash_hit = true;
            }
            if self.players[attacker].dash == 0 {
                self.players[attacker].has_dash_hit = false;
            }
        }
    }

    /// Marks fighters at zero hp as defeated and ends the match.
    pub(super) fn check_defeats(&mut self) {
        let mut defeated = Vec::new();
        for player in &mut self.players {
            if player.alive && player.hp <= 0 {
                player.alive = false;
                defeated.push(player.id);
            }
        }
        if defeated.is_empty() {
            return;
        }
        for &player_id in &defeated {
            self.events.push(RuntimeEvent::PlayerDefeated { player_id });
            let name = self.players[player_id].name.clone();
            self.log(format!("{name} has been defeated!"));
        }
        if !self.ended {
            self.ended = true;
            self.end_reason = Some(GameOverReason::Knockout);
            self.winner = self
                .players
                .iter()
                .find(|player| player.alive)
                .map(|player| player.id);
        }
    }

    /// Pushes `defender` away from `attacker`.
    pub(crate) fn knockback(&mut self, attacker: usize, defender: usize, sx: f64, sy: f64) {
        let attacker_x = self.players[attacker].x;
        self.players[defender].knock_back_from(attacker_x, sx, sy);
    }

    /// Ability damage: clamps hp, flashes the target and records the hit.
    pub(crate) fn hit_player(&mut self, source: usize, target: usize, damage: i32, cause: &str) {
        if damage <= 0 {
            return;
        }
        self.players[target].take_damage(damage);
        self.events.push(RuntimeEvent::Damaged {
            source,
            target,
            damage,
            cause: cause.to_string(),
        });
        self.log(format!(
            "{}'s {} hit {} for {} damage!",
            self.players[source].name, cause, self.players[target].name, damage
        ));
    }

    /// Living opponents of `slot` in roster order.
    pub(crate) fn opponents_of(&self, slot: usize) -> Vec<usize> {
        (0..self.players.len())
            .filter(|&idx| idx != slot && self.players[idx].alive)
            .collect()
    }

    /// Falloff damage around the caster's center with knockback on every
    /// opponent inside `range`. Returns how many opponents were caught.
    pub(crate) fn radial_burst(
        &mut self,
        slot: usize,
        range: f64,
        damage: f64,
        knockback: (f64, f64),
        cause: &str,
    ) -> usize {
        let (cx, cy) = self.players[slot].center();
        let mut hits = 0;
        for target in self.opponents_of(slot) {
            let (tx, ty) = self.players[target].center();
            let distance = (tx - cx).hypot(ty - cy);
            if distance >= range {
                continue;
            }
            let dealt = get_falloff_damage(damage, distance, range);
            self.hit_player(slot, target, dealt, cause);
            self.knockback(slot, target, knockback.0, knockback.1);
            hits += 1;
        }
        hits
    }
}
