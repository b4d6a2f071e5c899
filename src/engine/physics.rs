use super::*;

impl GameEngine {
    pub(super) fn update_player(&mut self, slot: usize, now_ms: u64) {
        if !self.players[slot].alive {
            return;
        }

        character(self.players[slot].char_id).update(self, slot);
        self.players[slot].update_animation(now_ms);

        if self.players[slot].is_paralyzed {
            let p = &mut self.players[slot];
            p.vx *= PARALYZED_DAMPING;
            p.vy += GRAVITY;
            p.paralyze_timer = p.paralyze_timer.saturating_sub(1);
            if p.paralyze_timer == 0 {
                p.is_paralyzed = false;
                p.movement = true;
            }
            p.x += p.vx;
            p.y += p.vy;
            self.collide_with_stage(slot);
            return;
        }

        if self.update_blocking(slot) {
            return;
        }
        if !self.players[slot].movement {
            return;
        }

        let controls = get_controls(slot);
        let left = self.input.is_down(controls.left);
        let right = self.input.is_down(controls.right);
        let up = self.input.is_down(controls.up);

        let p = &mut self.players[slot];
        if p.dash > 0 {
            p.dash -= 1;
        } else {
            if left && !right && !p.blocking {
                p.vx = -PLAYER_SPEED;
                p.facing = -1.0;
            }
            if right && !left && !p.blocking {
                p.vx = PLAYER_SPEED;
                p.facing = 1.0;
            }
            if (!left && !right) || p.blocking {
                p.vx *= FRICTION;
                if p.vx.abs() < 0.3 {
                    p.vx = 0.0;
                }
            }
        }

        let slow_fall = !p.on_ground && up;
        if up {
            if (p.on_ground || p.jumps < MAX_JUMPS) && !p.jump_held && !p.blocking {
                p.vy = -JUMP_VEL;
                p.jumps += 1;
                p.jump_held = true;
            }
        } else {
            p.jump_held = false;
        }
        p.dash_cooldown = p.dash_cooldown.saturating_sub(1);

        if slow_fall && p.vy > 0.0 {
            p.vy += GRAVITY * SLOW_FALL_MULTIPLIER;
        } else {
            p.vy += GRAVITY;
        }
        p.x += p.vx;
        p.y += p.vy;
        p.x = p.x.clamp(0.0, WIDTH - p.w);
        self.collide_with_stage(slot);
    }

    /// Block meter upkeep. Returns true when the player is dizzy and the
    /// rest of the update must be skipped.
    pub(super) fn update_blocking(&mut self, slot: usize) -> bool {
        let holding_down = self.input.is_down(get_controls(slot).down);
        let p = &mut self.players[slot];

        if p.on_ground && holding_down {
            if !p.was_blocking && p.block < BLOCK_MAX {
                p.blocking = false;
            } else if p.block > 0.0 {
                p.blocking = true;
                p.reduce_block(BLOCK_DEPLETION);
            } else {
                p.blocking = false;
            }
        } else {
            p.blocking = false;
        }
        if !p.blocking && p.block < BLOCK_MAX {
            p.add_block(BLOCK_RECOVERY);
        }
        p.was_blocking = p.blocking;

        if p.dizzy > 0 {
            p.dizzy -= 1;
            p.vx *= FRICTION;
            if p.vx.abs() < 0.3 {
                p.vx = 0.0;
            }
            return true;
        }
        false
    }

    /// Floor, one-way platforms and ceiling. Later platforms override earlier
    /// matches.
    pub(super) fn collide_with_stage(&mut self, slot: usize) {
        let p = &mut self.players[slot];
        p.on_ground = false;
        if p.bottom() >= FLOOR {
            p.y = FLOOR - p.h;
            p.vy = 0.0;
            p.on_ground = true;
            p.jumps = 0;
        } else {
            for plat in &self.platforms {
                if p.vy >= 0.0
                    && p.x + p.w > plat.x
                    && p.x < plat.x + plat.w
                    && p.bottom() > plat.y
                    && p.bottom() - p.vy <= plat.y + PLATFORM_LANDING_TOLERANCE
                {
                    p.y = plat.y - p.h;
                    p.vy = 0.0;
                    p.on_ground = true;
                    p.jumps = 0;
                }
            }
        }
        if p.y < 0.0 {
            p.y = 0.0;
            p.vy = 0.0;
        }
    }
}
