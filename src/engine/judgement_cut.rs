use super::*;

use crate::characters::{JudgementCutEffect, Shard};
use crate::constants::{
    HEIGHT, JUDGEMENT_CUT_CAST_DELAY_MS, JUDGEMENT_CUT_COOLDOWN, JUDGEMENT_CUT_DAMAGE,
    JUDGEMENT_CUT_FALL_INITIAL_VY, JUDGEMENT_CUT_FALL_MARGIN, JUDGEMENT_CUT_FALL_VX_RANGE,
    JUDGEMENT_CUT_KNOCKBACK_X, JUDGEMENT_CUT_KNOCKBACK_Y, JUDGEMENT_CUT_LEADING_LINES,
    JUDGEMENT_CUT_LINES, JUDGEMENT_CUT_LINE_DISPLAY_MS, JUDGEMENT_CUT_LINE_INTERVAL_MS,
    JUDGEMENT_CUT_RANGE, JUDGEMENT_CUT_REMAINING_LINES_DELAY_MS, JUDGEMENT_CUT_RESUME_DELAY_MS,
    JUDGEMENT_CUT_SLIDE_DURATION_MS, JUDGEMENT_CUT_SLIDE_SPEED, JUDGEMENT_CUT_SLIDE_START_MS,
};
use crate::geometry::{centroid, shatter_rect};
use crate::types::JudgementCutPhase;

const JUDGEMENT_CUT_COST: i32 = 0;
const PAUSE_REASON: &str = "judgement_cut";

impl GameEngine {
    fn judgement_cut_effect(&mut self, slot: usize) -> Option<&mut JudgementCutEffect> {
        match &mut self.players[slot].kit {
            Kit::Vergil(kit) => kit.judgement_cut_effect.as_mut(),
            _ => None,
        }
    }

    fn enter_phase(&mut self, slot: usize, phase: JudgementCutPhase) {
        self.events.push(RuntimeEvent::JudgementCutPhase {
            player_id: slot,
            phase,
        });
    }

    /// Vergil's special press: concentrate, freeze the match and queue the
    /// cut and the resume on the engine clock.
    pub fn begin_judgement_cut(&mut self, slot: usize) {
        let now_ms = self.elapsed_ms;
        let p = &mut self.players[slot];
        let incarnation = p.incarnation;
        let Kit::Vergil(kit) = &mut p.kit else {
            return;
        };
        if kit.is_concentrating {
            return;
        }
        kit.is_concentrating = true;
        p.set_animation("concentrating", now_ms);
        let message = format!("{} focuses for a Judgement Cut...", p.name);

        self.pause_game(PAUSE_REASON);
        self.scheduler.schedule(
            now_ms,
            JUDGEMENT_CUT_CAST_DELAY_MS,
            DeferredTask::CastJudgementCut { slot, incarnation },
        );
        self.scheduler
            .schedule(now_ms, JUDGEMENT_CUT_RESUME_DELAY_MS, DeferredTask::ResumeGame);
        self.log(message);
    }

    /// The cut itself: starts the zoom, freezes the current view into 17
    /// slash lines, queues the visual timeline and deals the area damage
    /// right away.
    pub(super) fn cast_judgement_cut(&mut self, slot: usize, now_ms: u64) -> bool {
        self.players[slot].set_animation("slash", now_ms);
        let p = &mut self.players[slot];
        let incarnation = p.incarnation;
        let affordable = p.points >= JUDGEMENT_CUT_COST;
        let Kit::Vergil(kit) = &mut p.kit else {
            return false;
        };
        if !affordable || kit.judgement_cut_cooldown > 0 {
            kit.is_concentrating = false;
            p.set_animation("idle", now_ms);
            return false;
        }

        self.zoom.start(now_ms);
        let camera = self.camera();
        let (view_width, view_height) = camera.view_size(self.viewport);
        let lines = JUDGEMENT_CUT_LINES
            .iter()
            .map(|&(x1, y1, x2, y2)| (x1 * view_width, y1 * view_height, x2 * view_width, y2 * view_height))
            .collect();
        let effect = JudgementCutEffect {
            phase: JudgementCutPhase::Lines,
            lines,
            visible_lines: 0,
            shards: Vec::new(),
            camera_x: camera.cx - view_width / 2.0,
            camera_y: camera.cy - view_height / 2.0,
            view_width,
            view_height,
            slide_started_ms: None,
        };

        let p = &mut self.players[slot];
        p.add_points(-JUDGEMENT_CUT_COST);
        if let Kit::Vergil(kit) = &mut p.kit {
            kit.judgement_cut_cooldown = JUDGEMENT_CUT_COOLDOWN;
            kit.judgement_cut_effect = Some(effect);
        }
        self.enter_phase(slot, JudgementCutPhase::Lines);
        self.ability_used(slot, "judgement_cut");

        for i in 0..JUDGEMENT_CUT_LEADING_LINES {
            self.scheduler.schedule(
                now_ms,
                i as u64 * JUDGEMENT_CUT_LINE_INTERVAL_MS,
                DeferredTask::RevealLines {
                    slot,
                    incarnation,
                    count: Some(i + 1),
                },
            );
        }
        self.scheduler.schedule(
            now_ms,
            JUDGEMENT_CUT_LEADING_LINES as u64 * JUDGEMENT_CUT_LINE_INTERVAL_MS
                + JUDGEMENT_CUT_REMAINING_LINES_DELAY_MS,
            DeferredTask::RevealLines {
                slot,
                incarnation,
                count: None,
            },
        );
        self.scheduler.schedule(
            now_ms,
            JUDGEMENT_CUT_LINE_DISPLAY_MS,
            DeferredTask::ShatterScreen { slot, incarnation },
        );
        self.scheduler.schedule(
            now_ms,
            JUDGEMENT_CUT_SLIDE_START_MS,
            DeferredTask::BeginSlide { slot, incarnation },
        );

        let (x, y) = (self.players[slot].x, self.players[slot].y);
        for target in self.opponents_of(slot) {
            let distance = (self.players[target].x - x).hypot(self.players[target].y - y);
            if distance >= JUDGEMENT_CUT_RANGE {
                continue;
            }
            let damage = get_falloff_damage(JUDGEMENT_CUT_DAMAGE, distance, JUDGEMENT_CUT_RANGE);
            self.hit_player(slot, target, damage, "Judgement Cut");
            self.knockback(slot, target, JUDGEMENT_CUT_KNOCKBACK_X, JUDGEMENT_CUT_KNOCKBACK_Y);
        }
        true
    }

    /// `None` reveals every line. Ignored once the lines are gone.
    pub(super) fn reveal_judgement_cut_lines(&mut self, slot: usize, count: Option<usize>) {
        if let Some(effect) = self.judgement_cut_effect(slot) {
            if effect.phase == JudgementCutPhase::Lines {
                effect.visible_lines = count.unwrap_or(effect.lines.len()).min(effect.lines.len());
            }
        }
    }

    /// Hides the lines and cuts the whole stage into shards, each with its
    /// own launch velocity and spin. The view-space lines are stretched to
    /// stage coordinates first.
    pub(super) fn shatter_judgement_cut(&mut self, slot: usize) {
        let Kit::Vergil(kit) = &mut self.players[slot].kit else {
            return;
        };
        let Some(effect) = kit.judgement_cut_effect.as_mut() else {
            return;
        };
        effect.phase = JudgementCutPhase::Preparing;
        let sx = WIDTH / effect.view_width;
        let sy = HEIGHT / effect.view_height;
        let stage_lines: Vec<_> = effect
            .lines
            .iter()
            .map(|&(x1, y1, x2, y2)| (x1 * sx, y1 * sy, x2 * sx, y2 * sy))
            .collect();
        let half_width = effect.view_width / 2.0;
        let rng = &mut self.rng;
        effect.shards = shatter_rect(WIDTH, HEIGHT, &stage_lines)
            .into_iter()
            .map(|poly| {
                let (cx, _) = centroid(&poly);
                let dir = if rng.bool(0.5) { -0.8 } else { 0.8 };
                let vx = dir * rng.range(18.0, 10.0);
                let vy = rng.centered(10.0);
                let g = rng.range(1.10, 0.2);
                let angle = rng.centered(0.2);
                let vangle = rng.centered(0.12) + (cx - half_width) * 0.0003;
                Shard {
                    poly,
                    x: 0.0,
                    y: 0.0,
                    vx,
                    vy,
                    g,
                    angle,
                    vangle,
                }
            })
            .collect();
        self.enter_phase(slot, JudgementCutPhase::Preparing);
    }

    pub(super) fn begin_judgement_cut_slide(&mut self, slot: usize, now_ms: u64) {
        let Some(effect) = self.judgement_cut_effect(slot) else {
            return;
        };
        effect.phase = JudgementCutPhase::Slide;
        effect.slide_started_ms = Some(now_ms);
        self.enter_phase(slot, JudgementCutPhase::Slide);
    }

    /// Shard animation for one tick. Runs on the engine clock whether or not
    /// gameplay is paused.
    pub(crate) fn advance_judgement_cut(&mut self, slot: usize) {
        let now_ms = self.elapsed_ms;
        let Kit::Vergil(kit) = &mut self.players[slot].kit else {
            return;
        };
        let Some(effect) = kit.judgement_cut_effect.as_mut() else {
            return;
        };
        match effect.phase {
            JudgementCutPhase::Slide => {
                for shard in &mut effect.shards {
                    shard.x += shard.vx * JUDGEMENT_CUT_SLIDE_SPEED;
                    shard.y += shard.vy * JUDGEMENT_CUT_SLIDE_SPEED;
                    shard.angle += shard.vangle * JUDGEMENT_CUT_SLIDE_SPEED;
                }
                let started = effect.slide_started_ms.unwrap_or(now_ms);
                if now_ms.saturating_sub(started) > JUDGEMENT_CUT_SLIDE_DURATION_MS {
                    effect.phase = JudgementCutPhase::Fall;
                    for shard in &mut effect.shards {
                        shard.vy = self.rng.range(JUDGEMENT_CUT_FALL_INITIAL_VY, 2.0);
                        shard.vx = self.rng.centered(JUDGEMENT_CUT_FALL_VX_RANGE);
                    }
                    self.enter_phase(slot, JudgementCutPhase::Fall);
                }
            }
            JudgementCutPhase::Fall => {
                for shard in &mut effect.shards {
                    shard.x += shard.vx;
                    shard.y += shard.vy;
                    shard.vy += shard.g;
                    shard.angle += shard.vangle;
                }
                let floor = effect.view_height + JUDGEMENT_CUT_FALL_MARGIN;
                if effect.shards.iter().all(|shard| shard.y > floor) {
                    kit.judgement_cut_effect = None;
                    kit.is_concentrating = false;
                    self.players[slot].set_animation("idle", now_ms);
                }
            }
            JudgementCutPhase::Lines | JudgementCutPhase::Preparing => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::characters::{Kit, VergilKit};
    use crate::constants::{HEIGHT, TICK_MS, WIDTH};
    use crate::engine::tests::{approx_eq, grounded_duel};
    use crate::engine::GameEngine;
    use crate::geometry::polygon_area;
    use crate::types::{CharacterId, JudgementCutPhase, RuntimeEvent};

    fn kit(engine: &GameEngine) -> &VergilKit {
        match &engine.players[0].kit {
            Kit::Vergil(kit) => kit,
            other => panic!("unexpected kit {other:?}"),
        }
    }

    fn run_until(engine: &mut GameEngine, now_ms: u64) {
        while engine.now_ms() < now_ms {
            engine.step(TICK_MS);
        }
    }

    fn phase(engine: &GameEngine) -> Option<JudgementCutPhase> {
        kit(engine).judgement_cut_effect.as_ref().map(|e| e.phase)
    }

    #[test]
    fn full_timeline_from_press_to_cleanup() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        let pressed_at = engine.now_ms();
        let target_x = engine.players[1].x;
        engine.key_down("e");
        engine.key_up("e");
        assert!(engine.is_paused());
        assert!(kit(&engine).is_concentrating);
        assert_eq!(engine.scheduler.pending(), 2);

        run_until(&mut engine, pressed_at + 1_980);
        assert_eq!(engine.players[1].hp, 100);
        assert!(phase(&engine).is_none());

        run_until(&mut engine, pressed_at + 2_000);
        assert_eq!(phase(&engine), Some(JudgementCutPhase::Lines));
        assert_eq!(engine.players[1].hp, 86);
        assert_eq!(engine.players[1].vx, 10.0);
        assert_eq!(kit(&engine).judgement_cut_cooldown, 120);
        assert!(engine.zoom.is_active());

        run_until(&mut engine, pressed_at + 2_400);
        let effect = kit(&engine).judgement_cut_effect.as_ref().expect("effect");
        assert_eq!(effect.visible_lines, 17);

        run_until(&mut engine, pressed_at + 3_100);
        let effect = kit(&engine).judgement_cut_effect.as_ref().expect("effect");
        assert_eq!(effect.phase, JudgementCutPhase::Preparing);
        let area: f64 = effect.shards.iter().map(|s| polygon_area(&s.poly)).sum();
        assert!(approx_eq(area / (WIDTH * HEIGHT), 1.0, 1e-9));

        run_until(&mut engine, pressed_at + 3_600);
        assert_eq!(phase(&engine), Some(JudgementCutPhase::Slide));
        assert!(engine.is_paused());
        assert_eq!(engine.players[1].x, target_x);
        assert_eq!(kit(&engine).judgement_cut_cooldown, 120);

        run_until(&mut engine, pressed_at + 8_700);
        assert_eq!(phase(&engine), Some(JudgementCutPhase::Fall));

        run_until(&mut engine, pressed_at + 9_500);
        assert!(!engine.is_paused());
        run_until(&mut engine, pressed_at + 20_000);
        assert!(phase(&engine).is_none());
        assert!(!kit(&engine).is_concentrating);
        assert!(engine.players[1].x > target_x);

        let phases: Vec<JudgementCutPhase> = engine
            .events
            .iter()
            .filter_map(|e| match e {
                RuntimeEvent::JudgementCutPhase { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                JudgementCutPhase::Lines,
                JudgementCutPhase::Preparing,
                JudgementCutPhase::Slide,
                JudgementCutPhase::Fall,
            ]
        );
    }

    #[test]
    fn shards_cover_the_whole_stage_when_zoomed_in() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        let pressed_at = engine.now_ms();
        engine.key_down("e");
        run_until(&mut engine, pressed_at + 3_150);

        let effect = kit(&engine).judgement_cut_effect.as_ref().expect("effect");
        assert_eq!(effect.phase, JudgementCutPhase::Preparing);
        assert!(effect.view_width < WIDTH);
        assert!(effect.shards.len() > 1);

        let area: f64 = effect.shards.iter().map(|s| polygon_area(&s.poly)).sum();
        assert!(approx_eq(area, WIDTH * HEIGHT, 1e-6 * WIDTH * HEIGHT));

        let points = || effect.shards.iter().flat_map(|s| s.poly.iter());
        assert!(points().all(|&(x, y)| {
            (-1e-6..=WIDTH + 1e-6).contains(&x) && (-1e-6..=HEIGHT + 1e-6).contains(&y)
        }));
        assert!(points().any(|&(x, _)| approx_eq(x, WIDTH, 1e-6)));
        assert!(points().any(|&(_, y)| approx_eq(y, HEIGHT, 1e-6)));
    }

    #[test]
    fn leading_lines_appear_one_by_one() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        let pressed_at = engine.now_ms();
        engine.key_down("e");
        let visible = |engine: &GameEngine| {
            kit(engine)
                .judgement_cut_effect
                .as_ref()
                .map_or(0, |e| e.visible_lines)
        };
        run_until(&mut engine, pressed_at + 2_016);
        assert_eq!(visible(&engine), 1);
        run_until(&mut engine, pressed_at + 2_064);
        assert_eq!(visible(&engine), 2);
        run_until(&mut engine, pressed_at + 2_112);
        assert_eq!(visible(&engine), 3);
        run_until(&mut engine, pressed_at + 2_336);
        assert_eq!(visible(&engine), 3);
        run_until(&mut engine, pressed_at + 2_352);
        assert_eq!(visible(&engine), 17);
    }

    #[test]
    fn out_of_range_opponent_is_untouched() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        engine.players[0].x = 50.0;
        engine.players[1].x = 800.0;
        let pressed_at = engine.now_ms();
        engine.key_down("e");
        run_until(&mut engine, pressed_at + 2_100);
        assert_eq!(engine.players[1].hp, 100);
        assert!(phase(&engine).is_some());
    }

    #[test]
    fn repeated_press_while_concentrating_is_ignored() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        engine.key_down("e");
        engine.key_up("e");
        engine.step(TICK_MS);
        engine.key_down("e");
        engine.key_up("e");
        assert_eq!(engine.scheduler.pending(), 2);
        let pauses = engine
            .events
            .iter()
            .filter(|e| matches!(e, RuntimeEvent::GamePaused { .. }))
            .count();
        assert_eq!(pauses, 1);
    }

    #[test]
    fn cooldown_rejects_the_cast_and_releases_the_stance() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        if let Kit::Vergil(kit) = &mut engine.players[0].kit {
            kit.judgement_cut_cooldown = 50;
        }
        let pressed_at = engine.now_ms();
        engine.key_down("e");
        run_until(&mut engine, pressed_at + 2_100);
        assert_eq!(engine.players[1].hp, 100);
        assert!(phase(&engine).is_none());
        assert!(!kit(&engine).is_concentrating);
        assert!(engine.is_paused());
        run_until(&mut engine, pressed_at + 9_500);
        assert!(!engine.is_paused());
    }

    #[test]
    fn swapped_character_ignores_queued_cut() {
        let mut engine = grounded_duel(CharacterId::Vergil, CharacterId::Default);
        let pressed_at = engine.now_ms();
        engine.key_down("e");
        engine.key_up("e");
        engine.key_down("1");
        assert_eq!(engine.players[0].char_id, CharacterId::Gold);
        run_until(&mut engine, pressed_at + 4_000);
        assert_eq!(engine.players[1].hp, 100);
        assert!(engine.is_paused());
        run_until(&mut engine, pressed_at + 9_500);
        assert!(!engine.is_paused());
    }

    #[test]
    fn same_seed_shatters_identically() {
        let shards = |seed: u32| {
            let mut engine = GameEngine::new(
                seed,
                crate::engine::GameEngineOptions {
                    characters: [CharacterId::Vergil, CharacterId::Default],
                    skip_intro: true,
                    ..Default::default()
                },
            );
            engine.step(TICK_MS);
            let pressed_at = engine.now_ms();
            engine.key_down("e");
            run_until(&mut engine, pressed_at + 3_200);
            kit(&engine)
                .judgement_cut_effect
                .as_ref()
                .map(|e| e.shards.iter().map(|s| (s.vx, s.vy, s.g)).collect::<Vec<_>>())
                .unwrap_or_default()
        };
        let a = shards(7);
        assert!(!a.is_empty());
        assert_eq!(a, shards(7));
        assert_ne!(a, shards(8));
    }
}
