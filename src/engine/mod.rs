use crate::camera::{compute_camera, ZoomEffect};
use crate::characters::{character, create_player, Kit};
use crate::constants::{
    get_falloff_damage, BLOCK_DEPLETION, BLOCK_HIT_COST, BLOCK_MAX, BLOCK_PARALYZE_FRAMES,
    BLOCK_POINT_REWARD, BLOCK_PUSHBACK_X, BLOCK_PUSHBACK_Y, BLOCK_RECOVERY, DASH_COOLDOWN,
    DASH_DAMAGE, DASH_FRAMES, DASH_SPEED, FLOOR, FRICTION, GRAVITY, INTRO_FRAMES, JUMP_VEL,
    MAX_JUMPS, PARALYZED_DAMPING, PLATFORM_LANDING_TOLERANCE, PLAYER_SIZE, PLAYER_SPEED,
    SLOW_FALL_MULTIPLIER, WIDTH,
};
use crate::input::{InputRecorder, KeySignal};
use crate::player::Player;
use crate::rng::Rng;
use crate::scheduler::{DeferredTask, Scheduler};
use crate::types::{
    Camera, CharacterId, GameOverReason, MatchSummary, RuntimeEvent, Snapshot, Viewport,
};
use crate::world::{character_hotkey, get_controls, normalize_key, stage_platforms, Platform};

mod abilities;
mod combat;
mod judgement_cut;
mod physics;

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub characters: [CharacterId; 2],
    pub viewport: Viewport,
    pub skip_intro: bool,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            characters: [CharacterId::Smasher, CharacterId::Berry],
            viewport: Viewport::default(),
            skip_intro: false,
        }
    }
}

/// The whole match: both fighters, the stage, input state and every timer.
/// Advanced only by [`GameEngine::step`]; key events may arrive between steps.
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub(crate) players: Vec<Player>,
    pub(crate) platforms: Vec<Platform>,
    pub(crate) input: InputRecorder,
    pub(crate) scheduler: Scheduler,
    pub(crate) zoom: ZoomEffect,
    pub(crate) rng: Rng,
    pub(crate) events: Vec<RuntimeEvent>,
    pub(crate) viewport: Viewport,

    pause_reason: Option<String>,
    intro_frames_left: u32,
    elapsed_ms: u64,
    tick_counter: u64,
    ended: bool,
    end_reason: Option<GameOverReason>,
    winner: Option<usize>,
    next_incarnation: u64,
}

impl GameEngine {
    pub fn new(seed: u32, options: GameEngineOptions) -> Self {
        let ground_y = FLOOR - PLAYER_SIZE;
        let starts = [(WIDTH / 3.0, 1.0), (2.0 * WIDTH / 3.0, -1.0)];
        let players = starts
            .iter()
            .zip(options.characters)
            .enumerate()
            .map(|(slot, (&(x, facing), char_id))| {
                create_player(
                    slot,
                    format!("Player {}", slot + 1),
                    char_id,
                    x,
                    ground_y,
                    facing,
                    slot as u64 + 1,
                    0,
                )
            })
            .collect::<Vec<_>>();

        let intro_frames_left = if options.skip_intro { 0 } else { INTRO_FRAMES };
        let mut engine = Self {
            next_incarnation: players.len() as u64 + 1,
            players,
            platforms: stage_platforms(),
            input: InputRecorder::new(),
            scheduler: Scheduler::new(),
            zoom: ZoomEffect::default(),
            rng: Rng::new(seed),
            events: Vec::new(),
            viewport: options.viewport,
            pause_reason: None,
            intro_frames_left,
            elapsed_ms: 0,
            tick_counter: 0,
            ended: false,
            end_reason: None,
            winner: None,
        };
        if intro_frames_left > 0 {
            for player in &mut engine.players {
                player.animation_override = true;
            }
        }
        engine
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn now_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, slot: usize) -> Option<&Player> {
        self.players.get(slot)
    }

    pub fn is_paused(&self) -> bool {
        self.pause_reason.is_some()
    }

    pub fn intro_frames_left(&self) -> u32 {
        self.intro_frames_left
    }

    pub fn camera(&self) -> Camera {
        compute_camera(
            self.players[0].rect(),
            self.players[1].rect(),
            self.viewport,
            self.zoom.multiplier(),
        )
    }

    pub fn pause_game(&mut self, reason: &str) {
        self.pause_reason = Some(reason.to_string());
        self.events.push(RuntimeEvent::GamePaused {
            reason: reason.to_string(),
        });
    }

    pub fn resume_game(&mut self) {
        if self.pause_reason.take().is_some() {
            self.events.push(RuntimeEvent::GameResumed);
        }
    }

    pub(crate) fn log(&mut self, message: String) {
        self.events.push(RuntimeEvent::Log { message });
    }

    pub(crate) fn slot_matches(&self, slot: usize, incarnation: u64) -> bool {
        self.players
            .get(slot)
            .is_some_and(|player| player.incarnation == incarnation)
    }

    pub fn key_down(&mut self, raw_key: &str) {
        let key = normalize_key(raw_key);
        if let Some((slot, char_id)) = character_hotkey(&key) {
            self.switch_character(slot, char_id);
        }
        let Some(count) = self.input.key_down(&key, self.elapsed_ms) else {
            return;
        };
        for slot in 0..self.players.len() {
            if !self.players[slot].movement {
                continue;
            }
            character(self.players[slot].char_id).key_press(self, slot, &key, count);
        }
    }

    pub fn key_up(&mut self, raw_key: &str) {
        let key = normalize_key(raw_key);
        let Some(duration_ms) = self.input.key_up(&key, self.elapsed_ms) else {
            return;
        };
        for slot in 0..self.players.len() {
            self.players[slot].charging_logged.remove(&key);
            character(self.players[slot].char_id).key_release(self, slot, &key, duration_ms);
        }
    }

    /// Replaces the character in `slot`, keeping position and facing.
    pub fn switch_character(&mut self, slot: usize, char_id: CharacterId) {
        let Some(old) = self.players.get(slot) else {
            return;
        };
        let replacement = create_player(
            slot,
            format!("Player {}", slot + 1),
            char_id,
            old.x,
            old.y,
            old.facing,
            self.next_incarnation,
            self.elapsed_ms,
        );
        self.next_incarnation += 1;
        self.players[slot] = replacement;
        self.events.push(RuntimeEvent::CharacterSwitched {
            player_id: slot,
            character: char_id,
        });
        self.log(format!(
            "Player {} switched to {}",
            slot + 1,
            character(char_id).name()
        ));
    }

    pub fn step(&mut self, dt_ms: u64) {
        if self.ended {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.elapsed_ms;

        self.run_deferred(now_ms);
        self.zoom.update(now_ms);
        for slot in 0..self.players.len() {
            character(self.players[slot].char_id).update_effects(self, slot);
        }

        if self.intro_frames_left > 0 {
            self.update_intro(now_ms);
            return;
        }

        self.handle_key_signals(now_ms);
        if self.is_paused() {
            return;
        }

        for slot in 0..self.players.len() {
            let player = &mut self.players[slot];
            player.just_hit = player.just_hit.saturating_sub(1);
            self.update_player(slot, now_ms);
        }
        self.handle_dash_and_block_damage();
        self.check_defeats();
    }

    fn update_intro(&mut self, now_ms: u64) {
        for player in &mut self.players {
            player.update_animation(now_ms);
        }
        self.intro_frames_left -= 1;
        if self.intro_frames_left == 0 {
            for player in &mut self.players {
                player.animation_override = false;
            }
        }
    }

    fn handle_key_signals(&mut self, now_ms: u64) {
        for signal in self.input.poll(now_ms) {
            match signal {
                KeySignal::Hold { key, duration_ms } => {
                    for slot in 0..self.players.len() {
                        character(self.players[slot].char_id)
                            .key_hold(self, slot, &key, duration_ms);
                    }
                }
                KeySignal::MultiPress { key, count } => {
                    for slot in 0..self.players.len() {
                        if !self.players[slot].movement {
                            continue;
                        }
                        character(self.players[slot].char_id)
                            .key_presses(self, slot, &key, count);
                    }
                }
            }
        }
    }

    fn run_deferred(&mut self, now_ms: u64) {
        for task in self.scheduler.drain_due(now_ms) {
            match task {
                DeferredTask::ResumeGame => self.resume_game(),
                DeferredTask::CastJudgementCut { slot, incarnation } => {
                    if self.slot_matches(slot, incarnation) {
                        self.cast_judgement_cut(slot, now_ms);
                    }
                }
                DeferredTask::RevealLines {
                    slot,
                    incarnation,
                    count,
                } => {
                    if self.slot_matches(slot, incarnation) {
                        self.reveal_judgement_cut_lines(slot, count);
                    }
                }
                DeferredTask::ShatterScreen { slot, incarnation } => {
                    if self.slot_matches(slot, incarnation) {
                        self.shatter_judgement_cut(slot);
                    }
                }
                DeferredTask::BeginSlide { slot, incarnation } => {
                    if self.slot_matches(slot, incarnation) {
                        self.begin_judgement_cut_slide(slot, now_ms);
                    }
                }
            }
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            now_ms: self.elapsed_ms,
            paused: self.is_paused(),
            pause_reason: self.pause_reason.clone(),
            intro_frames_left: self.intro_frames_left,
            ended: self.ended,
            winner: self.winner,
            camera: self.camera(),
            zoom_multiplier: self.zoom.multiplier(),
            players: self.players.clone(),
            platforms: self.platforms.clone(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> MatchSummary {
        MatchSummary {
            reason: self.end_reason,
            winner: self.winner,
            duration_ms: self.elapsed_ms,
            ticks: self.tick_counter,
            hp: [self.players[0].hp, self.players[1].hp],
            points: [self.players[0].points, self.players[1].points],
            characters: [self.players[0].char_id, self.players[1].char_id],
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{GameEngine, GameEngineOptions};
    use crate::constants::{INTRO_FRAMES, TICK_MS};
    use crate::types::{CharacterId, RuntimeEvent};

    pub(crate) fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    pub(crate) fn duel(a: CharacterId, b: CharacterId) -> GameEngine {
        GameEngine::new(
            1_234,
            GameEngineOptions {
                characters: [a, b],
                skip_intro: true,
                ..GameEngineOptions::default()
            },
        )
    }

    /// Lands both fighters so every test starts from a grounded stance.
    pub(crate) fn grounded_duel(a: CharacterId, b: CharacterId) -> GameEngine {
        let mut engine = duel(a, b);
        engine.step(TICK_MS);
        engine
    }

    #[test]
    fn default_roster_matches_opening_lineup() {
        let engine = GameEngine::new(1, GameEngineOptions::default());
        let p1 = &engine.players()[0];
        let p2 = &engine.players()[1];
        assert_eq!(p1.char_id, CharacterId::Smasher);
        assert_eq!(p2.char_id, CharacterId::Berry);
        assert_eq!((p1.facing, p2.facing), (1.0, -1.0));
        assert_eq!(p1.points, 2);
        assert_eq!(engine.intro_frames_left(), INTRO_FRAMES);
    }

    #[test]
    fn intro_blocks_input_and_physics() {
        let mut engine = GameEngine::new(1, GameEngineOptions::default());
        let y = engine.players[0].y;
        engine.key_down("a");
        for _ in 0..INTRO_FRAMES - 1 {
            engine.step(TICK_MS);
        }
        assert_eq!(engine.players[0].y, y);
        assert!(engine.players[0].animation_override);
        engine.step(TICK_MS);
        assert_eq!(engine.intro_frames_left(), 0);
        assert!(!engine.players[0].animation_override);
        engine.step(TICK_MS);
        assert!(engine.players[0].x < engine.players[1].x);
        assert!(engine.players[0].vx < 0.0);
    }

    #[test]
    fn same_seed_produces_same_match() {
        let script = |engine: &mut GameEngine, frame: u32| match frame {
            3 => engine.key_down("d"),
            5 => engine.key_up("d"),
            6 => engine.key_down("d"),
            20 => engine.key_up("d"),
            30 => engine.key_down("p"),
            40 => engine.key_up("p"),
            _ => {}
        };
        let mut a = duel(CharacterId::FireMage, CharacterId::Vergil);
        let mut b = duel(CharacterId::FireMage, CharacterId::Vergil);
        for frame in 0..900 {
            script(&mut a, frame);
            script(&mut b, frame);
            a.step(TICK_MS);
            b.step(TICK_MS);
            let sa = a.build_snapshot(false);
            let sb = b.build_snapshot(false);
            for (pa, pb) in sa.players.iter().zip(sb.players.iter()) {
                assert_eq!(pa.x.to_bits(), pb.x.to_bits());
                assert_eq!(pa.y.to_bits(), pb.y.to_bits());
                assert_eq!(pa.hp, pb.hp);
                assert_eq!(pa.points, pb.points);
            }
        }
    }

    #[test]
    fn switch_character_keeps_placement() {
        let mut engine = grounded_duel(CharacterId::Default, CharacterId::Default);
        engine.players[1].x = 420.0;
        engine.players[1].hp = 40;
        engine.key_down("0");
        engine.key_down("9");
        let p = &engine.players[1];
        assert_eq!(p.char_id, CharacterId::Smasher);
        assert_eq!(p.x, 420.0);
        assert_eq!(p.facing, -1.0);
        assert_eq!(p.hp, 100);
        assert_eq!(p.name, "Player 2");
        assert!(p.incarnation > 2);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = grounded_duel(CharacterId::Default, CharacterId::Default);
        engine.switch_character(0, CharacterId::Gold);
        let kept = engine.build_snapshot(false);
        assert!(kept.events.is_empty());
        let drained = engine.build_snapshot(true);
        assert!(drained
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::CharacterSwitched { player_id: 0, .. })));
        assert!(engine.build_snapshot(true).events.is_empty());
    }

    #[test]
    fn pause_freezes_physics_but_not_clock() {
        let mut engine = duel(CharacterId::Default, CharacterId::Default);
        engine.players[0].y = 100.0;
        engine.pause_game("menu");
        for _ in 0..10 {
            engine.step(TICK_MS);
        }
        assert_eq!(engine.players[0].y, 100.0);
        assert_eq!(engine.now_ms(), 10 * TICK_MS);
        engine.resume_game();
        engine.step(TICK_MS);
        assert!(engine.players[0].y > 100.0);
    }
}
