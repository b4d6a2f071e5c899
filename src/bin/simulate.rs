use chrono::{SecondsFormat, Utc};
use clap::Parser;
use duel_arena::constants::{BLOCK_MAX, HEIGHT, MAX_HP, MAX_POINTS, TICK_MS, WIDTH};
use duel_arena::engine::{GameEngine, GameEngineOptions};
use duel_arena::types::{CharacterId, GameOverReason, RuntimeEvent, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_FRAMES: u32 = 1_200;
const MAX_FRAMES: u32 = 60 * 60 * 10;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Built-in scenario to run. Runs every built-in scenario when omitted.
    #[arg(long)]
    scenario: Option<String>,
    /// JSON file with a scripted key timeline. Overrides --scenario.
    #[arg(long)]
    script: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    frames: Option<u32>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KeyAction {
    Down,
    Up,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ScriptEvent {
    frame: u32,
    key: String,
    action: KeyAction,
}

#[derive(Clone, Debug, Deserialize)]
struct ScriptFile {
    name: Option<String>,
    characters: Option<[String; 2]>,
    frames: Option<u32>,
    #[serde(default)]
    events: Vec<ScriptEvent>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    characters: [CharacterId; 2],
    frames: u32,
    seed: u32,
    events: Vec<ScriptEvent>,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    characters: [CharacterId; 2],
    reason: Option<GameOverReason>,
    winner: Option<usize>,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    ticks: u64,
    hp: [i32; 2],
    points: [i32; 2],
    #[serde(rename = "dashHits")]
    dash_hits: i32,
    #[serde(rename = "dashBlocks")]
    dash_blocks: i32,
    #[serde(rename = "damageEvents")]
    damage_events: i32,
    #[serde(rename = "abilitiesUsed")]
    abilities_used: BTreeMap<String, i32>,
    #[serde(rename = "judgementCuts")]
    judgement_cuts: i32,
    #[serde(rename = "pausedTicks")]
    paused_ticks: u64,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| rand::random::<u32>() as u64));
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed, now_ms()));
    let scenarios = match resolve_scenarios(&cli, seed) {
        Ok(scenarios) => scenarios,
        Err(error) => {
            emit_log(
                "error",
                "scenario_invalid",
                &match_id,
                None,
                Some(seed),
                None,
                json!({ "error": error }),
            );
            std::process::exit(2);
        }
    };
    let started_at = timestamp_now();
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "characters": scenario.characters,
                "frames": scenario.frames,
                "scriptedEvents": scenario.events.len(),
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_ms += scenario_run.result.duration_ms;
        *reason_counts
            .entry(reason_key(scenario_run.result.reason))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "reason": scenario_run.result.reason,
                "winner": scenario_run.result.winner,
                "durationMs": scenario_run.result.duration_ms,
                "hp": scenario_run.result.hp,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        started_at,
        timestamp_now(),
        scenario_results,
        reason_counts,
        total_anomalies,
        total_duration_ms,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationMs": summary.average_duration_ms,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut engine = GameEngine::new(
        scenario.seed,
        GameEngineOptions {
            characters: scenario.characters,
            skip_intro: true,
            ..GameEngineOptions::default()
        },
    );

    let mut events = scenario.events.clone();
    events.sort_by_key(|event| event.frame);
    let mut pending = events.into_iter().peekable();

    let mut dash_hits = 0;
    let mut dash_blocks = 0;
    let mut damage_events = 0;
    let mut judgement_cuts = 0;
    let mut paused_ticks = 0u64;
    let mut abilities_used: BTreeMap<String, i32> = BTreeMap::new();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;

    for frame in 0..scenario.frames {
        while let Some(event) = pending.next_if(|event| event.frame <= frame) {
            match event.action {
                KeyAction::Down => engine.key_down(&event.key),
                KeyAction::Up => engine.key_up(&event.key),
            }
        }
        engine.step(TICK_MS);
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        if snapshot.paused {
            paused_ticks += 1;
        }
        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::DashHit { .. } => dash_hits += 1,
                RuntimeEvent::DashBlocked { .. } => dash_blocks += 1,
                RuntimeEvent::Damaged { .. } => damage_events += 1,
                RuntimeEvent::AbilityUsed { ability, .. } => {
                    *abilities_used.entry(ability.clone()).or_insert(0) += 1;
                    if ability == "judgement_cut" {
                        judgement_cuts += 1;
                    }
                }
                _ => {}
            }
        }
        if engine.is_ended() {
            break;
        }
    }

    let summary = engine.build_summary();
    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            characters: summary.characters,
            reason: summary.reason,
            winner: summary.winner,
            duration_ms: summary.duration_ms,
            ticks: summary.ticks,
            hp: summary.hp,
            points: summary.points,
            dash_hits,
            dash_blocks,
            damage_events,
            abilities_used,
            judgement_cuts,
            paused_ticks,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    for player in &snapshot.players {
        if player.hp < 0 || player.hp > MAX_HP {
            anomalies.push(format!("player hp out of range: {} {}", player.id, player.hp));
        }
        if player.points < 0 || player.points > MAX_POINTS {
            anomalies.push(format!(
                "player points out of range: {} {}",
                player.id, player.points
            ));
        }
        if !(0.0..=BLOCK_MAX).contains(&player.block) {
            anomalies.push(format!(
                "player block out of range: {} {}",
                player.id, player.block
            ));
        }
        if !player.x.is_finite() || !player.y.is_finite() {
            anomalies.push(format!("player position not finite: {}", player.id));
        } else if player.x < 0.0 || player.x > WIDTH - player.w || player.y > HEIGHT {
            anomalies.push(format!(
                "player left the stage: {} ({:.1}, {:.1})",
                player.id, player.x, player.y
            ));
        }
    }

    if !snapshot.camera.zoom.is_finite() || snapshot.camera.zoom <= 0.0 {
        anomalies.push(format!("invalid camera zoom: {}", snapshot.camera.zoom));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli, seed: u32) -> Result<Vec<Scenario>, String> {
    let frames_override = cli.frames.map(|frames| frames.clamp(1, MAX_FRAMES));

    if let Some(path) = cli.script.as_ref() {
        let scenario = load_script(path, seed)?;
        return Ok(vec![Scenario {
            frames: frames_override.unwrap_or(scenario.frames),
            ..scenario
        }]);
    }

    let mut scenarios = builtin_scenarios(seed);
    if let Some(name) = cli.scenario.as_deref() {
        scenarios.retain(|scenario| scenario.name == name);
        if scenarios.is_empty() {
            return Err(format!("unknown scenario: {name}"));
        }
    }
    if let Some(frames) = frames_override {
        for scenario in &mut scenarios {
            scenario.frames = frames;
        }
    }
    Ok(scenarios)
}

fn load_script(path: &Path, seed: u32) -> Result<Scenario, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|error| format!("failed to read {}: {error}", path.display()))?;
    parse_script(&text, seed)
}

fn parse_script(text: &str, seed: u32) -> Result<Scenario, String> {
    let script: ScriptFile =
        serde_json::from_str(text).map_err(|error| format!("invalid script: {error}"))?;
    let characters = match script.characters {
        Some([first, second]) => [CharacterId::resolve(&first), CharacterId::resolve(&second)],
        None => GameEngineOptions::default().characters,
    };
    Ok(Scenario {
        name: script.name.unwrap_or_else(|| "script".to_string()),
        characters,
        frames: script.frames.unwrap_or(DEFAULT_FRAMES).clamp(1, MAX_FRAMES),
        seed,
        events: script.events,
    })
}

fn tap(frame: u32, key: &str) -> [ScriptEvent; 2] {
    [press(frame, key, KeyAction::Down), press(frame + 2, key, KeyAction::Up)]
}

fn press(frame: u32, key: &str, action: KeyAction) -> ScriptEvent {
    ScriptEvent {
        frame,
        key: key.to_string(),
        action,
    }
}

fn builtin_scenarios(seed: u32) -> Vec<Scenario> {
    let mut dash_exchange = vec![
        press(0, "d", KeyAction::Down),
        press(45, "d", KeyAction::Up),
        press(40, "l", KeyAction::Down),
        press(100, "l", KeyAction::Up),
    ];
    dash_exchange.extend(tap(55, "d"));
    dash_exchange.extend(tap(59, "d"));
    dash_exchange.extend(tap(140, "d"));
    dash_exchange.extend(tap(144, "d"));

    let mut fire_duel = Vec::new();
    fire_duel.extend(tap(10, "e"));
    fire_duel.extend(tap(20, "p"));
    fire_duel.extend(tap(60, "e"));
    fire_duel.extend(tap(100, "w"));
    fire_duel.push(press(150, "e", KeyAction::Down));
    fire_duel.push(press(230, "e", KeyAction::Up));

    let mut judgement_cut = vec![press(0, "k", KeyAction::Down), press(40, "k", KeyAction::Up)];
    judgement_cut.extend(tap(60, "e"));
    judgement_cut.extend(tap(700, "d"));
    judgement_cut.extend(tap(704, "d"));

    let charge_jumps = vec![
        press(10, "e", KeyAction::Down),
        press(90, "e", KeyAction::Up),
        press(10, "p", KeyAction::Down),
        press(90, "p", KeyAction::Up),
        press(200, "o", KeyAction::Down),
        press(230, "e", KeyAction::Down),
        press(260, "e", KeyAction::Up),
        press(300, "o", KeyAction::Up),
    ];

    vec![
        Scenario {
            name: "dash-exchange".to_string(),
            characters: [CharacterId::Default, CharacterId::Default],
            frames: 600,
            seed,
            events: dash_exchange,
        },
        Scenario {
            name: "fire-duel".to_string(),
            characters: [CharacterId::FireMage, CharacterId::ZombieRider],
            frames: 900,
            seed: seed.wrapping_add(1),
            events: fire_duel,
        },
        Scenario {
            name: "judgement-cut".to_string(),
            characters: [CharacterId::Vergil, CharacterId::Smasher],
            frames: DEFAULT_FRAMES,
            seed: seed.wrapping_add(2),
            events: judgement_cut,
        },
        Scenario {
            name: "charge-jumps".to_string(),
            characters: [CharacterId::Gold, CharacterId::Berry],
            frames: 600,
            seed: seed.wrapping_add(3),
            events: charge_jumps,
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("duel-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        reason_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn reason_key(reason: Option<GameOverReason>) -> String {
    match reason {
        Some(GameOverReason::Knockout) => "knockout",
        None => "frame_limit",
    }
    .to_string()
}

fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_named(name: &str) -> Scenario {
        builtin_scenarios(42)
            .into_iter()
            .find(|scenario| scenario.name == name)
            .expect("builtin scenario")
    }

    fn make_scenario_result(reason: Option<GameOverReason>, duration_ms: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            characters: [CharacterId::Default, CharacterId::Default],
            reason,
            winner: None,
            duration_ms,
            ticks: 0,
            hp: [100, 100],
            points: [2, 2],
            dash_hits: 0,
            dash_blocks: 0,
            damage_events: 0,
            abilities_used: BTreeMap::new(),
            judgement_cuts: 0,
            paused_ticks: 0,
            anomalies: Vec::new(),
        }
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(default_match_id(42, 123456789), "duel-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_duration() {
        let summary = build_run_summary(
            "duel-42-1".to_string(),
            "2026-01-01T00:00:00.000Z".to_string(),
            "2026-01-01T00:00:01.000Z".to_string(),
            vec![
                make_scenario_result(None, 10_000),
                make_scenario_result(Some(GameOverReason::Knockout), 20_000),
            ],
            BTreeMap::from([
                ("frame_limit".to_string(), 1usize),
                ("knockout".to_string(), 1usize),
            ]),
            0,
            30_000,
        );
        assert_eq!(summary.average_duration_ms, 15_000);
        assert_eq!(summary.scenario_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("duel-arena-missing-{}", now_ms()))
            .join("summary.json");
        let summary = build_run_summary(
            "duel-1-1".to_string(),
            timestamp_now(),
            timestamp_now(),
            vec![make_scenario_result(None, 1_000)],
            BTreeMap::from([("frame_limit".to_string(), 1usize)]),
            0,
            1_000,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn parse_script_resolves_characters_and_defaults() {
        let scenario = parse_script(
            r#"{"characters":["vergil","ninja"],"events":[{"frame":3,"key":"e","action":"down"}]}"#,
            9,
        )
        .expect("script should parse");
        assert_eq!(scenario.characters, [CharacterId::Vergil, CharacterId::Default]);
        assert_eq!(scenario.frames, DEFAULT_FRAMES);
        assert_eq!(scenario.name, "script");
        assert_eq!(scenario.events[0].action, KeyAction::Down);
        assert!(parse_script(r#"{"events":[{"frame":1}]}"#, 9).is_err());
    }

    #[test]
    fn dash_exchange_lands_a_hit_without_anomalies() {
        let run = run_scenario(&scenario_named("dash-exchange"));
        assert!(run.result.anomalies.is_empty(), "{:?}", run.result.anomalies);
        assert!(run.result.dash_hits + run.result.dash_blocks >= 1);
    }

    #[test]
    fn judgement_cut_scenario_pauses_and_recovers() {
        let run = run_scenario(&scenario_named("judgement-cut"));
        assert!(run.result.anomalies.is_empty(), "{:?}", run.result.anomalies);
        assert_eq!(run.result.judgement_cuts, 1);
        assert!(run.result.paused_ticks > 500);
        assert!(run.result.hp[1] < 100);
    }

    #[test]
    fn same_seed_replays_identically() {
        let scenario = scenario_named("fire-duel");
        let a = run_scenario(&scenario).result;
        let b = run_scenario(&scenario).result;
        assert_eq!(a.hp, b.hp);
        assert_eq!(a.points, b.points);
        assert_eq!(a.abilities_used, b.abilities_used);
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let cli = Cli::parse_from(["simulate", "--scenario", "nope"]);
        assert!(resolve_scenarios(&cli, 1).is_err());
        let cli = Cli::parse_from(["simulate", "--scenario", "fire-duel", "--frames", "10"]);
        let scenarios = resolve_scenarios(&cli, 1).expect("scenario");
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].frames, 10);
    }
}
