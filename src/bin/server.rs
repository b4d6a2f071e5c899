use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use duel_arena::characters::{character, Character};
use duel_arena::constants::TICK_MS;
use duel_arena::engine::{GameEngine, GameEngineOptions};
use duel_arena::server_protocol::{parse_client_message, ParsedClientMessage};
use duel_arena::types::CharacterId;
use duel_arena::world::get_controls;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

/// One match shared by every connected client. Only the controller's input
/// reaches the engine; everyone else watches the snapshot stream.
struct ServerState {
    clients: HashMap<String, ClientContext>,
    controller_id: Option<String>,
    game: GameEngine,
    roster: [CharacterId; 2],
    seed: u32,
    match_count: u64,
    game_over_sent: bool,
}

impl ServerState {
    fn new(seed: u32, roster: [CharacterId; 2]) -> Self {
        Self {
            clients: HashMap::new(),
            controller_id: None,
            game: new_game(seed, roster),
            roster,
            seed,
            match_count: 1,
            game_over_sent: false,
        }
    }
}

fn new_game(seed: u32, roster: [CharacterId; 2]) -> GameEngine {
    GameEngine::new(
        seed,
        GameEngineOptions {
            characters: roster,
            ..GameEngineOptions::default()
        },
    )
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let seed = parse_seed(std::env::var("DUEL_SEED").ok().as_deref())
        .unwrap_or_else(rand::random::<u32>);
    let roster = resolve_roster(
        std::env::var("DUEL_P1").ok().as_deref(),
        std::env::var("DUEL_P2").ok().as_deref(),
    );
    println!(
        "[server] match seed {seed}, roster {} vs {}",
        roster[0].as_str(),
        roster[1].as_str()
    );

    let state = Arc::new(Mutex::new(ServerState::new(seed, roster)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/characters", get(characters_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        eprintln!("[server] static file root not found. set STATIC_DIR to the renderer bundle.");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    println!("[server] listening on :{port}");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("public")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

fn parse_seed(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .map(|value| value as u32)
}

fn resolve_roster(p1: Option<&str>, p2: Option<&str>) -> [CharacterId; 2] {
    let defaults = GameEngineOptions::default().characters;
    [
        p1.map(CharacterId::resolve).unwrap_or(defaults[0]),
        p2.map(CharacterId::resolve).unwrap_or(defaults[1]),
    ]
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn characters_handler() -> impl IntoResponse {
    Json(character_list())
}

fn character_list() -> Value {
    Value::Array(
        CharacterId::ALL
            .iter()
            .map(|&id| {
                let spec = character(id);
                json!({
                    "id": id,
                    "name": spec.name(),
                    "color": spec.color(),
                })
            })
            .collect(),
    )
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        register_client(&mut guard, &client_id, tx.clone());
        let welcome = welcome_message(&guard, &client_id);
        send_to_client(&mut guard, &client_id, &welcome, QueuePolicy::DisconnectOnFull);
        println!(
            "[server] {client_id} connected ({} clients)",
            guard.clients.len()
        );
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(state.clone(), &client_id, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(state.clone(), &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle_disconnect(state, &client_id).await;
    drop(tx);
    let _ = writer.await;
}

fn register_client(state: &mut ServerState, client_id: &str, tx: mpsc::Sender<OutboundMessage>) {
    state
        .clients
        .insert(client_id.to_string(), ClientContext { tx });
    if state.controller_id.is_none() {
        state.controller_id = Some(client_id.to_string());
    }
}

fn is_controller(state: &ServerState, client_id: &str) -> bool {
    state.controller_id.as_deref() == Some(client_id)
}

fn choose_next_controller(state: &ServerState) -> Option<String> {
    state
        .clients
        .keys()
        .min_by_key(|client_id| client_order_key(client_id))
        .cloned()
}

fn client_order_key(client_id: &str) -> u64 {
    client_id
        .rsplit('_')
        .next()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(u64::MAX)
}

fn welcome_message(state: &ServerState, client_id: &str) -> Value {
    json!({
        "type": "welcome",
        "clientId": client_id,
        "controller": is_controller(state, client_id),
        "seed": state.seed,
        "match": state.match_count,
        "roster": state.roster,
        "controls": [get_controls(0), get_controls(1)],
        "characters": character_list(),
    })
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };
    let mut guard = state.lock().await;
    apply_client_message(&mut guard, client_id, message);
}

fn apply_client_message(state: &mut ServerState, client_id: &str, message: ParsedClientMessage) {
    if !matches!(message, ParsedClientMessage::Ping { .. }) && !is_controller(state, client_id) {
        send_to_client(
            state,
            client_id,
            &json!({
                "type": "error",
                "message": "only the controlling client can send input",
            }),
            QueuePolicy::DropOnFull,
        );
        return;
    }
    match message {
        ParsedClientMessage::KeyDown { key } => state.game.key_down(&key),
        ParsedClientMessage::KeyUp { key } => state.game.key_up(&key),
        ParsedClientMessage::SwitchCharacter { slot, character } => {
            state.game.switch_character(slot, character);
            state.roster[slot] = character;
        }
        ParsedClientMessage::Restart { characters } => {
            let seed = rand::random::<u32>();
            restart_game(state, seed, characters);
            println!(
                "[server] {client_id} restarted match {} (seed {seed})",
                state.match_count
            );
            let message = json!({
                "type": "restarted",
                "seed": state.seed,
                "match": state.match_count,
                "roster": state.roster,
            });
            broadcast(state, &message, QueuePolicy::DisconnectOnFull);
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                state,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                    "serverNow": now_ms(),
                }),
                QueuePolicy::DropOnFull,
            );
        }
    }
}

fn restart_game(state: &mut ServerState, seed: u32, characters: Option<[CharacterId; 2]>) {
    if let Some(characters) = characters {
        state.roster = characters;
    }
    state.seed = seed;
    state.game = new_game(seed, state.roster);
    state.match_count += 1;
    state.game_over_sent = false;
}

async fn handle_disconnect(state: SharedState, client_id: &str) {
    let mut guard = state.lock().await;
    disconnect_client_internal(&mut guard, client_id);
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    if let Some(client) = state.clients.remove(client_id) {
        let _ = client.tx.try_send(OutboundMessage::Close {
            code: 1000,
            reason: "disconnected".to_string(),
        });
        println!(
            "[server] {client_id} disconnected ({} clients)",
            state.clients.len()
        );
    }
    if is_controller(state, client_id) {
        state.controller_id = choose_next_controller(state);
        if let Some(next_id) = state.controller_id.clone() {
            println!("[server] {next_id} now controls the match");
            send_to_client(
                state,
                &next_id,
                &json!({ "type": "controller" }),
                QueuePolicy::DropOnFull,
            );
        }
    }
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    if state.game_over_sent {
        return;
    }
    state.game.step(TICK_MS);
    let snapshot = state.game.build_snapshot(true);
    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );

    if state.game.is_ended() {
        let summary = state.game.build_summary();
        println!(
            "[server] match {} over, winner {:?}",
            state.match_count, summary.winner
        );
        broadcast(
            state,
            &json!({
                "type": "game_over",
                "summary": summary,
            }),
            QueuePolicy::DisconnectOnFull,
        );
        state.game_over_sent = true;
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client_internal(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client_internal(state, &client_id);
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
