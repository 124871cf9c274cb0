//! Integration test common infrastructure.
//!
//! Provides a recording stand-in for the game world and menus, an output
//! channel that captures what each invocation reported, and a harness that
//! builds a server over in-memory persistence.

#![allow(dead_code)]

use fishd::caps::Rank;
use fishd::config::Config;
use fishd::db::MemoryStore;
use fishd::error::DispatchError;
use fishd::game::{ChoiceRequest, Menu, Position, World, WorldError};
use fishd::handlers::core::{CommandRegistry, Dispatched, Output};
use fishd::handlers::default_registry;
use fishd::history::NoOpSink;
use fishd::state::{PlayerHandle, PlayerId, PlayerRecord, Server, ServerParams};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A side effect the engine asked the world to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Freeze(String),
    Unfreeze(String),
    Kick(String, String),
    KickAll(String),
    BanIp(String),
    KillUnit(String),
    Respawn(String),
    SetPosition(String),
    SetCamera(String),
    Message(String, String),
    Broadcast(String),
    Label(String),
    UpdateName(String, String),
    SetWave(u32),
    Unpause,
    SaveWorld(String),
    Exit,
}

#[derive(Default)]
pub struct RecordingWorld {
    events: Mutex<Vec<WorldEvent>>,
    units: Mutex<HashMap<PlayerId, Position>>,
    pub fail_saves: AtomicBool,
    pub ohnos: AtomicUsize,
}

impl RecordingWorld {
    pub fn events(&self) -> Vec<WorldEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn has(&self, event: &WorldEvent) -> bool {
        self.events.lock().contains(event)
    }

    pub fn count(&self, pred: impl Fn(&WorldEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    pub fn messages_to(&self, id: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                WorldEvent::Message(to, text) if to == id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                WorldEvent::Broadcast(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn give_unit(&self, id: &str, at: Position) {
        self.units.lock().insert(PlayerId::new(id), at);
    }

    fn push(&self, event: WorldEvent) {
        self.events.lock().push(event);
    }
}

impl World for RecordingWorld {
    fn freeze(&self, player: &PlayerId) {
        self.push(WorldEvent::Freeze(player.to_string()));
    }

    fn unfreeze(&self, player: &PlayerId) {
        self.push(WorldEvent::Unfreeze(player.to_string()));
    }

    fn kick(&self, player: &PlayerId, reason: &str) {
        self.push(WorldEvent::Kick(player.to_string(), reason.to_string()));
    }

    fn kick_all(&self, reason: &str) {
        self.push(WorldEvent::KickAll(reason.to_string()));
    }

    fn ban_ip(&self, ip: &str) {
        self.push(WorldEvent::BanIp(ip.to_string()));
    }

    fn kill_unit(&self, player: &PlayerId) -> bool {
        self.push(WorldEvent::KillUnit(player.to_string()));
        self.units.lock().remove(player).is_some()
    }

    fn respawn(&self, player: &PlayerId) {
        self.push(WorldEvent::Respawn(player.to_string()));
    }

    fn unit_position(&self, player: &PlayerId) -> Option<Position> {
        self.units.lock().get(player).copied()
    }

    fn in_core_unit(&self, player: &PlayerId) -> bool {
        self.units.lock().contains_key(player)
    }

    fn set_position(&self, player: &PlayerId, at: Position) {
        self.units.lock().insert(player.clone(), at);
        self.push(WorldEvent::SetPosition(player.to_string()));
    }

    fn set_camera(&self, player: &PlayerId, _at: Position) {
        self.push(WorldEvent::SetCamera(player.to_string()));
    }

    fn send_message(&self, player: &PlayerId, text: &str) {
        self.push(WorldEvent::Message(player.to_string(), text.to_string()));
    }

    fn broadcast(&self, text: &str) {
        self.push(WorldEvent::Broadcast(text.to_string()));
    }

    fn label(&self, text: &str, _duration_secs: f32, _at: Position) {
        self.push(WorldEvent::Label(text.to_string()));
    }

    fn update_name(&self, player: &PlayerId, decorated: &str) {
        self.push(WorldEvent::UpdateName(
            player.to_string(),
            decorated.to_string(),
        ));
    }

    fn set_wave(&self, wave: u32) {
        self.push(WorldEvent::SetWave(wave));
    }

    fn unpause(&self) {
        self.push(WorldEvent::Unpause);
    }

    fn kill_ohnos(&self) -> usize {
        self.ohnos.swap(0, Ordering::SeqCst)
    }

    fn clean_boulders(&self) -> usize {
        0
    }

    fn save_world(&self, file: &str) -> Result<(), WorldError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(WorldError::Save {
                file: file.to_string(),
                reason: "disk full".to_string(),
            });
        }
        self.push(WorldEvent::SaveWorld(file.to_string()));
        Ok(())
    }

    fn exit(&self) {
        self.push(WorldEvent::Exit);
    }
}

#[derive(Default)]
pub struct RecordingMenu {
    choices: Mutex<Vec<ChoiceRequest>>,
    notices: Mutex<Vec<(PlayerId, String, String)>>,
}

impl RecordingMenu {
    pub fn last_choice(&self) -> Option<ChoiceRequest> {
        self.choices.lock().last().cloned()
    }

    pub fn choice_count(&self) -> usize {
        self.choices.lock().len()
    }

    pub fn notices(&self) -> Vec<(PlayerId, String, String)> {
        self.notices.lock().clone()
    }
}

impl Menu for RecordingMenu {
    fn present_choice(&self, request: ChoiceRequest) {
        self.choices.lock().push(request);
    }

    fn present_notice(&self, player: &PlayerId, title: &str, body: &str) {
        self.notices
            .lock()
            .push((player.clone(), title.to_string(), body.to_string()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reported {
    Success(String),
    Fail(String),
    Plain(String),
}

/// Output that keeps everything it was given.
#[derive(Default)]
pub struct CapturedOutput {
    lines: Mutex<Vec<Reported>>,
}

impl CapturedOutput {
    pub fn all(&self) -> Vec<Reported> {
        self.lines.lock().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.filter(|r| match r {
            Reported::Success(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn failures(&self) -> Vec<String> {
        self.filter(|r| match r {
            Reported::Fail(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn plain(&self) -> Vec<String> {
        self.filter(|r| match r {
            Reported::Plain(s) => Some(s.clone()),
            _ => None,
        })
    }

    fn filter(&self, f: impl Fn(&Reported) -> Option<String>) -> Vec<String> {
        self.lines.lock().iter().filter_map(f).collect()
    }
}

impl Output for CapturedOutput {
    fn success(&self, text: &str) {
        self.lines.lock().push(Reported::Success(text.to_string()));
    }

    fn fail(&self, text: &str) {
        self.lines.lock().push(Reported::Fail(text.to_string()));
    }

    fn plain(&self, text: &str) {
        self.lines.lock().push(Reported::Plain(text.to_string()));
    }
}

/// Defaults with rate limits loose enough that scripted tests never trip them.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.rate_limits.commands_per_second = 1000;
    config.rate_limits.command_burst = 1000;
    config.storage.players_path = None;
    config.storage.settings_path = None;
    config
}

/// A seeded player: (id, name, rank, flags).
pub type Seed<'a> = (&'a str, &'a str, Rank, &'a [&'a str]);

/// Build a persisted record the way it would be loaded from disk.
pub fn record(id: &str, name: &str, rank: Rank, flags: &[&str]) -> PlayerRecord {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "rank": rank.name(),
        "flags": flags,
    }))
    .expect("seed record")
}

pub struct TestServer {
    pub server: Arc<Server>,
    pub world: Arc<RecordingWorld>,
    pub menu: Arc<RecordingMenu>,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    pub async fn spawn(seeds: &[Seed<'_>]) -> Self {
        Self::spawn_with(test_config(), seeds).await
    }

    pub async fn spawn_with(config: Config, seeds: &[Seed<'_>]) -> Self {
        let registry = default_registry().expect("registry");
        Self::build(config, registry, MemoryStore::new(), seeds).await
    }

    pub async fn build(
        config: Config,
        registry: CommandRegistry,
        store: MemoryStore,
        seeds: &[Seed<'_>],
    ) -> Self {
        let records: Vec<PlayerRecord> = seeds
            .iter()
            .map(|(id, name, rank, flags)| record(id, name, *rank, flags))
            .collect();
        let mut existing = fishd::db::Persistence::load_players(&store)
            .await
            .expect("load");
        existing.extend(records);
        fishd::db::Persistence::save_players(&store, &existing)
            .await
            .expect("seed");

        let world = Arc::new(RecordingWorld::default());
        let menu = Arc::new(RecordingMenu::default());
        let store = Arc::new(store);
        let server = Server::new(ServerParams {
            config,
            registry,
            world: world.clone(),
            menu: menu.clone(),
            persistence: store.clone(),
            audit_sink: Arc::new(NoOpSink),
        })
        .await
        .expect("server");
        Self {
            server,
            world,
            menu,
            store,
        }
    }

    pub fn handle(&self, id: &str) -> PlayerHandle {
        self.server
            .store
            .get(&PlayerId::new(id))
            .unwrap_or_else(|| panic!("no record for {id}"))
    }

    /// Bring a seeded (or new) player online.
    pub async fn join(&self, id: &str, name: &str) -> PlayerHandle {
        let ip = format!("10.0.0.{}", id.len());
        self.server
            .player_join(&PlayerId::new(id), name, &ip)
            .await
    }

    /// Run a command line as player `id`.
    pub async fn run(
        &self,
        id: &str,
        line: &str,
    ) -> (Result<Dispatched, DispatchError>, Arc<CapturedOutput>) {
        let output = Arc::new(CapturedOutput::default());
        let result = self
            .server
            .dispatch_line(line, self.handle(id), output.clone())
            .await;
        (result, output)
    }

    /// Run a command line as the console.
    pub async fn console(
        &self,
        line: &str,
    ) -> (Result<Dispatched, DispatchError>, Arc<CapturedOutput>) {
        let output = Arc::new(CapturedOutput::default());
        let result = self
            .server
            .dispatch_line(line, self.server.console().clone(), output.clone())
            .await;
        (result, output)
    }
}
