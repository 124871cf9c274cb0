//! Stand-in collaborators for running the engine from a terminal.
//!
//! The console world has no simulation behind it: effects are logged, chat
//! goes to stdout, and menus are printed with their correlation id so the
//! operator can answer them with `!pick`.

use super::{ChoiceRequest, Menu, Position, World, WorldError};
use crate::handlers::core::Output;
use crate::state::{PlayerId, clean_name};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Notify;
use tracing::info;

pub struct ConsoleWorld {
    save_dir: PathBuf,
    wave: AtomicU32,
    exit: Arc<Notify>,
}

impl ConsoleWorld {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
            wave: AtomicU32::new(1),
            exit: Arc::new(Notify::new()),
        }
    }

    /// Notified once when the engine asks the process to exit.
    pub fn exit_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.exit)
    }
}

impl World for ConsoleWorld {
    fn freeze(&self, player: &PlayerId) {
        info!(%player, "world: freeze");
    }

    fn unfreeze(&self, player: &PlayerId) {
        info!(%player, "world: unfreeze");
    }

    fn kick(&self, player: &PlayerId, reason: &str) {
        info!(%player, reason, "world: kick");
    }

    fn kick_all(&self, reason: &str) {
        info!(reason, "world: kick all");
    }

    fn ban_ip(&self, ip: &str) {
        info!(ip, "world: ban ip");
    }

    fn kill_unit(&self, player: &PlayerId) -> bool {
        info!(%player, "world: kill unit");
        false
    }

    fn respawn(&self, player: &PlayerId) {
        info!(%player, "world: respawn");
    }

    fn unit_position(&self, _player: &PlayerId) -> Option<Position> {
        None
    }

    fn in_core_unit(&self, _player: &PlayerId) -> bool {
        false
    }

    fn set_position(&self, player: &PlayerId, at: Position) {
        info!(%player, x = at.x, y = at.y, "world: set position");
    }

    fn set_camera(&self, player: &PlayerId, at: Position) {
        info!(%player, x = at.x, y = at.y, "world: set camera");
    }

    fn send_message(&self, player: &PlayerId, text: &str) {
        println!("[to {player}] {}", clean_name(text));
    }

    fn broadcast(&self, text: &str) {
        println!("[all] {}", clean_name(text));
    }

    fn label(&self, text: &str, duration_secs: f32, at: Position) {
        info!(text, duration_secs, x = at.x, y = at.y, "world: label");
    }

    fn update_name(&self, player: &PlayerId, decorated: &str) {
        info!(%player, name = decorated, "world: update name");
    }

    fn set_wave(&self, wave: u32) {
        self.wave.store(wave, Ordering::Relaxed);
        info!(wave, "world: set wave");
    }

    fn unpause(&self) {
        info!("world: unpause");
    }

    fn kill_ohnos(&self) -> usize {
        0
    }

    fn clean_boulders(&self) -> usize {
        0
    }

    fn save_world(&self, file: &str) -> Result<(), WorldError> {
        let path = self.save_dir.join(file);
        let body = serde_json::json!({
            "wave": self.wave.load(Ordering::Relaxed),
            "saved_at": Utc::now(),
        });
        std::fs::write(&path, body.to_string()).map_err(|e| WorldError::Save {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), "world: saved");
        Ok(())
    }

    fn exit(&self) {
        info!("world: exit requested");
        self.exit.notify_one();
    }
}

pub struct ConsoleMenu;

impl Menu for ConsoleMenu {
    fn present_choice(&self, request: ChoiceRequest) {
        println!(
            "== {} == {}",
            clean_name(&request.title),
            clean_name(&request.body)
        );
        for (i, option) in request.options.iter().enumerate() {
            println!("  {}) {}", i + 1, clean_name(option));
        }
        println!("  answer with: !pick {} <n>   (or !pick {} cancel)", request.id, request.id);
    }

    fn present_notice(&self, player: &PlayerId, title: &str, body: &str) {
        println!("[to {player}] {}: {}", clean_name(title), clean_name(body));
    }
}

/// Output channel for commands typed at the server console.
pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn success(&self, text: &str) {
        println!("ok: {}", clean_name(text));
    }

    fn fail(&self, text: &str) {
        println!("error: {}", clean_name(text));
    }

    fn plain(&self, text: &str) {
        println!("{}", clean_name(text));
    }
}
