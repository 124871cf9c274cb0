//! Collaborator interfaces into the running game.
//!
//! The engine never touches the simulation directly. Everything it does to
//! the world (freezing units, kicking, broadcasting) goes through [`World`],
//! and every menu it shows goes through [`Menu`]. Both are synchronous
//! fire-and-forget calls from the engine's point of view.

use crate::state::PlayerId;
use thiserror::Error;
use uuid::Uuid;

pub mod console;

pub use console::{ConsoleMenu, ConsoleOutput, ConsoleWorld};

/// World coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("failed to save world to {file}: {reason}")]
    Save { file: String, reason: String },
}

/// Side effects on the game world.
pub trait World: Send + Sync {
    fn freeze(&self, player: &PlayerId);
    fn unfreeze(&self, player: &PlayerId);
    fn kick(&self, player: &PlayerId, reason: &str);
    fn kick_all(&self, reason: &str);
    fn ban_ip(&self, ip: &str);

    /// Kill the player's unit. Returns false if they have none.
    fn kill_unit(&self, player: &PlayerId) -> bool;
    fn respawn(&self, player: &PlayerId);
    fn unit_position(&self, player: &PlayerId) -> Option<Position>;
    /// Whether the player's unit was spawned by a core.
    fn in_core_unit(&self, player: &PlayerId) -> bool;
    fn set_position(&self, player: &PlayerId, at: Position);
    fn set_camera(&self, player: &PlayerId, at: Position);

    fn send_message(&self, player: &PlayerId, text: &str);
    fn broadcast(&self, text: &str);
    fn label(&self, text: &str, duration_secs: f32, at: Position);
    fn update_name(&self, player: &PlayerId, decorated: &str);

    fn set_wave(&self, wave: u32);
    fn unpause(&self);
    /// Kill every ohno unit; returns how many there were.
    fn kill_ohnos(&self) -> usize;
    /// Remove boulders; returns how many tiles were cleared.
    fn clean_boulders(&self) -> usize;

    fn save_world(&self, file: &str) -> Result<(), WorldError>;
    fn exit(&self);
}

/// A choice menu presented to one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRequest {
    /// Correlation id; the answer comes back through `Server::resolve_choice`.
    pub id: Uuid,
    pub player: PlayerId,
    pub title: String,
    pub body: String,
    pub options: Vec<String>,
}

pub trait Menu: Send + Sync {
    fn present_choice(&self, request: ChoiceRequest);

    /// Informational popup with a single dismiss button.
    fn present_notice(&self, player: &PlayerId, title: &str, body: &str);
}
