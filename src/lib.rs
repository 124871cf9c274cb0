//! fishd - staff command, permission and moderation engine for a
//! multiplayer game server.
//!
//! The engine sits between the game and its staff: it parses and authorizes
//! commands, resolves player arguments against every identity ever seen,
//! applies moderation transitions under per-player locks, and keeps an
//! append-only audit trail. The game itself is reached only through the
//! [`game::World`] and [`game::Menu`] traits.

pub mod caps;
pub mod config;
pub mod db;
pub mod error;
pub mod game;
pub mod handlers;
pub mod history;
pub mod metrics;
pub mod security;
pub mod state;
pub mod tasks;
pub mod telemetry;
