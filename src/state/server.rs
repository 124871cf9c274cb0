//! Shared server state.
//!
//! [`Server`] ties the player store, command registry, moderation engine and
//! external collaborators together. It is created once at startup and shared
//! as `Arc<Server>` by every invocation path and background task.

use super::moderation::Moderation;
use super::player::{PlayerHandle, PlayerId, PlayerRecord};
use super::store::PlayerStore;
use crate::caps::{Cap, Rank, ServerCap};
use crate::config::Config;
use crate::db::{DbError, LAST_RESTART_KEY, Persistence};
use crate::error::{DispatchError, HandlerError};
use crate::game::{Menu, World};
use crate::handlers::core::{
    ChoiceError, CommandRegistry, Dispatched, OutputRef, PendingChoices, PendingKind,
};
use crate::history::{AuditLog, AuditSink};
use crate::security::{Cooldowns, RateLimitManager, format_duration};
use crate::tasks::{TaskManager, spawn_periodic};
use chrono::{DateTime, Utc};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Stable id of the server console actor. Never a valid player id.
pub const CONSOLE_ID: &str = "console";

/// Everything [`Server::new`] needs from the outside.
pub struct ServerParams {
    pub config: Config,
    pub registry: CommandRegistry,
    pub world: Arc<dyn World>,
    pub menu: Arc<dyn Menu>,
    pub persistence: Arc<dyn Persistence>,
    pub audit_sink: Arc<dyn AuditSink>,
}

/// Whether a chat message may be shown to everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatVerdict {
    Allowed,
    /// Relayed to staff and other muted players only.
    Muted,
}

/// What happened to an answered menu choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// The actor dismissed the menu; nothing ran.
    Cancelled,
    Resumed(Result<Dispatched, DispatchError>),
}

pub struct Server {
    pub config: Arc<Config>,
    pub store: PlayerStore,
    pub registry: Arc<CommandRegistry>,
    pub moderation: Moderation,
    pub audit: Arc<AuditLog>,
    pub world: Arc<dyn World>,
    pub menu: Arc<dyn Menu>,
    pub persistence: Arc<dyn Persistence>,
    pub pending: PendingChoices,
    pub cooldowns: Cooldowns,
    pub rate_limits: RateLimitManager,
    pub tasks: TaskManager,
    console: PlayerHandle,
    console_id: PlayerId,
}

impl Server {
    /// Load persisted players and settings and assemble the server.
    pub async fn new(params: ServerParams) -> Result<Arc<Self>, DbError> {
        let ServerParams {
            config,
            registry,
            world,
            menu,
            persistence,
            audit_sink,
        } = params;

        let players = persistence.load_players().await?;
        let settings = persistence.load_settings().await?;
        info!(players = players.len(), "Loaded player records");

        let cooldowns = Cooldowns::new(
            Duration::from_secs(config.cooldowns.restart_secs),
            Duration::from_secs(config.cooldowns.clean_secs),
        );
        if let Some(&last) = settings.get(LAST_RESTART_KEY) {
            cooldowns.restart.restore(last);
            debug!(last_restart_ms = last, "Restored restart cooldown");
        }

        let console_id = PlayerId::new(CONSOLE_ID);
        let mut console = PlayerRecord::new(console_id.clone(), config.server.console_name.clone());
        console.set_rank(Rank::Manager);
        console.set_flag(crate::caps::RoleFlag::AllAccess, true);

        let audit = Arc::new(AuditLog::new(audit_sink));
        let store = PlayerStore::from_records(players);
        // A fresh process has nobody online, whatever was saved.
        store.mark_all_offline(Utc::now()).await;

        Ok(Arc::new(Self {
            moderation: Moderation::new(audit.clone(), world.clone()),
            pending: PendingChoices::new(config.limits.choice_ttl()),
            rate_limits: RateLimitManager::new(&config.rate_limits),
            config: Arc::new(config),
            store,
            registry: Arc::new(registry),
            audit,
            world,
            menu,
            persistence,
            cooldowns,
            tasks: TaskManager::new(),
            console: Arc::new(RwLock::new(console)),
            console_id,
        }))
    }

    /// The console actor. Holds every permission and is not in the store.
    pub fn console(&self) -> &PlayerHandle {
        &self.console
    }

    pub fn console_id(&self) -> &PlayerId {
        &self.console_id
    }

    fn actor_handle(&self, id: &PlayerId) -> Option<PlayerHandle> {
        if *id == self.console_id {
            Some(self.console.clone())
        } else {
            self.store.get(id)
        }
    }

    // === Session lifecycle ===

    /// A player connected. Creates the record on first contact.
    pub async fn player_join(&self, id: &PlayerId, name: &str, ip: &str) -> PlayerHandle {
        let (handle, created) = self.store.get_or_create(id, name);
        if !created {
            self.store.rename(&handle, name).await;
        }
        {
            let mut record = handle.write().await;
            record.set_online(true, Utc::now());
            record.set_last_ip(ip);
        }
        self.moderation.reapply_on_join(&handle).await;
        {
            let record = handle.read().await;
            self.world.update_name(id, &record.decorated_name());
        }
        info!(player = %id, name, created, "Player joined");
        self.refresh_online_gauge().await;
        handle
    }

    /// A player disconnected. Drops everything that was waiting on them.
    pub async fn player_leave(&self, id: &PlayerId) {
        let Some(handle) = self.store.get(id) else {
            warn!(player = %id, "Leave for unknown player");
            return;
        };
        handle.write().await.set_online(false, Utc::now());
        let cancelled = self.pending.cancel_for(id);
        let watching = self.tasks.stop_watch(id);
        self.rate_limits.remove_client(id);
        info!(player = %id, cancelled, watching, "Player left");
        self.refresh_online_gauge().await;
    }

    /// Screen a chat message. Muted players only reach staff and each other.
    pub async fn player_chat(&self, id: &PlayerId, text: &str) -> ChatVerdict {
        let Some(handle) = self.store.get(id) else {
            return ChatVerdict::Allowed;
        };
        let (muted, name) = {
            let record = handle.read().await;
            (record.is_muted(), record.name().to_string())
        };
        if !muted {
            return ChatVerdict::Allowed;
        }
        self.message_muted(&name, text).await;
        ChatVerdict::Muted
    }

    async fn refresh_online_gauge(&self) {
        let online = self.store.online().await.len();
        crate::metrics::set_online_players(online as i64);
    }

    // === Broadcast helpers ===

    /// Send to every online staff member.
    pub async fn message_staff(&self, sender: &str, text: &str) -> usize {
        let message = format!("[gray]<[cyan]staff[gray]>[white]{sender}[green]: [cyan]{text}");
        let mut sent = 0;
        for handle in self.store.online().await {
            let record = handle.read().await;
            if record.rank().is_staff() {
                self.world.send_message(record.id(), &message);
                sent += 1;
            }
        }
        sent
    }

    /// Send to every online muted player, and to staff so they see the thread.
    pub async fn message_muted(&self, sender: &str, text: &str) -> usize {
        let message = format!("[pink][Muted][white] {sender}[pink]: [white]{text}");
        let mut sent = 0;
        for handle in self.store.online().await {
            let record = handle.read().await;
            if record.is_muted() || record.rank().is_staff() {
                self.world.send_message(record.id(), &message);
                sent += 1;
            }
        }
        sent
    }

    // === Commands ===

    /// Dispatch a command invocation on behalf of `actor`.
    pub async fn dispatch(
        self: &Arc<Self>,
        name: &str,
        raw_args: &str,
        actor: PlayerHandle,
        output: OutputRef,
    ) -> Result<Dispatched, DispatchError> {
        self.registry
            .dispatch(self, name, raw_args, actor, output)
            .await
    }

    /// Dispatch a full command line such as `/mute foo`.
    pub async fn dispatch_line(
        self: &Arc<Self>,
        line: &str,
        actor: PlayerHandle,
        output: OutputRef,
    ) -> Result<Dispatched, DispatchError> {
        let line = line.trim().trim_start_matches('/');
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        self.dispatch(name, rest, actor, output).await
    }

    /// Answer a pending menu choice. `None` dismisses it.
    pub async fn resolve_choice(
        self: &Arc<Self>,
        id: &Uuid,
        chooser: &PlayerId,
        choice: Option<usize>,
    ) -> Result<ChoiceOutcome, ChoiceError> {
        let pending = self.pending.take(id, chooser)?;
        let Some(index) = choice else {
            debug!(%id, chooser = %chooser, "Choice dismissed");
            return Ok(ChoiceOutcome::Cancelled);
        };
        let Some(actor) = self.actor_handle(chooser) else {
            return Err(ChoiceError::Unknown);
        };
        let result = match pending.kind {
            PendingKind::Argument { .. } => {
                self.registry
                    .resume_argument(self, pending, index, actor)
                    .await
            }
            PendingKind::Handler { .. } => {
                self.registry
                    .resume_continuation(self, pending, index, actor)
                    .await
            }
        };
        Ok(ChoiceOutcome::Resumed(result))
    }

    // === Persistence ===

    /// Write every player record.
    pub async fn save_players(&self) -> Result<(), HandlerError> {
        let records = self.store.snapshot().await;
        self.persistence.save_players(&records).await.map_err(|e| {
            error!(error = %e, "Failed to save player records");
            HandlerError::from(e)
        })
    }

    /// Write player records and the world save.
    pub async fn save_all(&self) -> Result<(), HandlerError> {
        self.save_players().await?;
        let file = &self.config.server.world_file;
        self.world.save_world(file).map_err(|e| {
            error!(file, error = %e, "Failed to save world");
            HandlerError::Persistence(e.to_string())
        })
    }

    // === Restart ===

    /// Start the restart countdown.
    ///
    /// Fails when the restart cooldown has not elapsed. The last-run time is
    /// persisted before the countdown starts so it survives the restart.
    pub async fn begin_restart(
        self: &Arc<Self>,
        _cap: Cap<ServerCap>,
        now: DateTime<Utc>,
    ) -> Result<(), HandlerError> {
        let cooldown = &self.cooldowns.restart;
        cooldown
            .attempt(now)
            .map_err(|remaining| HandlerError::OnCooldown {
                message: format!(
                    "You need to wait at least {} between restarts. Try again in {}.",
                    format_duration(cooldown.window()),
                    format_duration(remaining)
                ),
                remaining,
            })?;

        if let Err(e) = self
            .persistence
            .save_setting(LAST_RESTART_KEY, now.timestamp_millis())
            .await
        {
            error!(error = %e, "Failed to persist restart time");
        }

        let Some(flag) = self.tasks.begin_restart() else {
            return Err(HandlerError::fail("A restart is already in progress."));
        };

        let countdown = self.config.cooldowns.restart_countdown_secs;
        info!(countdown, "Restart countdown started");
        let server = Arc::clone(self);
        spawn_periodic(
            "restart",
            Duration::from_secs(1),
            Some(countdown + 1),
            flag,
            move |tick| {
                let server = Arc::clone(&server);
                async move {
                    if tick == 0 {
                        server
                            .world
                            .broadcast("[green]Game saved. [scarlet]Server restarting in:");
                    }
                    let remaining = countdown.saturating_sub(tick);
                    server.world.broadcast(&format!("[scarlet]{remaining}"));
                    if remaining == 0 {
                        server.finish_restart().await;
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                }
            },
        );
        Ok(())
    }

    async fn finish_restart(&self) {
        self.world.kick_all("[scarlet]The server is restarting.");
        self.store.mark_all_offline(Utc::now()).await;
        if let Err(e) = self.save_all().await {
            error!(error = %e, "Restarting without a complete save");
        }
        info!("Restart countdown finished, exiting");
        self.world.exit();
    }

    /// Cancel background work. Pending choices are dropped unanswered.
    pub fn shutdown(&self) {
        self.tasks.cancel_all();
        self.pending.clear();
        info!("Server shut down");
    }
}
