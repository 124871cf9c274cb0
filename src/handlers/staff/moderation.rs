//! Per-player moderation commands: warn, mute, unmute, kick, stop, free,
//! stop_offline, history and muted-player chat.

use super::display_name;
use crate::error::{HandlerError, HandlerResult, Reply};
use crate::handlers::core::{ChoiceContinuation, Context, Handler, Lookup, resolve_player};
use crate::history::{AuditLog, HistoryOrder};
use crate::state::{ModerationError, PlayerHandle, PlayerId};
use async_trait::async_trait;
use chrono::Utc;

const DEFAULT_WARNING: &str = "You have been warned. I suggest you stop what you're doing";
const DEFAULT_KICK_REASON: &str = "A staff member did not like your actions.";

/// `/warn <player> [reason]`
pub struct WarnHandler;

#[async_trait]
impl Handler for WarnHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        let reason = ctx.args.opt_string("reason").unwrap_or(DEFAULT_WARNING).to_string();
        let cap = ctx
            .moderate_cap(&target, false, "You do not have permission to warn this player.")
            .await?;

        let target_id = target.read().await.id().clone();
        ctx.server.menu.present_notice(&target_id, "Warning", &reason);
        ctx.server
            .moderation
            .record_action(&target, &ctx.info, "warned", cap)
            .await?;
        Ok(Reply::Success(format!(
            "Warned player \"{}\" for \"{reason}\"",
            display_name(&target).await
        )))
    }
}

/// `/mute <player>`
pub struct MuteHandler;

#[async_trait]
impl Handler for MuteHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        {
            let record = target.read().await;
            if record.is_muted() {
                return Err(ModerationError::AlreadyMuted(record.cleaned_name()).into());
            }
        }
        let cap = ctx
            .moderate_cap(&target, false, "You do not have permission to mute this player.")
            .await?;
        ctx.server.moderation.mute(&target, &ctx.info, cap).await?;
        Ok(Reply::Success(format!(
            "Muted player \"{}\".",
            display_name(&target).await
        )))
    }
}

/// `/unmute <player>`
pub struct UnmuteHandler;

#[async_trait]
impl Handler for UnmuteHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        {
            let record = target.read().await;
            if !record.is_muted() {
                return Err(ModerationError::NotMuted(record.cleaned_name()).into());
            }
        }
        let cap = ctx
            .moderate_cap(&target, false, "You do not have permission to unmute this player.")
            .await?;
        ctx.server.moderation.unmute(&target, &ctx.info, cap).await?;
        Ok(Reply::Success(format!(
            "Unmuted player \"{}\".",
            display_name(&target).await
        )))
    }
}

/// `/kick <player> [reason]`
pub struct KickHandler;

#[async_trait]
impl Handler for KickHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        let cap = ctx
            .moderate_cap(&target, false, "You do not have permission to kick this player.")
            .await?;
        let reason = ctx
            .args
            .opt_string("reason")
            .unwrap_or(DEFAULT_KICK_REASON)
            .to_string();

        let (target_id, online) = {
            let record = target.read().await;
            (record.id().clone(), record.is_online())
        };
        if !online {
            return Err(HandlerError::fail(format!(
                "Player \"{}\" is not online.",
                display_name(&target).await
            )));
        }
        ctx.world().kick(&target_id, &reason);
        ctx.server
            .moderation
            .record_action(&target, &ctx.info, "kicked", cap)
            .await?;
        Ok(Reply::Success(format!(
            "Kicked player \"{}\" for \"{reason}\"",
            display_name(&target).await
        )))
    }
}

/// `/stop <player>`
///
/// Announces the stop to everyone rather than replying to the actor.
pub struct StopHandler;

#[async_trait]
impl Handler for StopHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        {
            let record = target.read().await;
            if record.is_stopped() {
                return Err(ModerationError::AlreadyStopped(record.name().to_string()).into());
            }
        }
        let cap = ctx
            .moderate_cap(&target, false, "You do not have permission to stop this player.")
            .await?;
        let entry = ctx.server.moderation.stop(&target, &ctx.info, cap).await?;
        ctx.world()
            .broadcast(&format!("Player \"{}\" has been stopped.", entry.target));
        Ok(Reply::Plain(String::new()))
    }
}

/// `/free <player>`
pub struct FreeHandler;

#[async_trait]
impl Handler for FreeHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        {
            let record = target.read().await;
            if !record.is_stopped() {
                return Err(ModerationError::NotStopped(record.name().to_string()).into());
            }
        }
        let cap = ctx
            .moderate_cap(&target, false, "You do not have permission to free this player.")
            .await?;
        let entry = ctx.server.moderation.free(&target, &ctx.info, cap).await?;
        Ok(Reply::Success(format!(
            "Player \"{}\" has been freed.",
            entry.target
        )))
    }
}

/// `/stop_offline <name>`
///
/// Accepts a stable id or a name. Names go through the same search as player
/// arguments; when several match the actor picks one from a menu.
pub struct StopOfflineHandler;

#[async_trait]
impl Handler for StopOfflineHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let query = ctx.args.string("name")?.to_string();
        let threshold = ctx.server.config.limits.name_search_threshold;
        match resolve_player(&ctx.server.store, &query, threshold)? {
            Lookup::Found(target) => stop_offline(ctx, &target).await,
            Lookup::Ambiguous(candidates) => {
                let options = candidates.iter().map(|c| c.name.clone()).collect();
                let candidates = candidates.into_iter().map(|c| c.id).collect();
                Ok(ctx.defer_choice(
                    "Stop",
                    "Choose a player to stop",
                    options,
                    StopOfflineChoice { candidates },
                ))
            }
        }
    }
}

struct StopOfflineChoice {
    candidates: Vec<PlayerId>,
}

#[async_trait]
impl ChoiceContinuation for StopOfflineChoice {
    async fn resume(self: Box<Self>, ctx: &mut Context<'_>, choice: usize) -> HandlerResult {
        let target = self
            .candidates
            .get(choice)
            .and_then(|id| ctx.server.store.get(id))
            .ok_or_else(|| HandlerError::fail("Invalid choice."))?;
        stop_offline(ctx, &target).await
    }
}

/// Unlike `/stop`, an actor may stop themselves here.
async fn stop_offline(ctx: &Context<'_>, target: &PlayerHandle) -> HandlerResult {
    let cap = ctx
        .moderate_cap(target, true, "You do not have permission to stop this player.")
        .await?;
    let entry = ctx.server.moderation.stop(target, &ctx.info, cap).await?;
    Ok(Reply::Success(format!(
        "Player \"{}\" was stopped.",
        entry.target
    )))
}

/// `/history <player>`
pub struct HistoryHandler;

#[async_trait]
impl Handler for HistoryHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?;
        let record = target.read().await;
        let entries = AuditLog::read_all(&record, HistoryOrder::OldestFirst);
        if entries.is_empty() {
            return Ok(Reply::Plain(format!(
                "[yellow]No history was found for player {}.",
                record.name()
            )));
        }
        let now = Utc::now();
        let lines: Vec<String> = entries.iter().map(|e| e.render(now)).collect();
        Ok(Reply::Plain(format!(
            "[yellow]_______________Player history_______________\n\n{}",
            lines.join("\n")
        )))
    }
}

/// `/m <message>`: talk to muted players, who cannot see public chat replies.
pub struct MutedChatHandler;

#[async_trait]
impl Handler for MutedChatHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let message = ctx.args.string("message")?;
        let sent = ctx.server.message_muted(&ctx.info.name, message).await;
        tracing::debug!(sent, "Message to muted players");
        Ok(Reply::Plain(String::new()))
    }
}
