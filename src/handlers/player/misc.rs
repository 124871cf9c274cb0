//! Small self-service commands.

use crate::error::{HandlerError, HandlerResult, Reply};
use crate::handlers::core::{Context, Handler};
use crate::security::format_duration;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

/// `/afk`
pub struct AfkHandler;

#[async_trait]
impl Handler for AfkHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let (afk, decorated) = {
            let mut record = ctx.actor.write().await;
            let afk = record.toggle_afk();
            (afk, record.decorated_name())
        };
        ctx.world().update_name(&ctx.info.id, &decorated);
        Ok(Reply::Success(if afk {
            "You are marked as AFK.".into()
        } else {
            "You are no longer marked as AFK.".into()
        }))
    }
}

/// `/clean`: removes boulders from the whole map. Shares one cooldown
/// across all players.
pub struct CleanHandler;

#[async_trait]
impl Handler for CleanHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        ctx.server
            .cooldowns
            .clean
            .attempt(Utc::now())
            .map_err(|remaining| HandlerError::OnCooldown {
                message: format!(
                    "This command was run recently and is on cooldown. Try again in {}.",
                    format_duration(remaining)
                ),
                remaining,
            })?;
        let removed = ctx.world().clean_boulders();
        info!(actor = %ctx.info.name, removed, "Map cleaned");
        Ok(Reply::Success("\u{2714} Cleared the map of boulders.".into()))
    }
}

/// `/s <message>`: staff chat.
pub struct StaffChatHandler;

#[async_trait]
impl Handler for StaffChatHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let message = ctx.args.string("message")?;
        ctx.server.message_staff(&ctx.info.name, message).await;
        Ok(Reply::Plain(String::new()))
    }
}

/// `/tp <player>`
pub struct TeleportHandler;

#[async_trait]
impl Handler for TeleportHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?;
        let (target_id, name) = {
            let record = target.read().await;
            (record.id().clone(), record.cleaned_name())
        };
        let world = ctx.world();
        if !world.in_core_unit(&ctx.info.id) {
            return Err(HandlerError::fail("Can only teleport while in a core unit."));
        }
        let to = world.unit_position(&target_id).ok_or_else(|| {
            HandlerError::fail(format!("Player \"{name}\" does not have a unit."))
        })?;
        world.set_position(&ctx.info.id, to);
        world.set_camera(&ctx.info.id, to);
        Ok(Reply::Plain(String::new()))
    }
}

/// `/die`
pub struct DieHandler;

#[async_trait]
impl Handler for DieHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        if ctx.world().kill_unit(&ctx.info.id) {
            Ok(Reply::Plain(String::new()))
        } else {
            Err(HandlerError::fail("You do not have a unit."))
        }
    }
}

/// `/unpause`
pub struct UnpauseHandler;

#[async_trait]
impl Handler for UnpauseHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        ctx.world().unpause();
        Ok(Reply::Success("Unpaused the game.".into()))
    }
}
