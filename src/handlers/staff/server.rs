//! Server-wide staff commands.

use crate::caps::CapabilityAuthority;
use crate::error::{HandlerError, HandlerResult, Reply};
use crate::handlers::core::{Context, Handler};
use crate::tasks::{CancelFlag, spawn_periodic};
use async_trait::async_trait;
use chrono::Utc;
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::info;

/// `/restart`
pub struct RestartHandler;

#[async_trait]
impl Handler for RestartHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let cap = CapabilityAuthority::request_server_cap(&ctx.info).ok_or_else(|| {
            HandlerError::Unauthorized("You do not have permission to restart the server.".into())
        })?;
        ctx.server.begin_restart(cap, Utc::now()).await?;
        info!(actor = %ctx.info.name, "Restart requested");
        Ok(Reply::Plain(String::new()))
    }
}

/// `/save`
pub struct SaveHandler;

#[async_trait]
impl Handler for SaveHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        ctx.server.save_all().await?;
        Ok(Reply::Success("Game saved.".into()))
    }
}

/// `/wave <wave>`
pub struct WaveHandler;

#[async_trait]
impl Handler for WaveHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let wave = ctx.args.number("wave")?;
        if wave < 1.0 || wave.fract() != 0.0 || wave > f64::from(u32::MAX) {
            return Err(HandlerError::fail("Wave must be a positive integer."));
        }
        let wave = wave as u32;
        ctx.world().set_wave(wave);
        Ok(Reply::Success(format!("Set wave to {wave}")))
    }
}

/// `/label <time> <message>`
///
/// Shows a label at the actor's position, refreshed once a second with the
/// time left.
pub struct LabelHandler;

#[async_trait]
impl Handler for LabelHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let time = ctx.args.number("time")?;
        let max = ctx.server.config.limits.max_label_secs;
        if time <= 0.0 || time > f64::from(max) {
            return Err(HandlerError::fail(format!(
                "Time must be a positive number less than {max}."
            )));
        }
        let message = ctx.args.string("message")?.to_string();
        let at = ctx
            .world()
            .unit_position(&ctx.info.id)
            .ok_or_else(|| HandlerError::fail("You need a unit to place a label."))?;

        let seconds = time.ceil() as u32;
        let text_head = format!("{}\n\n[white]{message}\n\n[acid]", ctx.info.name);
        let world = ctx.world().clone();
        let flag = CancelFlag::new();
        ctx.server.tasks.track_label(flag.clone());
        spawn_periodic(
            "label",
            Duration::from_secs(1),
            Some(seconds),
            flag,
            move |tick| {
                let remaining = seconds - tick;
                world.label(
                    &format!("{text_head}{}:{:02}", remaining / 60, remaining % 60),
                    1.0,
                    at,
                );
                std::future::ready(ControlFlow::Continue(()))
            },
        );
        Ok(Reply::Success(format!(
            "Placed label \"{message}\" for {seconds} seconds."
        )))
    }
}

/// `/murder`
pub struct MurderHandler;

#[async_trait]
impl Handler for MurderHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let killed = ctx.world().kill_ohnos();
        Ok(Reply::Plain(format!(
            "[orange]You massacred [cyan]{killed}[] helpless ohno crawlers."
        )))
    }
}

/// `/kill <player>`
pub struct KillHandler;

#[async_trait]
impl Handler for KillHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        ctx.moderate_cap(
            &target,
            false,
            "You do not have permission to kill the unit of this player.",
        )
        .await?;
        let (id, name) = {
            let record = target.read().await;
            (record.id().clone(), record.cleaned_name())
        };
        if ctx.world().kill_unit(&id) {
            Ok(Reply::Success(format!("Killed the unit of player \"{name}\".")))
        } else {
            Err(HandlerError::fail(format!(
                "Player \"{name}\" does not have a unit."
            )))
        }
    }
}

/// `/respawn <player>`
pub struct RespawnHandler;

#[async_trait]
impl Handler for RespawnHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        ctx.moderate_cap(&target, false, "You do not have permission to respawn this player.")
            .await?;
        let (id, name) = {
            let record = target.read().await;
            (record.id().clone(), record.cleaned_name())
        };
        ctx.world().respawn(&id);
        Ok(Reply::Success(format!("Respawned player \"{name}\".")))
    }
}
