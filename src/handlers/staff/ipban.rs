//! `/ipban [ip]`
//!
//! With an address, bans it directly, provided the actor may moderate every
//! known player last seen there. Without one, offers the actor a menu of
//! online players they are allowed to moderate.

use super::display_name;
use crate::caps::can_moderate;
use crate::error::{HandlerError, HandlerResult, Reply};
use crate::handlers::core::{ChoiceContinuation, Context, Handler};
use crate::security::is_ip;
use crate::state::PlayerId;
use async_trait::async_trait;
use tracing::info;

pub struct IpBanHandler;

#[async_trait]
impl Handler for IpBanHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        if let Some(ip) = ctx.args.opt_string("ip") {
            if !is_ip(ip) {
                return Err(HandlerError::fail(format!("\"{ip}\" is not an IP address.")));
            }
            let ip = ip.to_string();
            return ban_address(ctx, &ip).await;
        }

        let mut options = Vec::new();
        let mut candidates = Vec::new();
        for handle in ctx.server.store.online().await {
            let record = handle.read().await;
            if can_moderate(&ctx.info, record.id(), record.rank(), false) {
                options.push(record.name().to_string());
                candidates.push(record.id().clone());
            }
        }
        if candidates.is_empty() {
            return Err(HandlerError::fail("There are no players you can IP ban."));
        }
        Ok(ctx.defer_choice(
            "IP BAN",
            "Choose a player to IP ban.",
            options,
            IpBanChoice { candidates },
        ))
    }
}

/// Ban `ip` and record the ban on every player last seen there.
///
/// All tokens are minted before anything happens, so one protected player
/// blocks the whole ban.
async fn ban_address(ctx: &Context<'_>, ip: &str) -> HandlerResult {
    let mut targets = Vec::new();
    for handle in ctx.server.store.by_last_ip(ip).await {
        let denial = format!(
            "You do not have permission to IP ban {ip}, because it belongs to player \"{}\".",
            display_name(&handle).await
        );
        let cap = ctx.moderate_cap(&handle, false, &denial).await?;
        targets.push((handle, cap));
    }

    ctx.world().ban_ip(ip);
    for (handle, cap) in targets {
        let (id, online) = {
            let record = handle.read().await;
            (record.id().clone(), record.is_online())
        };
        if online {
            ctx.world().kick(&id, "You have been banned.");
        }
        ctx.server
            .moderation
            .record_action(&handle, &ctx.info, "ip-banned", cap)
            .await?;
    }
    info!(actor = %ctx.info.name, ip, "IP banned");
    Ok(Reply::Success(format!("IP-banned {ip}.")))
}

struct IpBanChoice {
    candidates: Vec<PlayerId>,
}

#[async_trait]
impl ChoiceContinuation for IpBanChoice {
    async fn resume(self: Box<Self>, ctx: &mut Context<'_>, choice: usize) -> HandlerResult {
        let target = self
            .candidates
            .get(choice)
            .and_then(|id| ctx.server.store.get(id))
            .ok_or_else(|| HandlerError::fail("Invalid choice."))?;
        // The target may have been promoted while the menu was open.
        let cap = ctx
            .moderate_cap(&target, false, "You do not have permission to IP ban this player.")
            .await?;

        let (id, name, ip) = {
            let record = target.read().await;
            (
                record.id().clone(),
                record.cleaned_name(),
                record.last_ip().map(str::to_string),
            )
        };
        let ip = ip.ok_or_else(|| {
            HandlerError::fail(format!("No IP address is known for player \"{name}\"."))
        })?;

        ctx.world().ban_ip(&ip);
        ctx.world().kick(&id, "You have been banned.");
        ctx.server
            .moderation
            .record_action(&target, &ctx.info, "ip-banned", cap)
            .await?;
        info!(actor = %ctx.info.name, target = %id, ip, "IP banned");
        Ok(Reply::Success(format!("IP-banned player {name}.")))
    }
}
