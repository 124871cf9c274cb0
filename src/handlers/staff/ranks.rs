//! Rank and role-flag commands.

use super::display_name;
use crate::caps::{Rank, RoleFlag, can_grant_flag};
use crate::error::{HandlerError, HandlerResult, Reply};
use crate::handlers::core::{Context, Handler};
use async_trait::async_trait;

/// `/admin` and `/mod`, kept so old habits get a pointer to `/setrank`.
pub struct MovedToSetrankHandler;

#[async_trait]
impl Handler for MovedToSetrankHandler {
    async fn handle(&self, _ctx: &mut Context<'_>) -> HandlerResult {
        Err(HandlerError::fail("This command was moved to /setrank."))
    }
}

/// `/setrank <player> <rank>`
///
/// Nobody can hand out a rank at or above their own.
pub struct SetRankHandler;

#[async_trait]
impl Handler for SetRankHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        let rank_name = ctx.args.string("rank")?;
        let rank = Rank::by_name(rank_name)
            .ok_or_else(|| HandlerError::NotFound(format!("Unknown rank {rank_name}")))?;

        if rank >= ctx.info.rank {
            return Err(HandlerError::Unauthorized(format!(
                "You do not have permission to promote players to rank \"{rank}\", because your current rank is \"{}\"",
                ctx.info.rank
            )));
        }
        let denial = format!(
            "You do not have permission to modify the rank of player \"{}\"",
            display_name(&target).await
        );
        let cap = ctx.moderate_cap(&target, false, &denial).await?;

        let entry = ctx
            .server
            .moderation
            .set_rank(&target, &ctx.info, rank, cap)
            .await?;
        Ok(Reply::Success(format!(
            "Set rank of player \"{}\" to {rank}",
            entry.target
        )))
    }
}

/// `/setflag <player> <roleflag> <value>`
///
/// Flags that widen authority can only be changed by managers or by holders
/// of the same flag.
pub struct SetFlagHandler;

#[async_trait]
impl Handler for SetFlagHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let target = ctx.args.player("player")?.clone();
        let flag_name = ctx.args.string("roleflag")?;
        let flag = RoleFlag::by_name(flag_name)
            .ok_or_else(|| HandlerError::NotFound(format!("Unknown role flag {flag_name}")))?;
        let value = ctx.args.boolean("value")?;

        if !can_grant_flag(&ctx.info, flag) {
            return Err(HandlerError::Unauthorized(format!(
                "You do not have permission to change role flag \"{flag}\", because you do not hold it."
            )));
        }
        let denial = format!(
            "You do not have permission to modify the role flags of player \"{}\"",
            display_name(&target).await
        );
        let cap = ctx.moderate_cap(&target, false, &denial).await?;

        let entry = ctx
            .server
            .moderation
            .set_flag(&target, &ctx.info, flag, value, cap)
            .await?;
        Ok(Reply::Success(format!(
            "Set role flag {flag} of player \"{}\" to {value}.",
            entry.target
        )))
    }
}

/// `/member <value> <player>`
///
/// Shorthand for the `member` role flag. Saves immediately.
pub struct MemberHandler;

#[async_trait]
impl Handler for MemberHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let value = ctx.args.boolean("value")?;
        let target = ctx.args.player("player")?.clone();
        let cap = ctx
            .moderate_cap(
                &target,
                true,
                "You do not have permission to change the membership status of this player.",
            )
            .await?;

        let entry = ctx
            .server
            .moderation
            .set_flag(&target, &ctx.info, RoleFlag::Member, value, cap)
            .await?;
        ctx.server.save_players().await?;
        Ok(Reply::Success(format!(
            "Set membership status of player \"{}\" to {value}.",
            entry.target
        )))
    }
}
