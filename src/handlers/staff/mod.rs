//! Staff commands.

mod ipban;
mod moderation;
mod ranks;
mod server;

use crate::caps::Perm;
use crate::handlers::core::{CommandDef, CommandRegistry, RegistryError};
use crate::state::PlayerHandle;

pub use ipban::IpBanHandler;
pub use moderation::{
    FreeHandler, HistoryHandler, KickHandler, MuteHandler, MutedChatHandler, StopHandler,
    StopOfflineHandler, UnmuteHandler, WarnHandler,
};
pub use ranks::{MemberHandler, MovedToSetrankHandler, SetFlagHandler, SetRankHandler};
pub use server::{
    KillHandler, LabelHandler, MurderHandler, RespawnHandler, RestartHandler, SaveHandler,
    WaveHandler,
};

/// Cleaned display name of a target, for reply text.
async fn display_name(target: &PlayerHandle) -> String {
    target.read().await.cleaned_name()
}

pub fn register(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.register(
        CommandDef::new("warn", "Warn a player.", Perm::Mod, WarnHandler)
            .args(&["player:player", "reason:string?"]),
    )?;
    registry.register(
        CommandDef::new("mute", "Stops a player from chatting.", Perm::Mod, MuteHandler)
            .args(&["player:player"]),
    )?;
    registry.register(
        CommandDef::new("unmute", "Unmutes a player.", Perm::Mod, UnmuteHandler)
            .args(&["player:player"]),
    )?;
    registry.register(
        CommandDef::new(
            "kick",
            "Kick a player with optional reason.",
            Perm::Mod,
            KickHandler,
        )
        .args(&["player:player", "reason:string?"]),
    )?;
    registry.register(
        CommandDef::new("stop", "Stops a player.", Perm::Mod, StopHandler)
            .args(&["player:player"]),
    )?;
    registry.register(
        CommandDef::new("free", "Frees a player.", Perm::Mod, FreeHandler)
            .args(&["player:player"]),
    )?;
    for name in ["admin", "mod"] {
        registry.register(CommandDef::new(
            name,
            "This command was moved to /setrank.",
            Perm::Mod,
            MovedToSetrankHandler,
        ))?;
    }
    registry.register(
        CommandDef::new("setrank", "Set a player's rank.", Perm::Mod, SetRankHandler)
            .args(&["player:player", "rank:string"]),
    )?;
    registry.register(
        CommandDef::new(
            "setflag",
            "Set a player's role flags.",
            Perm::Mod,
            SetFlagHandler,
        )
        .args(&["player:player", "roleflag:string", "value:boolean"]),
    )?;
    registry.register(
        CommandDef::new(
            "member",
            "Sets a player's member status.",
            Perm::Admin,
            MemberHandler,
        )
        .args(&["value:boolean", "player:player"]),
    )?;
    registry.register(
        CommandDef::new("murder", "Kills all ohno units.", Perm::Mod, MurderHandler)
            .unauthorized("[yellow]You're a [scarlet]monster[]."),
    )?;
    registry.register(
        CommandDef::new(
            "stop_offline",
            "Stops an offline player.",
            Perm::Mod,
            StopOfflineHandler,
        )
        .args(&["name:string"]),
    )?;
    registry.register(CommandDef::new(
        "restart",
        "Stops and restarts the server. Do not run when the player count is high.",
        Perm::Admin,
        RestartHandler,
    ))?;
    registry.register(
        CommandDef::new(
            "history",
            "Shows moderation history for a player.",
            Perm::Mod,
            HistoryHandler,
        )
        .args(&["player:player"]),
    )?;
    registry.register(CommandDef::new(
        "save",
        "Saves the game state.",
        Perm::Mod,
        SaveHandler,
    ))?;
    registry.register(
        CommandDef::new("wave", "Sets the wave number.", Perm::Admin, WaveHandler)
            .args(&["wave:number"]),
    )?;
    registry.register(
        CommandDef::new(
            "label",
            "Places a label at your position for a specified amount of time.",
            Perm::Admin,
            LabelHandler,
        )
        .args(&["time:number", "message:string"]),
    )?;
    registry.register(
        CommandDef::new("ipban", "Bans a player's IP.", Perm::Admin, IpBanHandler)
            .args(&["ip:string?"]),
    )?;
    registry.register(
        CommandDef::new("kill", "Kills a player's unit.", Perm::Mod, KillHandler)
            .args(&["player:player"])
            .unauthorized(
                "You do not have the required permission (mod) to execute this command. You may be looking for /die.",
            ),
    )?;
    registry.register(
        CommandDef::new(
            "respawn",
            "Forces a player to respawn.",
            Perm::Mod,
            RespawnHandler,
        )
        .args(&["player:player"]),
    )?;
    registry.register(
        CommandDef::new(
            "m",
            "Sends a message to muted players only.",
            Perm::Mod,
            MutedChatHandler,
        )
        .args(&["message:string"]),
    )?;
    Ok(())
}
