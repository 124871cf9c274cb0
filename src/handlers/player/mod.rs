//! Commands available to ordinary players.

mod help;
mod misc;
mod watch;

use crate::caps::Perm;
use crate::handlers::core::{CommandDef, CommandRegistry, RegistryError};

pub use help::HelpHandler;
pub use misc::{
    AfkHandler, CleanHandler, DieHandler, StaffChatHandler, TeleportHandler, UnpauseHandler,
};
pub use watch::WatchHandler;

pub fn register(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.register(
        CommandDef::new(
            "help",
            "Displays a list of all commands.",
            Perm::All,
            HelpHandler,
        )
        .args(&["page:string?"]),
    )?;
    registry.register(CommandDef::new(
        "afk",
        "Toggles your afk status.",
        Perm::All,
        AfkHandler,
    ))?;
    registry.register(CommandDef::new(
        "clean",
        "Removes all boulders from the map.",
        Perm::NotGriefer,
        CleanHandler,
    ))?;
    registry.register(
        CommandDef::new(
            "s",
            "Sends a message to staff only.",
            Perm::All,
            StaffChatHandler,
        )
        .args(&["message:string"]),
    )?;
    registry.register(
        CommandDef::new(
            "watch",
            "Watch/unwatch a player.",
            Perm::All,
            WatchHandler,
        )
        .args(&["player:player?"]),
    )?;
    registry.register(
        CommandDef::new(
            "tp",
            "Teleport to another player.",
            Perm::NotGriefer,
            TeleportHandler,
        )
        .args(&["player:player"]),
    )?;
    registry.register(CommandDef::new(
        "die",
        "Commits die.",
        Perm::NotGriefer,
        DieHandler,
    ))?;
    registry.register(CommandDef::new(
        "unpause",
        "Unpauses the game.",
        Perm::NotGriefer,
        UnpauseHandler,
    ))?;
    Ok(())
}
