//! Shared state: player records, the player store, the moderation state
//! machine and the server that ties them together.

mod moderation;
mod player;
mod server;
mod store;

pub use moderation::{Moderation, ModerationError};
pub use player::{ActorInfo, ModerationState, PlayerHandle, PlayerId, PlayerRecord, clean_name};
pub use server::{CONSOLE_ID, ChatVerdict, ChoiceOutcome, Server, ServerParams};
pub use store::{DirectoryEntry, PlayerDirectory, PlayerStore};
