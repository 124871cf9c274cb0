//! Command handlers.
//!
//! [`core`] holds the dispatch machinery; [`staff`] and [`player`] hold the
//! commands themselves, each with a `register` function.

pub mod core;
pub mod player;
pub mod staff;

use self::core::{CommandRegistry, RegistryError};

/// The full command set.
pub fn default_registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();
    staff::register(&mut registry)?;
    player::register(&mut registry)?;
    Ok(registry)
}
