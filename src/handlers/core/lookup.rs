//! Resolution of player arguments.
//!
//! A token that looks like a stable id and names a known record resolves to
//! that record outright. Anything else is a name search over every known
//! identity, online or not.

use crate::error::HandlerError;
use crate::security::is_stable_id;
use crate::state::{DirectoryEntry, PlayerDirectory, PlayerHandle};

/// Outcome of resolving one player token.
#[derive(Debug)]
pub enum Lookup {
    Found(PlayerHandle),
    /// More than one candidate; the actor has to pick.
    Ambiguous(Vec<DirectoryEntry>),
}

/// Resolve `query` against `directory`.
///
/// When a name search returns more than `threshold` matches, only exact name
/// matches are considered; if there are none the search is too broad.
pub fn resolve_player(
    directory: &dyn PlayerDirectory,
    query: &str,
    threshold: usize,
) -> Result<Lookup, HandlerError> {
    if is_stable_id(query)
        && let Some(handle) = directory.get_by_stable_id(query)
    {
        return Ok(Lookup::Found(handle));
    }

    let mut candidates = directory.search_by_name(query);
    if candidates.is_empty() {
        return Err(HandlerError::NotFound(
            "No players with that name were found.".to_string(),
        ));
    }
    if candidates.len() > threshold {
        let exact = directory.find_exact_name(query);
        if exact.is_empty() {
            return Err(HandlerError::fail("Too many players with that name."));
        }
        candidates = exact;
    }

    let chosen = match candidates.as_slice() {
        [only] => Some(only.id.clone()),
        _ => {
            // A single exact match wins over partial matches.
            let exact = directory.find_exact_name(query);
            match exact.as_slice() {
                [only] => Some(only.id.clone()),
                _ => None,
            }
        }
    };

    match chosen {
        Some(id) => directory
            .get_by_stable_id(id.as_str())
            .map(Lookup::Found)
            .ok_or_else(|| HandlerError::Internal(format!("indexed player {id} has no record"))),
        None => Ok(Lookup::Ambiguous(candidates)),
    }
}
