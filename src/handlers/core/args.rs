//! Typed command arguments.
//!
//! Commands declare their arguments as compact spec strings such as
//! `"player:player"` or `"reason:string?"`. They are parsed once at
//! registration; raw input is tokenized against them at dispatch.

use super::registry::RegistryError;
use crate::error::HandlerError;
use crate::state::PlayerHandle;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Resolved to a player record via stable id or name search.
    Player,
    /// Free text. When last, consumes the rest of the input.
    String,
    /// Any finite decimal number.
    Number,
    Integer,
    Boolean,
}

impl ArgKind {
    fn by_name(name: &str) -> Option<Self> {
        match name {
            "player" => Some(Self::Player),
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "int" | "integer" => Some(Self::Integer),
            "boolean" | "bool" => Some(Self::Boolean),
            _ => None,
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub optional: bool,
}

impl ArgSpec {
    /// Parse `"name:kind"` or `"name:kind?"`.
    pub fn parse(command: &'static str, spec: &'static str) -> Result<Self, RegistryError> {
        let bad = || RegistryError::BadArgSpec { command, spec };
        let (name, kind) = spec.split_once(':').ok_or_else(bad)?;
        let (kind, optional) = match kind.strip_suffix('?') {
            Some(k) => (k, true),
            None => (kind, false),
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(bad());
        }
        let kind = ArgKind::by_name(kind).ok_or_else(bad)?;
        Ok(Self {
            name,
            kind,
            optional,
        })
    }

    fn usage_fragment(&self) -> String {
        if self.optional {
            format!("[{}]", self.name)
        } else {
            format!("<{}>", self.name)
        }
    }
}

/// Usage line, e.g. `/kick <player> [reason]`.
pub fn usage(command: &str, specs: &[ArgSpec]) -> String {
    let mut out = format!("/{command}");
    for spec in specs {
        out.push(' ');
        out.push_str(&spec.usage_fragment());
    }
    out
}

/// Check that optional arguments only trail required ones, and that only the
/// last argument may be a remainder-consuming string.
pub fn check_layout(command: &'static str, specs: &[ArgSpec]) -> Result<(), RegistryError> {
    let mut seen_optional = false;
    for spec in specs {
        if seen_optional && !spec.optional {
            return Err(RegistryError::RequiredAfterOptional {
                command,
                arg: spec.name,
            });
        }
        seen_optional |= spec.optional;
    }
    Ok(())
}

/// Split raw input into one token per declared argument.
///
/// A trailing string argument takes everything left over; otherwise surplus
/// tokens are ignored. Missing optional arguments come back as `None`; a
/// missing required one is a usage error.
pub fn split_tokens(
    command: &str,
    specs: &[ArgSpec],
    raw: &str,
) -> Result<Vec<Option<String>>, HandlerError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let mut out = Vec::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        let is_last = i + 1 == specs.len();
        let token = if is_last && spec.kind == ArgKind::String {
            tokens.get(i..).filter(|t| !t.is_empty()).map(|t| t.join(" "))
        } else {
            tokens.get(i).map(|t| (*t).to_string())
        };
        if token.is_none() && !spec.optional {
            return Err(HandlerError::usage(
                format!("Missing required argument \"{}\".", spec.name),
                usage(command, specs),
            ));
        }
        out.push(token);
    }
    Ok(out)
}

/// Parse a boolean from the accepted vocabulary.
pub fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "y" | "t" | "1" => Some(true),
        "false" | "no" | "off" | "n" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Parse a non-player token according to its declared kind.
pub fn parse_scalar(
    command: &str,
    specs: &[ArgSpec],
    spec: &ArgSpec,
    token: &str,
) -> Result<ArgValue, HandlerError> {
    let invalid = |what: &str| {
        HandlerError::usage(
            format!("Invalid {what} \"{token}\" for argument \"{}\".", spec.name),
            usage(command, specs),
        )
    };
    match spec.kind {
        ArgKind::String => Ok(ArgValue::String(token.to_string())),
        ArgKind::Number => token
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ArgValue::Number)
            .ok_or_else(|| invalid("number")),
        ArgKind::Integer => token
            .parse::<i64>()
            .map(ArgValue::Integer)
            .map_err(|_| invalid("integer")),
        ArgKind::Boolean => parse_bool(token)
            .map(ArgValue::Boolean)
            .ok_or_else(|| invalid("boolean")),
        ArgKind::Player => Err(HandlerError::Internal(format!(
            "player argument {} reached scalar parsing",
            spec.name
        ))),
    }
}

#[derive(Debug, Clone)]
pub enum ArgValue {
    Player(PlayerHandle),
    String(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
}

/// Parsed arguments, keyed by declared name.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: HashMap<&'static str, ArgValue>,
}

impl Args {
    pub fn insert(&mut self, name: &'static str, value: ArgValue) {
        self.values.insert(name, value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn missing(name: &str) -> HandlerError {
        HandlerError::Internal(format!("argument {name} missing or of the wrong kind"))
    }

    pub fn player(&self, name: &str) -> Result<&PlayerHandle, HandlerError> {
        self.opt_player(name).ok_or_else(|| Self::missing(name))
    }

    pub fn opt_player(&self, name: &str) -> Option<&PlayerHandle> {
        match self.values.get(name) {
            Some(ArgValue::Player(p)) => Some(p),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Result<&str, HandlerError> {
        self.opt_string(name).ok_or_else(|| Self::missing(name))
    }

    pub fn opt_string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Result<f64, HandlerError> {
        match self.values.get(name) {
            Some(ArgValue::Number(n)) => Ok(*n),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, HandlerError> {
        match self.values.get(name) {
            Some(ArgValue::Integer(n)) => Ok(*n),
            _ => Err(Self::missing(name)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, HandlerError> {
        match self.values.get(name) {
            Some(ArgValue::Boolean(b)) => Ok(*b),
            _ => Err(Self::missing(name)),
        }
    }
}
