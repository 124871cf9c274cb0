//! Unified error handling for fishd.
//!
//! [`HandlerError`] is what command handlers return when they stop early;
//! [`DispatchError`] is what the dispatcher hands back to its caller after
//! the outcome has already been reported to the actor.

use crate::db::DbError;
use crate::handlers::core::PageError;
use crate::state::ModerationError;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Text shown to an actor when a handler faults. Details go to the logs only.
pub const INTERNAL_ERROR_TEXT: &str = "An internal error occurred while running that command.";

/// Text shown to an actor when saving fails.
pub const SAVE_FAILED_TEXT: &str = "Failed to save the game state. Staff have been notified.";

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that stop a command handler.
///
/// Everything except `Internal` and `Persistence` is an expected outcome that
/// the actor can read and act on.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{message} Usage: {usage}")]
    Usage { message: String, usage: String },

    #[error("{0}")]
    Unauthorized(String),

    /// Idempotence violation (already muted, not stopped, ...).
    #[error("{0}")]
    StateConflict(String),

    #[error("{message}")]
    OnCooldown { message: String, remaining: Duration },

    #[error("{0}")]
    NotFound(String),

    /// Generic user-facing failure raised mid-handler.
    #[error("{0}")]
    Fail(String),

    #[error("rate limited")]
    RateLimited,

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    pub fn usage(message: impl Into<String>, usage: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            usage: usage.into(),
        }
    }

    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Usage { .. } => "usage",
            Self::Unauthorized(_) => "unauthorized",
            Self::StateConflict(_) => "state_conflict",
            Self::OnCooldown { .. } => "on_cooldown",
            Self::NotFound(_) => "not_found",
            Self::Fail(_) => "fail",
            Self::RateLimited => "rate_limited",
            Self::Persistence(_) => "persistence",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Text reported to the actor through their output channel.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited => "You are sending commands too quickly.".to_string(),
            Self::Persistence(_) => SAVE_FAILED_TEXT.to_string(),
            Self::Internal(_) => INTERNAL_ERROR_TEXT.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether operators need to hear about this.
    pub fn is_operator_visible(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Internal(_))
    }
}

impl From<ModerationError> for HandlerError {
    fn from(e: ModerationError) -> Self {
        match e {
            ModerationError::WrongTarget { .. } => Self::Internal(e.to_string()),
            ModerationError::Unauthorized(_) => Self::Unauthorized(e.to_string()),
            other => Self::StateConflict(other.to_string()),
        }
    }
}

impl From<PageError> for HandlerError {
    fn from(e: PageError) -> Self {
        Self::Fail(e.to_string())
    }
}

impl From<DbError> for HandlerError {
    fn from(e: DbError) -> Self {
        Self::Persistence(e.to_string())
    }
}

/// What a handler produces when it finishes normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Reported with success framing.
    Success(String),
    /// Informational output without success/fail framing.
    Plain(String),
    /// A menu choice is pending; its continuation reports later.
    Deferred(Uuid),
}

/// Result type for command handlers.
pub type HandlerResult = Result<Reply, HandlerError>;

// ============================================================================
// Dispatch Errors (returned to the caller of dispatch)
// ============================================================================

/// Terminal failures of a dispatch. The actor has already been told.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("usage error, expected: {0}")]
    Usage(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("handler failure: {0}")]
    HandlerFailure(String),

    #[error("rate limited")]
    RateLimited,

    #[error("internal error")]
    Internal,
}

impl From<HandlerError> for DispatchError {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Usage { usage, .. } => Self::Usage(usage),
            HandlerError::Unauthorized(reason) => Self::Unauthorized(reason),
            HandlerError::RateLimited => Self::RateLimited,
            HandlerError::Internal(_) => Self::Internal,
            HandlerError::Persistence(_) => Self::HandlerFailure(SAVE_FAILED_TEXT.to_string()),
            HandlerError::StateConflict(m) | HandlerError::NotFound(m) | HandlerError::Fail(m) => {
                Self::HandlerFailure(m)
            }
            HandlerError::OnCooldown { message, .. } => Self::HandlerFailure(message),
        }
    }
}
