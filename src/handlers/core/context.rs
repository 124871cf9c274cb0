//! Command handler context and handler traits.

use super::args::Args;
use super::output::OutputRef;
use super::pending::{PendingChoice, PendingKind};
use crate::caps::{Cap, CapabilityAuthority, ModerateCap};
use crate::error::{HandlerError, HandlerResult, Reply};
use crate::game::{ChoiceRequest, World};
use crate::state::{ActorInfo, PlayerHandle, Server};
use async_trait::async_trait;
use std::sync::Arc;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// Shared server state.
    pub server: &'a Arc<Server>,
    /// The invoking actor's record.
    pub actor: &'a PlayerHandle,
    /// Snapshot of the actor taken right before the handler ran.
    pub info: ActorInfo,
    pub args: Args,
    pub output: &'a OutputRef,
    /// Registered name of the running command.
    pub command: &'static str,
}

impl<'a> Context<'a> {
    pub fn world(&self) -> &Arc<dyn World> {
        &self.server.world
    }

    pub fn is_console(&self) -> bool {
        self.info.id == *self.server.console_id()
    }

    /// Ask the authority for a moderation token against `target`.
    ///
    /// Denial becomes an `Unauthorized` error carrying `denial`.
    pub async fn moderate_cap(
        &self,
        target: &PlayerHandle,
        allow_self: bool,
        denial: &str,
    ) -> Result<Cap<ModerateCap>, HandlerError> {
        CapabilityAuthority::request_moderate_cap(&self.info, target, allow_self)
            .await
            .ok_or_else(|| HandlerError::Unauthorized(denial.to_string()))
    }

    /// Present a menu to the actor and finish the command when they answer.
    ///
    /// The returned reply tells the dispatcher the command is pending.
    pub fn defer_choice(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        options: Vec<String>,
        continuation: impl ChoiceContinuation + 'static,
    ) -> Reply {
        let id = self.server.pending.insert(PendingChoice::new(
            self.info.id.clone(),
            self.output.clone(),
            PendingKind::Handler {
                command: self.command,
                continuation: Box::new(continuation),
            },
        ));
        self.server.menu.present_choice(ChoiceRequest {
            id,
            player: self.info.id.clone(),
            title: title.into(),
            body: body.into(),
            options,
        });
        Reply::Deferred(id)
    }
}

/// A command handler.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult;
}

/// The rest of a command, run once the actor picks a menu option.
///
/// Runs with a fresh context: the actor snapshot is retaken and the command's
/// permission tag rechecked before `resume` is called.
#[async_trait]
pub trait ChoiceContinuation: Send + Sync {
    async fn resume(self: Box<Self>, ctx: &mut Context<'_>, choice: usize) -> HandlerResult;
}
