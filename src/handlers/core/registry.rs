//! Command registry and dispatch.
//!
//! Dispatch runs, in order: rate limiting, lookup, argument tokenization and
//! scalar parsing, player resolution (which may suspend on a menu), the
//! permission check, and finally the handler. Every outcome is reported to
//! the actor's output before `dispatch` returns.

use super::args::{ArgKind, ArgSpec, ArgValue, check_layout, parse_scalar, split_tokens, usage};
use super::context::{ChoiceContinuation, Context, Handler};
use super::lookup::{Lookup, resolve_player};
use super::output::OutputRef;
use super::pending::{PartialArgs, PendingChoice, PendingKind};
use crate::caps::{Perm, can_run};
use crate::error::{DispatchError, HandlerError, HandlerResult, INTERNAL_ERROR_TEXT, Reply};
use crate::game::ChoiceRequest;
use crate::state::{PlayerHandle, Server};
use crate::telemetry::CommandTimer;
use futures_util::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, debug, debug_span, error};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command /{0} is already registered")]
    Duplicate(&'static str),
    #[error("command /{command}: malformed argument spec \"{spec}\"")]
    BadArgSpec {
        command: &'static str,
        spec: &'static str,
    },
    #[error("command /{command}: required argument \"{arg}\" follows an optional one")]
    RequiredAfterOptional {
        command: &'static str,
        arg: &'static str,
    },
}

/// A command definition: name, arguments, permission tag, and handler.
pub struct CommandDef {
    pub name: &'static str,
    pub description: &'static str,
    pub perm: Perm,
    /// Replaces the default denial text when the permission check fails.
    pub unauthorized_message: Option<&'static str>,
    raw_args: &'static [&'static str],
    args: Vec<ArgSpec>,
    handler: Box<dyn Handler>,
}

impl CommandDef {
    pub fn new(
        name: &'static str,
        description: &'static str,
        perm: Perm,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            name,
            description,
            perm,
            unauthorized_message: None,
            raw_args: &[],
            args: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Declare arguments as `"name:kind"` / `"name:kind?"` spec strings.
    pub fn args(mut self, specs: &'static [&'static str]) -> Self {
        self.raw_args = specs;
        self
    }

    pub fn unauthorized(mut self, message: &'static str) -> Self {
        self.unauthorized_message = Some(message);
        self
    }

    pub fn arg_specs(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn usage(&self) -> String {
        usage(self.name, &self.args)
    }

    fn denial(&self) -> String {
        self.unauthorized_message.map_or_else(
            || {
                format!(
                    "You do not have the required permission ({}) to execute this command.",
                    self.perm
                )
            },
            str::to_string,
        )
    }
}

/// Registry of command definitions, ordered by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandDef>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Names are matched case-insensitively and must be
    /// given in lowercase.
    pub fn register(&mut self, mut def: CommandDef) -> Result<(), RegistryError> {
        if self.commands.contains_key(def.name) {
            return Err(RegistryError::Duplicate(def.name));
        }
        def.args = def
            .raw_args
            .iter()
            .map(|spec| ArgSpec::parse(def.name, spec))
            .collect::<Result<_, _>>()?;
        check_layout(def.name, &def.args)?;
        self.commands.insert(def.name, def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommandDef> {
        self.commands.get(name.to_ascii_lowercase().as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered commands matching `filter`, in name order.
    pub fn list_commands(&self, filter: impl Fn(&CommandDef) -> bool) -> Vec<&CommandDef> {
        self.commands.values().filter(|d| filter(d)).collect()
    }

    /// Dispatch one invocation.
    ///
    /// Returns `Pending` when the command is waiting on a menu choice.
    pub async fn dispatch(
        &self,
        server: &Arc<Server>,
        name: &str,
        raw_args: &str,
        actor: PlayerHandle,
        output: OutputRef,
    ) -> Result<Dispatched, DispatchError> {
        let name = name.trim().trim_start_matches('/').to_ascii_lowercase();
        let info = actor.read().await.actor_info();

        if info.id != *server.console_id() && !server.rate_limits.check_command_rate(&info.id) {
            crate::metrics::record_rate_limited();
            return Err(report_error(&name, &output, HandlerError::RateLimited));
        }

        let Some(def) = self.commands.get(name.as_str()) else {
            crate::metrics::record_command_error(&name, "unknown_command");
            output.fail(&format!(
                "Unknown command \"{name}\". Use /help for a list of commands."
            ));
            return Err(DispatchError::UnknownCommand(name));
        };

        let span = debug_span!("fishd.command", command = def.name, actor = %info.name);
        async move {
            let _timer = CommandTimer::new(def.name);
            let partial = match parse_args(def, raw_args) {
                Ok(partial) => partial,
                Err(e) => return Err(report_error(def.name, &output, e)),
            };
            self.resolve_and_run(server, def, partial, actor, output)
                .await
        }
        .instrument(span)
        .await
    }

    /// Continue a command whose player argument was ambiguous.
    pub(crate) async fn resume_argument(
        &self,
        server: &Arc<Server>,
        choice: PendingChoice,
        index: usize,
        actor: PlayerHandle,
    ) -> Result<Dispatched, DispatchError> {
        let PendingChoice { output, kind, .. } = choice;
        let PendingKind::Argument {
            command,
            arg,
            candidates,
            mut partial,
        } = kind
        else {
            return Err(report_error("choice", &output, HandlerError::Internal("pending kind mismatch".into())));
        };
        let Some(def) = self.commands.get(command) else {
            return Err(report_error(command, &output, HandlerError::Internal(format!("command /{command} vanished"))));
        };
        let Some(target) = candidates.get(index).and_then(|id| server.store.get(id)) else {
            return Err(report_error(command, &output, HandlerError::fail("Invalid choice.")));
        };
        partial.args.insert(arg, ArgValue::Player(target));

        let info_name = actor.read().await.name().to_string();
        let span = debug_span!("fishd.command", command = def.name, actor = %info_name);
        async move {
            let _timer = CommandTimer::new(def.name);
            self.resolve_and_run(server, def, partial, actor, output).await
        }
        .instrument(span)
        .await
    }

    /// Finish a command whose handler was waiting on a menu choice.
    pub(crate) async fn resume_continuation(
        &self,
        server: &Arc<Server>,
        choice: PendingChoice,
        index: usize,
        actor: PlayerHandle,
    ) -> Result<Dispatched, DispatchError> {
        let PendingChoice { output, kind, .. } = choice;
        let PendingKind::Handler {
            command,
            continuation,
        } = kind
        else {
            return Err(report_error("choice", &output, HandlerError::Internal("pending kind mismatch".into())));
        };
        let Some(def) = self.commands.get(command) else {
            return Err(report_error(command, &output, HandlerError::Internal(format!("command /{command} vanished"))));
        };

        let info = actor.read().await.actor_info();
        let span = debug_span!("fishd.command", command = def.name, actor = %info.name);
        async move {
            let _timer = CommandTimer::new(def.name);
            if !can_run(&info, def.perm) {
                return Err(report_error(def.name, &output, HandlerError::Unauthorized(def.denial())));
            }
            let mut ctx = Context {
                server,
                actor: &actor,
                info,
                args: Default::default(),
                output: &output,
                command: def.name,
            };
            let result = AssertUnwindSafe(resume_boxed(continuation, &mut ctx, index))
                .catch_unwind()
                .await;
            report(def.name, &output, result)
        }
        .instrument(span)
        .await
    }

    async fn resolve_and_run(
        &self,
        server: &Arc<Server>,
        def: &CommandDef,
        mut partial: PartialArgs,
        actor: PlayerHandle,
        output: OutputRef,
    ) -> Result<Dispatched, DispatchError> {
        let threshold = server.config.limits.name_search_threshold;
        while let Some((arg, query)) = partial.unresolved.pop_front() {
            match resolve_player(&server.store, &query, threshold) {
                Ok(Lookup::Found(handle)) => partial.args.insert(arg, ArgValue::Player(handle)),
                Ok(Lookup::Ambiguous(candidates)) => {
                    // Unauthorized actors never get asked to choose.
                    let info = actor.read().await.actor_info();
                    if !can_run(&info, def.perm) {
                        return Err(report_error(
                            def.name,
                            &output,
                            HandlerError::Unauthorized(def.denial()),
                        ));
                    }
                    let options = candidates.iter().map(|c| c.name.clone()).collect();
                    let ids = candidates.into_iter().map(|c| c.id).collect();
                    let id = server.pending.insert(PendingChoice::new(
                        info.id.clone(),
                        output.clone(),
                        PendingKind::Argument {
                            command: def.name,
                            arg,
                            candidates: ids,
                            partial,
                        },
                    ));
                    server.menu.present_choice(ChoiceRequest {
                        id,
                        player: info.id,
                        title: format!("/{}", def.name),
                        body: format!("Multiple players match \"{query}\". Choose one:"),
                        options,
                    });
                    return Ok(Dispatched::Pending(id));
                }
                Err(e) => return Err(report_error(def.name, &output, e)),
            }
        }
        self.run(server, def, partial.args, actor, output).await
    }

    async fn run(
        &self,
        server: &Arc<Server>,
        def: &CommandDef,
        args: super::args::Args,
        actor: PlayerHandle,
        output: OutputRef,
    ) -> Result<Dispatched, DispatchError> {
        let info = actor.read().await.actor_info();
        if !can_run(&info, def.perm) {
            return Err(report_error(
                def.name,
                &output,
                HandlerError::Unauthorized(def.denial()),
            ));
        }
        let mut ctx = Context {
            server,
            actor: &actor,
            info,
            args,
            output: &output,
            command: def.name,
        };
        let result = AssertUnwindSafe(def.handler.handle(&mut ctx))
            .catch_unwind()
            .await;
        report(def.name, &output, result)
    }
}

/// How a dispatch ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Completed,
    /// Waiting on the menu choice with this correlation id.
    Pending(Uuid),
}

fn parse_args(def: &CommandDef, raw: &str) -> Result<PartialArgs, HandlerError> {
    let tokens = split_tokens(def.name, &def.args, raw)?;
    let mut partial = PartialArgs::default();
    for (spec, token) in def.args.iter().zip(tokens) {
        let Some(token) = token else { continue };
        if spec.kind == ArgKind::Player {
            partial.unresolved.push_back((spec.name, token));
        } else {
            let value = parse_scalar(def.name, &def.args, spec, &token)?;
            partial.args.insert(spec.name, value);
        }
    }
    Ok(partial)
}

async fn resume_boxed(
    continuation: Box<dyn ChoiceContinuation>,
    ctx: &mut Context<'_>,
    index: usize,
) -> HandlerResult {
    continuation.resume(ctx, index).await
}

fn report(
    command: &str,
    output: &OutputRef,
    result: Result<HandlerResult, Box<dyn Any + Send>>,
) -> Result<Dispatched, DispatchError> {
    match result {
        Ok(Ok(Reply::Success(text))) => {
            output.success(&text);
            Ok(Dispatched::Completed)
        }
        Ok(Ok(Reply::Plain(text))) => {
            if !text.is_empty() {
                output.plain(&text);
            }
            Ok(Dispatched::Completed)
        }
        Ok(Ok(Reply::Deferred(id))) => Ok(Dispatched::Pending(id)),
        Ok(Err(e)) => Err(report_error(command, output, e)),
        Err(panic) => {
            crate::metrics::record_command_error(command, "panic");
            error!(command, panic = %panic_message(&panic), "Command handler panicked");
            output.fail(INTERNAL_ERROR_TEXT);
            Err(DispatchError::Internal)
        }
    }
}

fn report_error(command: &str, output: &OutputRef, e: HandlerError) -> DispatchError {
    crate::metrics::record_command_error(command, e.error_code());
    if e.is_operator_visible() {
        error!(command, error = %e, "Command failed");
    } else {
        debug!(command, error = %e, "Command error");
    }
    output.fail(&e.user_message());
    DispatchError::from(e)
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
