//! `/watch [player]`
//!
//! Toggles following another player's unit with the camera. The watcher's own
//! unit is pinned where it stood so it does not drift after the camera.

use crate::error::{HandlerError, HandlerResult, Reply};
use crate::handlers::core::{Context, Handler};
use crate::tasks::{CancelFlag, spawn_periodic};
use async_trait::async_trait;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

const WATCH_PERIOD: Duration = Duration::from_millis(100);

pub struct WatchHandler;

#[async_trait]
impl Handler for WatchHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let watcher = ctx.info.id.clone();
        if ctx.server.tasks.stop_watch(&watcher) {
            if let Some(at) = ctx.world().unit_position(&watcher) {
                ctx.world().set_camera(&watcher, at);
            }
            return Ok(Reply::Success("No longer watching a player.".into()));
        }

        let Some(target) = ctx.args.opt_player("player") else {
            return Err(HandlerError::usage(
                "Choose a player to watch.",
                "/watch [player]",
            ));
        };
        let (target_id, name) = {
            let record = target.read().await;
            (record.id().clone(), record.cleaned_name())
        };
        let world = ctx.world().clone();
        let stay = world
            .unit_position(&watcher)
            .ok_or_else(|| HandlerError::fail("You need a unit to watch a player."))?;
        if world.unit_position(&target_id).is_none() {
            return Err(HandlerError::fail(format!(
                "Player \"{name}\" does not have a unit."
            )));
        }

        let flag = CancelFlag::new();
        ctx.server.tasks.start_watch(watcher.clone(), flag.clone());
        let server = Arc::clone(ctx.server);
        let own = flag.clone();
        spawn_periodic("watch", WATCH_PERIOD, None, flag, move |_| {
            let step = match world.unit_position(&target_id) {
                Some(at) => {
                    world.set_camera(&watcher, at);
                    world.set_position(&watcher, stay);
                    ControlFlow::Continue(())
                }
                None => {
                    // Target left or lost its unit.
                    server.tasks.end_watch(&watcher, &own);
                    world.set_camera(&watcher, stay);
                    ControlFlow::Break(())
                }
            };
            std::future::ready(step)
        });
        Ok(Reply::Success(format!("Watching player \"{name}\".")))
    }
}
