//! Output channels through which command results reach the actor.

use crate::game::World;
use crate::state::PlayerId;
use std::sync::Arc;

/// Where a command's results go. One per invocation.
pub trait Output: Send + Sync {
    fn success(&self, text: &str);
    fn fail(&self, text: &str);
    /// Informational text without success/fail framing.
    fn plain(&self, text: &str);
}

pub type OutputRef = Arc<dyn Output>;

/// Delivers output to an in-game player as chat messages.
pub struct PlayerOutput {
    world: Arc<dyn World>,
    player: PlayerId,
}

impl PlayerOutput {
    pub fn new(world: Arc<dyn World>, player: PlayerId) -> Self {
        Self { world, player }
    }
}

impl Output for PlayerOutput {
    fn success(&self, text: &str) {
        self.world
            .send_message(&self.player, &format!("[#48e076]{text}"));
    }

    fn fail(&self, text: &str) {
        self.world
            .send_message(&self.player, &format!("[scarlet]\u{26A0} [yellow]{text}"));
    }

    fn plain(&self, text: &str) {
        self.world.send_message(&self.player, text);
    }
}
