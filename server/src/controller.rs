//! Authoritative variant of the grid command controller.

use shared::controller::CommandController;
use shared::grid::GridModel;
use shared::protocol::{Command, InitState};
use shared::queue::PendingCommands;
use std::sync::Arc;

/// Applies client commands to the authoritative grid and forges the
/// outgoing SNAPSHOT and INIT messages.
///
/// The queue handle is shared with connection reader tasks; everything else
/// is owned by the server loop thread and needs no locking.
pub struct ServerController {
    model: GridModel,
    pending: Arc<PendingCommands>,
    step_timer_reset: bool,
}

impl ServerController {
    pub fn new(model: GridModel) -> Self {
        Self {
            model,
            pending: Arc::new(PendingCommands::new()),
            step_timer_reset: false,
        }
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    /// Clone of the queue handle for reader tasks.
    pub fn pending_handle(&self) -> Arc<PendingCommands> {
        Arc::clone(&self.pending)
    }

    /// Whether a processed command asked for the step timer to restart.
    /// Reading clears the flag.
    pub fn take_step_timer_reset(&mut self) -> bool {
        std::mem::take(&mut self.step_timer_reset)
    }

    pub fn build_snapshot_message(&self) -> Vec<u8> {
        Command::Snapshot(self.model.snapshot()).encode()
    }

    /// Forges the full-state message a client receives right after accept.
    pub fn build_init_message(&self) -> Vec<u8> {
        Command::Init(InitState {
            size: self.model.size() as u16,
            update_rate_ms: self.model.update_interval_ms(),
            survival_min: self.model.survival_min(),
            survival_max: self.model.survival_max(),
            spawn_percent: self.model.spawn_percent(),
            cycle: self.model.cycle(),
            snapshot: self.model.snapshot(),
        })
        .encode()
    }
}

impl CommandController for ServerController {
    fn model_mut(&mut self) -> &mut GridModel {
        &mut self.model
    }

    fn pending(&self) -> &PendingCommands {
        &self.pending
    }

    fn apply_set_cell(&mut self, index: u32) {
        self.model.set_cell_at(index as usize);
    }

    /// A reset is authoritative only here: the cleared grid is repopulated
    /// randomly and the step timer starts over.
    fn apply_reset(&mut self, percent: u16) {
        self.model.set_spawn_percent(percent);
        self.model.reset();
        self.model.randomize();
        self.step_timer_reset = true;
    }
}
