//! Template for translating queued wire messages into model mutations.
//!
//! Server and client controllers share the enqueue/drain/dispatch skeleton
//! and differ only in a fixed set of hooks: the server applies SET_CELL and
//! randomizes on RESET, the client consumes SNAPSHOT and INIT. Hooks are
//! trait methods with defaults rather than an inheritance hierarchy.

use crate::grid::GridModel;
use crate::protocol::{Command, InitState};
use crate::queue::PendingCommands;
use log::{debug, warn};

pub trait CommandController {
    fn model_mut(&mut self) -> &mut GridModel;

    fn pending(&self) -> &PendingCommands;

    /// Hands a raw message to the queue. Called from I/O tasks.
    fn enqueue(&self, raw: Vec<u8>) {
        self.pending().push(raw);
    }

    /// Drains the queue and applies every message. Returns whether at least
    /// one message was present, which callers use as a dirty flag for
    /// repaint or broadcast decisions. Malformed messages are dropped, not
    /// surfaced: a bad client must not stall the owning loop.
    fn drain_and_apply(&mut self) -> bool {
        let batch = self.pending().drain();
        let dirty = !batch.is_empty();

        for raw in &batch {
            match Command::decode(raw) {
                Ok(command) => self.apply(command),
                Err(e) => warn!("dropping malformed message: {}", e),
            }
        }

        dirty
    }

    fn apply(&mut self, command: Command) {
        debug!("applying {:?}", command);
        match command {
            Command::ChangeSize(size) => self.apply_resize(size),
            Command::ChangeRate(ms) => self.apply_rate_change(ms),
            Command::Reset(percent) => self.apply_reset(percent),
            Command::ChangeSurvival(min, max) => self.apply_survival_change(min, max),
            Command::SetCell(index) => self.apply_set_cell(index),
            Command::Snapshot(bits) => self.apply_snapshot(bits),
            Command::Init(init) => self.apply_init(init),
        }
    }

    fn apply_resize(&mut self, size: u16) {
        self.model_mut().resize(size as usize);
    }

    fn apply_rate_change(&mut self, ms: u32) {
        self.model_mut().set_update_interval(ms);
    }

    fn apply_reset(&mut self, percent: u16) {
        let model = self.model_mut();
        model.set_spawn_percent(percent);
        model.reset();
    }

    fn apply_survival_change(&mut self, min: u16, max: u16) {
        self.model_mut().set_survival_interval(min, max);
    }

    /// Only the authoritative side acts on direct cell edits.
    fn apply_set_cell(&mut self, _index: u32) {}

    /// Only viewers consume full-grid snapshots.
    fn apply_snapshot(&mut self, _bits: Vec<u8>) {}

    /// Only viewers consume the one-time INIT message.
    fn apply_init(&mut self, _init: InitState) {}
}
