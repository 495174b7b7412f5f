//! Viewer variant of the grid command controller.
//!
//! The client never steps its own simulation: every grid change arrives as
//! a server snapshot, and receiving one counts as proof that the server
//! stepped once. Parameter commands (size, rate, survival, spawn) are
//! mirrored into the model and reported to the presentation seam; only an
//! INIT message carries an authoritative cycle value.

use crate::presentation::Presentation;
use shared::controller::CommandController;
use shared::grid::GridModel;
use shared::protocol::InitState;
use shared::queue::PendingCommands;
use std::sync::Arc;

pub struct ClientController {
    model: GridModel,
    pending: Arc<PendingCommands>,
    presentation: Box<dyn Presentation>,
}

impl ClientController {
    pub fn new(model: GridModel, presentation: Box<dyn Presentation>) -> Self {
        Self {
            model,
            pending: Arc::new(PendingCommands::new()),
            presentation,
        }
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    /// Clone of the queue handle for the listener task.
    pub fn pending_handle(&self) -> Arc<PendingCommands> {
        Arc::clone(&self.pending)
    }
}

impl CommandController for ClientController {
    fn model_mut(&mut self) -> &mut GridModel {
        &mut self.model
    }

    fn pending(&self) -> &PendingCommands {
        &self.pending
    }

    fn apply_resize(&mut self, size: u16) {
        self.model.resize(size as usize);
        // Mirror whatever the model actually accepted.
        self.presentation.on_size_changed(self.model.size());
    }

    fn apply_rate_change(&mut self, ms: u32) {
        self.model.set_update_interval(ms);
        self.presentation
            .on_rate_changed(self.model.update_interval_ms());
    }

    fn apply_survival_change(&mut self, min: u16, max: u16) {
        self.model.set_survival_interval(min, max);
        self.presentation
            .on_survival_changed(self.model.survival_min(), self.model.survival_max());
    }

    /// Viewers never randomize: the repopulated grid arrives with the next
    /// server snapshot. Only the mirrored parameters change here.
    fn apply_reset(&mut self, percent: u16) {
        self.model.set_spawn_percent(percent);
        self.model.set_cycle(0);
        self.presentation
            .on_spawn_percent_changed(self.model.spawn_percent());
    }

    fn apply_snapshot(&mut self, bits: Vec<u8>) {
        self.model.restore(&bits);
        self.model.advance_cycle();
    }

    fn apply_init(&mut self, init: InitState) {
        self.model.resize(init.size as usize);
        self.model.set_update_interval(init.update_rate_ms);
        self.model
            .set_survival_interval(init.survival_min, init.survival_max);
        self.model.set_spawn_percent(init.spawn_percent);
        self.model.restore(&init.snapshot);
        self.model.set_cycle(init.cycle);

        self.presentation.on_size_changed(self.model.size());
        self.presentation
            .on_rate_changed(self.model.update_interval_ms());
        self.presentation
            .on_survival_changed(self.model.survival_min(), self.model.survival_max());
        self.presentation
            .on_spawn_percent_changed(self.model.spawn_percent());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::protocol::Command;
    use std::sync::{Arc as StdArc, Mutex};

    #[derive(Debug, PartialEq, Eq, Clone)]
    enum Seen {
        Size(usize),
        Rate(u32),
        Survival(u16, u16),
        Spawn(u16),
    }

    #[derive(Clone, Default)]
    struct Recorder(StdArc<Mutex<Vec<Seen>>>);

    impl Recorder {
        fn events(&self) -> Vec<Seen> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Presentation for Recorder {
        fn on_size_changed(&mut self, size: usize) {
            self.0.lock().unwrap().push(Seen::Size(size));
        }
        fn on_rate_changed(&mut self, ms: u32) {
            self.0.lock().unwrap().push(Seen::Rate(ms));
        }
        fn on_survival_changed(&mut self, min: u16, max: u16) {
            self.0.lock().unwrap().push(Seen::Survival(min, max));
        }
        fn on_spawn_percent_changed(&mut self, percent: u16) {
            self.0.lock().unwrap().push(Seen::Spawn(percent));
        }
    }

    fn controller_with_recorder() -> (ClientController, Recorder) {
        let recorder = Recorder::default();
        let controller = ClientController::new(GridModel::new(), Box::new(recorder.clone()));
        (controller, recorder)
    }

    #[test]
    fn snapshot_restores_grid_and_advances_cycle() {
        let (mut controller, _) = controller_with_recorder();

        let mut source = GridModel::new();
        source.set_cell(2, 2, true);
        source.set_cell(7, 1, true);

        controller.enqueue(Command::Snapshot(source.snapshot()).encode());
        assert!(controller.drain_and_apply());

        assert_eq!(controller.model().snapshot(), source.snapshot());
        assert_eq!(controller.model().cycle(), 1);
    }

    #[test]
    fn each_snapshot_counts_one_cycle() {
        let (mut controller, _) = controller_with_recorder();
        for _ in 0..5 {
            controller.enqueue(Command::Snapshot(Vec::new()).encode());
            controller.drain_and_apply();
        }
        assert_eq!(controller.model().cycle(), 5);
    }

    #[test]
    fn init_configures_model_and_presentation() {
        let (mut controller, recorder) = controller_with_recorder();

        let mut source = GridModel::with_size(20);
        source.set_cell(19, 19, true);

        controller.enqueue(
            Command::Init(InitState {
                size: 20,
                update_rate_ms: 500,
                survival_min: 1,
                survival_max: 4,
                spawn_percent: 30,
                cycle: 42,
                snapshot: source.snapshot(),
            })
            .encode(),
        );
        controller.drain_and_apply();

        let model = controller.model();
        assert_eq!(model.size(), 20);
        assert_eq!(model.update_interval_ms(), 500);
        assert_eq!(model.survival_min(), 1);
        assert_eq!(model.survival_max(), 4);
        assert_eq!(model.spawn_percent(), 30);
        assert_eq!(model.cycle(), 42);
        assert!(model.is_alive(19, 19));

        assert_eq!(
            recorder.events(),
            vec![
                Seen::Size(20),
                Seen::Rate(500),
                Seen::Survival(1, 4),
                Seen::Spawn(30),
            ]
        );
    }

    #[test]
    fn parameter_commands_are_mirrored() {
        let (mut controller, recorder) = controller_with_recorder();

        controller.enqueue(Command::ChangeSize(15).encode());
        controller.enqueue(Command::ChangeRate(250).encode());
        controller.drain_and_apply();

        assert_eq!(
            recorder.events(),
            vec![Seen::Size(15), Seen::Rate(250)]
        );
    }

    #[test]
    fn invalid_survival_mirrors_prior_values() {
        let (mut controller, recorder) = controller_with_recorder();

        controller.enqueue(Command::ChangeSurvival(6, 1).encode());
        controller.drain_and_apply();

        // The model rejected the change, so the presentation sees the
        // values still in force.
        assert_eq!(controller.model().survival_min(), 2);
        assert_eq!(controller.model().survival_max(), 3);
        assert_eq!(recorder.events(), vec![Seen::Survival(2, 3)]);
    }

    #[test]
    fn reset_zeroes_cycle_without_randomizing() {
        let (mut controller, recorder) = controller_with_recorder();
        controller.model_mut().set_cell(3, 3, true);
        controller.model_mut().advance_cycle();

        controller.enqueue(Command::Reset(80).encode());
        controller.drain_and_apply();

        assert_eq!(controller.model().cycle(), 0);
        // Grid content is untouched until the server's snapshot arrives.
        assert!(controller.model().is_alive(3, 3));
        assert_eq!(recorder.events(), vec![Seen::Spawn(80)]);
    }

    #[test]
    fn set_cell_is_a_viewer_noop() {
        let (mut controller, _) = controller_with_recorder();
        controller.enqueue(Command::SetCell(0).encode());
        controller.drain_and_apply();
        assert_eq!(controller.model().alive_cell_count(), 0);
    }
}
