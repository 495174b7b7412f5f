//! Seam between the networked controller and whatever displays the grid.
//!
//! The real GUI lives outside this crate; the controller only reports the
//! mirrored simulation parameters through this trait. The default
//! implementation logs, which is all the headless binary needs.

use log::info;
use shared::grid::GridModel;

/// Callbacks the controller invokes when a server or peer command changed
/// a mirrored simulation parameter. All hooks default to no-ops so a
/// presentation layer only implements what it displays.
pub trait Presentation: Send {
    fn on_size_changed(&mut self, _size: usize) {}
    fn on_rate_changed(&mut self, _ms: u32) {}
    fn on_survival_changed(&mut self, _min: u16, _max: u16) {}
    fn on_spawn_percent_changed(&mut self, _percent: u16) {}
}

/// Presentation sink that reports parameter changes on the log.
pub struct LogPresentation;

impl Presentation for LogPresentation {
    fn on_size_changed(&mut self, size: usize) {
        info!("grid size is now {}", size);
    }

    fn on_rate_changed(&mut self, ms: u32) {
        info!("update interval is now {}ms", ms);
    }

    fn on_survival_changed(&mut self, min: u16, max: u16) {
        info!("survival interval is now [{}, {}]", min, max);
    }

    fn on_spawn_percent_changed(&mut self, percent: u16) {
        info!("spawn percentage is now {}", percent);
    }
}

/// Renders the active region as one character per cell, row by row.
pub fn render_ascii(model: &GridModel) -> String {
    let mut out = String::with_capacity(model.size() * (model.size() + 1));
    for row in 0..model.size() {
        for col in 0..model.size() {
            out.push(if model.is_alive(row, col) { '#' } else { '.' });
        }
        out.push('\n');
    }
    out
}
