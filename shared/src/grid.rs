//! Toroidal cellular automaton model with configurable survival thresholds.
//!
//! The backing storage is always `MAX_GRID_SIZE × MAX_GRID_SIZE`; only the
//! top-left `size × size` submatrix is active. A second buffer holds the
//! state of the previous step so neighbor counts during `update()` are
//! computed against a consistent prior generation. Every mutation outside
//! `update()` keeps both buffers in lockstep.

use crate::{
    BIRTH_THRESHOLD, DEFAULT_GRID_SIZE, DEFAULT_SPAWN_PERCENT, DEFAULT_UPDATE_RATE_MS,
    MAX_GRID_SIZE, MAX_NEIGHBORS, MAX_UPDATE_RATE_MS, MIN_GRID_SIZE, MIN_UPDATE_RATE_MS,
};
use log::warn;
use rand::Rng;
use std::sync::mpsc::{self, Receiver, Sender};

/// Notification pushed to subscribers whenever the observable grid state
/// changed (step, resize, reset, restore or direct cell edit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
    Changed { cycle: u32 },
}

pub struct GridModel {
    /// Current simulation state, row-major over the full backing capacity.
    cells: Vec<bool>,
    /// Snapshot of `cells` from the start of the current step. Read-only
    /// while `update()` runs.
    reference: Vec<bool>,
    size: usize,
    cycle: u32,
    update_interval_ms: u32,
    survival_min: u16,
    survival_max: u16,
    spawn_percent: u16,
    watchers: Vec<Sender<ModelEvent>>,
}

impl GridModel {
    pub fn new() -> Self {
        Self::with_size(DEFAULT_GRID_SIZE)
    }

    /// Creates a grid with the given edge length, clamping out-of-bounds
    /// values to the nearest legal size.
    pub fn with_size(size: usize) -> Self {
        let size = if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
            let clamped = size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
            warn!("grid size {} out of bounds, starting with {}", size, clamped);
            clamped
        } else {
            size
        };

        Self {
            cells: vec![false; MAX_GRID_SIZE * MAX_GRID_SIZE],
            reference: vec![false; MAX_GRID_SIZE * MAX_GRID_SIZE],
            size,
            cycle: 0,
            update_interval_ms: DEFAULT_UPDATE_RATE_MS,
            survival_min: 2,
            survival_max: 3,
            spawn_percent: DEFAULT_SPAWN_PERCENT,
            watchers: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn update_interval_ms(&self) -> u32 {
        self.update_interval_ms
    }

    pub fn survival_min(&self) -> u16 {
        self.survival_min
    }

    pub fn survival_max(&self) -> u16 {
        self.survival_max
    }

    pub fn spawn_percent(&self) -> u16 {
        self.spawn_percent
    }

    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        self.cells[row * MAX_GRID_SIZE + col]
    }

    /// Number of living cells in the active region.
    pub fn alive_cell_count(&self) -> usize {
        let mut count = 0;
        for row in 0..self.size {
            for col in 0..self.size {
                if self.is_alive(row, col) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Registers an observer. Receivers that have been dropped are pruned
    /// on the next notification.
    pub fn subscribe(&mut self) -> Receiver<ModelEvent> {
        let (tx, rx) = mpsc::channel();
        self.watchers.push(tx);
        rx
    }

    fn notify(&mut self) {
        let event = ModelEvent::Changed { cycle: self.cycle };
        self.watchers.retain(|w| w.send(event).is_ok());
    }

    /// Sets one cell in both buffers, preserving the lockstep invariant.
    pub fn set_cell(&mut self, row: usize, col: usize, alive: bool) {
        let index = row * MAX_GRID_SIZE + col;
        self.cells[index] = alive;
        self.reference[index] = alive;
    }

    /// Brings the cell at the given row-major index in the active region to
    /// life. An out-of-range index is an input-validation failure: the
    /// command is dropped with a diagnostic, nothing changes.
    pub fn set_cell_at(&mut self, index: usize) {
        if index >= self.size * self.size {
            warn!(
                "cell index {} outside active region of {}x{}, dropped",
                index, self.size, self.size
            );
            return;
        }
        self.set_cell(index / self.size, index % self.size, true);
        self.notify();
    }

    /// Advances the simulation by one step.
    ///
    /// Neighbor counts are taken from the reference buffer so writes during
    /// the pass cannot feed back into the same step. A living cell survives
    /// iff its neighbor count falls in `[survival_min, survival_max]`; a
    /// dead cell is born on exactly `BIRTH_THRESHOLD` neighbors.
    pub fn update(&mut self) {
        for row in 0..self.size {
            for col in 0..self.size {
                let neighbors = self.count_neighbors(row, col);
                let index = row * MAX_GRID_SIZE + col;

                self.cells[index] = if self.reference[index] {
                    neighbors >= self.survival_min as usize
                        && neighbors <= self.survival_max as usize
                } else {
                    neighbors == BIRTH_THRESHOLD
                };
            }
        }

        // Reconcile the buffers only after the full pass.
        for row in 0..self.size {
            for col in 0..self.size {
                let index = row * MAX_GRID_SIZE + col;
                self.reference[index] = self.cells[index];
            }
        }

        self.cycle += 1;
        self.notify();
    }

    fn count_neighbors(&self, row: usize, col: usize) -> usize {
        let mut count = 0;
        for dr in [-1i64, 0, 1] {
            for dc in [-1i64, 0, 1] {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let r = self.wrap(row as i64 + dr);
                let c = self.wrap(col as i64 + dc);
                if self.reference[r * MAX_GRID_SIZE + c] {
                    count += 1;
                }
            }
        }
        count
    }

    /// Wraps a coordinate around the torus edge.
    fn wrap(&self, value: i64) -> usize {
        let size = self.size as i64;
        (((value % size) + size) % size) as usize
    }

    /// Changes the active edge length. Cells outside the new active region
    /// are killed so a later grow-back starts from dead space. Out-of-bound
    /// sizes are rejected and logged.
    pub fn resize(&mut self, new_size: usize) {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&new_size) {
            warn!("rejecting grid size {}, legal range is {}..={}", new_size, MIN_GRID_SIZE, MAX_GRID_SIZE);
            return;
        }

        self.size = new_size;
        for row in 0..MAX_GRID_SIZE {
            for col in 0..MAX_GRID_SIZE {
                if row >= new_size || col >= new_size {
                    self.set_cell(row, col, false);
                }
            }
        }
        self.notify();
    }

    pub fn set_update_interval(&mut self, ms: u32) {
        if !(MIN_UPDATE_RATE_MS..=MAX_UPDATE_RATE_MS).contains(&ms) {
            warn!("rejecting update interval {}ms, legal range is {}..={}", ms, MIN_UPDATE_RATE_MS, MAX_UPDATE_RATE_MS);
            return;
        }
        self.update_interval_ms = ms;
    }

    /// Sets the inclusive neighbor-count interval a living cell needs to
    /// survive. Rejected unless `0 <= min <= max <= 8`.
    pub fn set_survival_interval(&mut self, min: u16, max: u16) {
        if min > max || max > MAX_NEIGHBORS {
            warn!("rejecting survival interval [{}, {}]", min, max);
            return;
        }
        self.survival_min = min;
        self.survival_max = max;
    }

    pub fn set_spawn_percent(&mut self, percent: u16) {
        if percent > 100 {
            warn!("rejecting spawn percentage {}", percent);
            return;
        }
        self.spawn_percent = percent;
    }

    /// Independently sets every active cell alive with probability
    /// `spawn_percent / 100`.
    pub fn randomize(&mut self) {
        let mut rng = rand::thread_rng();
        for row in 0..self.size {
            for col in 0..self.size {
                let alive = rng.gen_range(0..100) < self.spawn_percent as u32;
                self.set_cell(row, col, alive);
            }
        }
        self.notify();
    }

    /// Zeroes the cycle counter and kills every cell.
    pub fn reset(&mut self) {
        self.cycle = 0;
        for index in 0..MAX_GRID_SIZE * MAX_GRID_SIZE {
            self.cells[index] = false;
            self.reference[index] = false;
        }
        self.notify();
    }

    /// Packs the active region into a row-major bitmap: bit `i` (cell
    /// `i / size`, `i % size`) lives in byte `i / 8` at bit `i % 8`.
    /// Trailing all-zero bytes are truncated.
    pub fn snapshot(&self) -> Vec<u8> {
        let bits = self.size * self.size;
        let mut packed = vec![0u8; (bits + 7) / 8];
        for row in 0..self.size {
            for col in 0..self.size {
                if self.is_alive(row, col) {
                    let i = row * self.size + col;
                    packed[i / 8] |= 1 << (i % 8);
                }
            }
        }
        while packed.last() == Some(&0) {
            packed.pop();
        }
        packed
    }

    /// Inverse of [`snapshot`](Self::snapshot) over the current active
    /// region. Bits beyond the transmitted length are treated as dead.
    pub fn restore(&mut self, packed: &[u8]) {
        for row in 0..self.size {
            for col in 0..self.size {
                let i = row * self.size + col;
                let alive = packed
                    .get(i / 8)
                    .is_some_and(|byte| byte >> (i % 8) & 1 == 1);
                self.set_cell(row, col, alive);
            }
        }
        self.notify();
    }

    /// Bumps the cycle counter without stepping. Viewers use a received
    /// snapshot as implicit proof that the server stepped once.
    pub fn advance_cycle(&mut self) {
        self.cycle += 1;
    }

    /// Adopts an authoritative cycle value, e.g. from an INIT message.
    pub fn set_cycle(&mut self, cycle: u32) {
        self.cycle = cycle;
    }
}

impl Default for GridModel {
    fn default() -> Self {
        Self::new()
    }
}
