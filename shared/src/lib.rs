//! Types shared between the authoritative server and viewer clients:
//! the grid simulation model, the binary wire protocol, the thread-safe
//! pending-command queue and the command-controller template.

pub mod controller;
pub mod grid;
pub mod protocol;
pub mod queue;

pub use controller::CommandController;
pub use grid::{GridModel, ModelEvent};
pub use protocol::{Command, InitState, ProtocolError};
pub use queue::PendingCommands;

/// Smallest edge length the active region can take.
pub const MIN_GRID_SIZE: usize = 10;
/// Largest edge length the active region can take.
pub const MAX_GRID_SIZE: usize = 100;
/// Edge length a fresh grid starts with.
pub const DEFAULT_GRID_SIZE: usize = 10;

/// Fastest allowed simulation step interval, in milliseconds.
pub const MIN_UPDATE_RATE_MS: u32 = 100;
/// Slowest allowed simulation step interval, in milliseconds.
pub const MAX_UPDATE_RATE_MS: u32 = 5000;
/// Step interval a fresh grid starts with, in milliseconds.
pub const DEFAULT_UPDATE_RATE_MS: u32 = 1000;

/// Fewest neighbors a cell can have.
pub const MIN_NEIGHBORS: u16 = 0;
/// Most neighbors a cell can have.
pub const MAX_NEIGHBORS: u16 = 8;
/// Exact neighbor count that brings a dead cell to life. Not configurable.
pub const BIRTH_THRESHOLD: usize = 3;

/// Probability (0-100) used when randomizing a fresh grid.
pub const DEFAULT_SPAWN_PERCENT: u16 = 50;

/// Port the server listens on when none is given.
pub const DEFAULT_SERVER_PORT: u16 = 9999;

/// Size of the buffer used for socket reads.
pub const READ_BUFFER_SIZE: usize = 2048;
