//! # Grid Server Library
//!
//! Authoritative side of the networked cellular-automaton simulation. The
//! server owns the one true [`shared::GridModel`], steps it on a timer,
//! applies commands sent by viewer clients and broadcasts full-grid
//! snapshots so every viewer converges on the same state.
//!
//! ## Architecture
//!
//! A single owner loop ([`network::Server::run`]) multiplexes three event
//! sources with `tokio::select!`: accept readiness on the listening socket,
//! frames forwarded by per-connection reader tasks, and the simulation step
//! deadline. Connection I/O lives in cheap spawned tasks; the only
//! structure they share with the owner loop is the pending-command queue,
//! so one unresponsive client can never stall the simulation tick or the
//! other connections.
//!
//! ## Module organization
//!
//! - [`controller`] — the authoritative command controller: applies decoded
//!   commands to the grid, randomizes on reset, and forges the INIT and
//!   SNAPSHOT messages.
//! - [`registry`] — the connection registry: the sole authority for who
//!   receives broadcasts, dropping clients whose writer has failed.
//! - [`network`] — the accept/read multiplexer and simulation loop.
//!
//! ## Protocol behavior
//!
//! Every accepted client immediately receives an INIT message carrying the
//! full current grid state. Afterwards the server broadcasts a SNAPSHOT
//! whenever the grid stepped or at least one command was processed, and
//! relays each client's raw command bytes to all other clients so viewers
//! can mirror each other's control changes without waiting for the next
//! snapshot.

pub mod controller;
pub mod network;
pub mod registry;
