//! # Grid Client Library
//!
//! Viewer side of the networked cellular-automaton simulation. The client
//! never runs the simulation itself: it mirrors the server's authoritative
//! [`shared::GridModel`] by applying the INIT message received on connect
//! and every SNAPSHOT broadcast after it, and mirrors parameter commands
//! relayed from other clients so its controls stay in sync.
//!
//! ## Architecture
//!
//! A spawned listener task ([`network`]) owns the socket's read half and
//! does nothing but reassemble frames and push the raw payloads onto the
//! pending-command queue. The viewer loop drains that queue between
//! repaints, so decoding and model mutation always happen on the owner's
//! schedule, never the network's.
//!
//! ## Module organization
//!
//! - [`controller`] — the viewer command controller: restores snapshots,
//!   counts cycles and mirrors parameter changes.
//! - [`network`] — connection setup, the listener task and the viewer loop.
//! - [`presentation`] — the seam a display layer implements, plus the
//!   ASCII renderer the headless binary uses.

pub mod controller;
pub mod network;
pub mod presentation;
