//! Data exchanged with the external game framework on every tick.
//!
//! - [`state`] - the per-tick game-state snapshot received from the framework
//! - [`control`] - the [`ControlCommand`] sent back for the controlled player
//! - [`overlay`] - the debug-overlay side channel ([`DebugOverlay`])
//!
//! The transport that owns the connection to the framework lives outside this
//! workspace; it converts its wire messages into these types.

pub use self::{control::*, overlay::*, state::*};

pub mod control;
pub mod overlay;
pub mod state;
