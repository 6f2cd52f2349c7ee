//! Decision pipeline for the boostrap bot.
//!
//! Every tick the transport hands a [`GameState`](boostrap_game::GameState)
//! to [`Agent::on_tick`], which returns a
//! [`ControlCommand`](boostrap_game::ControlCommand):
//!
//! ```text
//! GameState
//!     ↓ observation::populate
//! Observation [f32; 25]
//!     ↓ InferenceAdapter::run
//! Action [f32; 7]
//!     ↓ action::decode
//! ControlCommand
//! ```
//!
//! When no model is loaded, the snapshot has no payload, or the model fails
//! for a tick, the [`heuristic`] controller decides that tick instead.
//!
//! # Modules
//!
//! - [`observation`] - feature extraction and the trained observation ranges
//! - [`inference`] - serialized access to the policy model
//! - [`action`] - policy output decoding
//! - [`heuristic`] - touch-counting fallback controller
//! - [`agent`] - the per-tick orchestrator
//!
//! # Model contract
//!
//! The observation and action layouts are shared with the training pipeline.
//! A model must take `"obs"` with shape `[1, 25]` and produce `"action"` with
//! shape `[1, 7]`.

pub use self::agent::Agent;

pub mod action;
pub mod agent;
pub mod heuristic;
pub mod inference;
pub mod observation;
