//! Application-level lifecycle orchestration.
//!
//! This module owns the project load/close and exit flows, the drain of open resource editors
//! that gates them, and the startup intents derived from process arguments. Console and
//! collaborator layers call into this module to keep responsibilities separated.

mod bootstrap;
mod controller;
mod coordinator;

pub(crate) use bootstrap::emit_startup_intents;
pub(crate) use controller::{run_controller, LifecycleController, UiCommand};
