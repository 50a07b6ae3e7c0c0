//! Startup intents derived from process arguments.

use crate::bus::EventBus;
use crate::cli::Cli;
use crate::model::Signal;

/// One `LoadProject` per `--project`, in argument order. Duplicates are kept; the load
/// precondition rejects all but the first that succeeds.
pub(crate) fn startup_intents(args: &Cli) -> Vec<Signal> {
    args.project
        .iter()
        .map(|path| Signal::LoadProject { path: path.clone() })
        .collect()
}

/// Queue the startup intents on the bus. Returns how many were queued.
pub(crate) fn emit_startup_intents(args: &Cli, bus: &EventBus) -> usize {
    let intents = startup_intents(args);
    let n = intents.len();
    for intent in intents {
        tracing::info!(?intent, "startup intent");
        bus.send(intent);
    }
    n
}
