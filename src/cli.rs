use crate::bus::EventBus;
use crate::config::HostConfig;
use crate::console::{self, Console};
use crate::host::{Collaborators, ConsoleShell, EditorTabs, FsProjectSystem, SharedEditorTabs};
use crate::orchestrator::{self, LifecycleController, UiCommand};
use crate::storage::JsonPreferences;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "editor-host",
    version,
    about = "Interactive editor host with orderly project close and exit"
)]
pub struct Cli {
    /// Open this project at startup (may be repeated; later ones are refused once one is open)
    #[arg(long, value_name = "PATH", action = clap::ArgAction::Append)]
    pub project: Vec<PathBuf>,
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = HostConfig::from_env()?;
    tracing::debug!(?cfg, "host configuration");

    let (out_tx, out_handle) = console::spawn_output_writer();
    let (bus, inbox) = EventBus::new();
    let observer = console::spawn_observer(bus.subscribe(), out_tx.clone());

    let editors = SharedEditorTabs::new(EditorTabs::new(bus.clone()));
    let collab = Collaborators {
        projects: Box::new(FsProjectSystem::new(bus.clone())),
        editors: Box::new(editors.clone()),
        preferences: Box::new(JsonPreferences::load_or_default(
            &cfg.preferences_path,
            cfg.recent_projects_limit,
        )),
        shell: Box::new(ConsoleShell::new(out_tx.clone())),
    };
    let controller = LifecycleController::new(cfg.app_title.clone(), bus.clone(), collab);
    let console = Console::new(editors, out_tx.clone());
    console.greet();

    orchestrator::emit_startup_intents(&args, &bus);

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    console::spawn_input_reader(cmd_tx);

    let res =
        orchestrator::run_controller(controller, bus, inbox, cmd_rx, console, &cfg, true).await;

    // Every bus handle went down with the dispatcher; the observer flushes what it has and stops.
    let _ = observer.await;
    drop(out_tx);
    let _ = out_handle.await;

    res
}
