//! Lifecycle controller.
//!
//! Owns the load/close/exit flows and the dispatcher loop that feeds them signals.
//! Close and exit are serialized behind a drain of the open resource editors: the
//! transition runs only once the last editor has closed.

use super::coordinator::{DrainProgress, ShutdownCoordinator};
use crate::bus::EventBus;
use crate::config::HostConfig;
use crate::console::Console;
use crate::error::LifecycleError;
use crate::host::{Collaborators, PromptAnswer};
use crate::model::{
    DrainRequest, EditorId, LifecycleState, ModalKind, ProjectInfo, RecentProject, Signal,
};
use anyhow::Result;
use futures::future::{self, BoxFuture, FutureExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

/// Commands emitted by the console front-end.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UiCommand {
    Load(PathBuf),
    CloseProject,
    Exit,
    Open(String),
    Modify(String),
    Answer(PromptAnswer),
    ListEditors,
    ListRecent,
    Status,
    Help,
    Invalid(String),
}

pub(crate) struct LifecycleController {
    default_title: String,
    bus: EventBus,
    collab: Collaborators,
    coordinator: ShutdownCoordinator,
    state: LifecycleState,
    requests: Vec<DrainRequest>,
    exited: bool,
}

impl LifecycleController {
    pub fn new(default_title: impl Into<String>, bus: EventBus, mut collab: Collaborators) -> Self {
        let default_title = default_title.into();
        collab.shell.set_window_title(&default_title);
        Self {
            default_title,
            bus,
            collab,
            coordinator: ShutdownCoordinator::new(),
            state: LifecycleState::Idle,
            requests: Vec::new(),
            exited: false,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    pub fn current_project(&self) -> Option<ProjectInfo> {
        self.collab.projects.current_project()
    }

    pub fn recent_projects(&self) -> Vec<RecentProject> {
        self.collab.preferences.recent_projects()
    }

    /// The editor a drain has been waiting on for longer than `after`, reported once.
    pub fn take_stalled_editor(&mut self, after: Duration) -> Option<EditorId> {
        self.coordinator.take_stall(Instant::now(), after)
    }

    /// Handle one signal to completion, then hand it to observers.
    pub fn dispatch(&mut self, signal: Signal) {
        if self.exited {
            tracing::trace!(signal = signal.name(), "ignored after exit");
            return;
        }
        tracing::debug!(signal = signal.name(), state = ?self.state, "dispatch");

        match &signal {
            Signal::LoadProject { path } => {
                if let Err(e) = self.load_project(path) {
                    tracing::warn!(
                        path = %path.display(),
                        error = %format!("{e:#}"),
                        "project load refused"
                    );
                    self.bus.send(e.to_modal());
                }
            }
            Signal::CloseProject => self.request_drain(DrainRequest::ProjectClose),
            Signal::ExitRequested => self.request_drain(DrainRequest::Exit),
            Signal::ResourceEditorClosed { editor } => {
                let progress = self
                    .coordinator
                    .on_editor_closed(self.collab.editors.as_mut(), editor);
                if progress == DrainProgress::AllClosed {
                    self.finish_drain();
                }
            }
            Signal::ProjectUnloaded => self.on_project_unloaded(),
            Signal::ProjectLoaded { project_path } => self.on_project_loaded(project_path),
            Signal::AllResourceEditorsClosed
            | Signal::ActiveSceneChange { .. }
            | Signal::MessageModal { .. } => {}
        }

        self.bus.publish(signal);
    }

    /// Load a project. Refused while one is loaded or while a close/exit is draining.
    pub fn load_project(&mut self, path: &Path) -> Result<ProjectInfo, LifecycleError> {
        if let Some(active) = self.collab.projects.current_project() {
            return Err(LifecycleError::AlreadyLoaded { path: active.path });
        }
        if self.state != LifecycleState::Idle {
            return Err(LifecycleError::TransitionInProgress);
        }
        let project = self
            .collab
            .projects
            .load_project(path)
            .map_err(|source| LifecycleError::Load {
                path: path.to_path_buf(),
                source,
            })?;
        self.bus.send(Signal::ProjectLoaded {
            project_path: project.path.clone(),
        });
        Ok(project)
    }

    fn request_drain(&mut self, request: DrainRequest) {
        if !self.requests.contains(&request) {
            self.requests.push(request);
        }
        // Set before the drain starts; cleared only when it completes.
        self.state = match (self.state, request) {
            (_, DrainRequest::Exit) | (LifecycleState::ClosingForExit, _) => {
                LifecycleState::ClosingForExit
            }
            _ => LifecycleState::ClosingForProjectClose,
        };

        match self.coordinator.drain(self.collab.editors.as_mut()) {
            DrainProgress::AllClosed => self.finish_drain(),
            DrainProgress::Blocked { awaited } => {
                tracing::info!(editor = %awaited, "drain waiting on an editor in the background");
                self.bus.send(Signal::MessageModal {
                    kind: ModalKind::Info,
                    title: "Waiting".into(),
                    message: format!("Switch back to {awaited} and close it to continue"),
                });
            }
            DrainProgress::Pending | DrainProgress::Idle => {}
        }
    }

    fn finish_drain(&mut self) {
        self.bus.send(Signal::AllResourceEditorsClosed);
        let requests = std::mem::take(&mut self.requests);
        self.state = LifecycleState::Idle;

        for request in requests {
            match request {
                DrainRequest::ProjectClose => self.close_project(),
                DrainRequest::Exit => {
                    self.exit();
                    break;
                }
            }
        }
    }

    /// Exit without waiting for the remaining editors. Their unsaved changes are lost.
    pub fn force_exit(&mut self) {
        if self.exited {
            return;
        }
        tracing::warn!(state = ?self.state, "forcing exit while editors are still open");
        self.requests.clear();
        self.state = LifecycleState::Idle;
        self.exit();
    }

    fn close_project(&mut self) {
        match self.collab.projects.current_project() {
            Some(project) => {
                tracing::info!(project = %project.name, "closing project");
                self.collab.projects.close_project();
            }
            None => tracing::debug!("close requested without a loaded project"),
        }
    }

    fn exit(&mut self) {
        tracing::info!("exiting");
        // Losing preferences is preferable to refusing to exit.
        if let Err(e) = self.collab.preferences.write() {
            tracing::warn!(error = %format!("{e:#}"), "failed to persist preferences");
        }
        self.collab.shell.shutdown_ui();
        self.collab.shell.exit_engine();
        self.exited = true;
    }

    fn on_project_loaded(&mut self, path: &Path) {
        let title = format!("{} - {}", self.default_title, path.display());
        self.collab.shell.set_window_title(&title);
        self.collab.preferences.register_recent_project(path);
    }

    fn on_project_unloaded(&mut self) {
        self.collab.shell.set_window_title(&self.default_title);
        self.bus.send(Signal::ActiveSceneChange { scene: None });
    }
}

/// Dispatch signals and console commands until the host exits.
///
/// Queued signals are always handled before the next console command, so a cascade of
/// signals started by one command completes before the user's next input is looked at.
pub(crate) async fn run_controller(
    mut controller: LifecycleController,
    bus: EventBus,
    mut inbox: UnboundedReceiver<Signal>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
    mut console: Console,
    cfg: &HostConfig,
    enable_signal_handlers: bool,
) -> Result<()> {
    let mut input_closed = false;
    let mut interrupt = interrupt_listener(enable_signal_handlers);
    // Drain watchdog: tell the user which editor is holding up a close or exit.
    let mut watchdog = tokio::time::interval(Duration::from_millis(500));

    loop {
        tokio::select! {
            biased;

            signal = inbox.recv() => {
                match signal {
                    Some(signal) => {
                        controller.dispatch(signal);
                        if controller.has_exited() {
                            publish_remaining(&bus, &mut inbox);
                            break;
                        }
                    }
                    None => break,
                }
            }
            cmd = cmd_rx.recv(), if !input_closed => {
                match cmd {
                    Some(UiCommand::Load(path)) => bus.send(Signal::LoadProject { path }),
                    Some(UiCommand::CloseProject) => bus.send(Signal::CloseProject),
                    Some(UiCommand::Exit) => bus.send(Signal::ExitRequested),
                    Some(other) => console.apply(other, &controller),
                    None => {
                        // End of input behaves like closing the window.
                        input_closed = true;
                        bus.send(Signal::ExitRequested);
                    }
                }
            }
            res = &mut interrupt => {
                interrupt = interrupt_listener(enable_signal_handlers);
                match res {
                    Ok(()) if controller.state() == LifecycleState::ClosingForExit => {
                        // A second interrupt while exit waits on editors stops waiting.
                        controller.force_exit();
                        publish_remaining(&bus, &mut inbox);
                        break;
                    }
                    Ok(()) => {
                        tracing::info!("interrupt received");
                        bus.send(Signal::ExitRequested);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "interrupt handler failed");
                        return Err(e.into());
                    }
                }
            }
            _ = watchdog.tick() => {
                if let Some(editor) = controller.take_stalled_editor(cfg.drain_stall_after) {
                    bus.send(Signal::MessageModal {
                        kind: ModalKind::Info,
                        title: "Waiting".into(),
                        message: format!("Still waiting for {editor} to close…"),
                    });
                }
            }
        }
    }

    tracing::debug!(state = ?controller.state(), "dispatcher stopped");
    Ok(())
}

/// Resolves on the next Ctrl-C, or never when signal handling is off.
fn interrupt_listener(enabled: bool) -> BoxFuture<'static, std::io::Result<()>> {
    if enabled {
        tokio::signal::ctrl_c().boxed()
    } else {
        future::pending().boxed()
    }
}

/// Hand whatever the exit cascade queued to observers without dispatching it.
fn publish_remaining(bus: &EventBus, inbox: &mut UnboundedReceiver<Signal>) {
    while let Ok(signal) = inbox.try_recv() {
        tracing::trace!(signal = signal.name(), "published after exit");
        bus.publish(signal);
    }
}
