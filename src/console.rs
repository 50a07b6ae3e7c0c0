//! Line-oriented console front-end.
//!
//! Stands in for the UI toolkit: commands typed on stdin become lifecycle intents or editor
//! operations, and dispatched signals are rendered back as text.

use crate::host::{PromptAnswer, SharedEditorTabs};
use crate::model::{LifecycleState, ModalKind, Signal};
use crate::orchestrator::{LifecycleController, UiCommand};
use anyhow::{bail, Result};
use std::io::{BufRead, Write};
use tokio::sync::{broadcast, mpsc};

const HELP: &str = "\
Commands:
  load <path>        open a project
  close              close the project (closes open editors first)
  exit | quit        close all editors and exit
  open <resource>    open an editor for a resource
  modify <resource>  mark an open editor as modified
  y | n | c          answer a save prompt: save, discard, cancel
  editors            list open editors
  recent             list recent projects
  status             show the active project and lifecycle state
  help               show this help";

/// A line of console output. Prompts, listings and the window title go to stdout;
/// error modals go to stderr.
pub(crate) enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Start the console writer.
///
/// The shell, the signal observer and command replies all share the returned sender, so their
/// lines never interleave mid-line. Writes happen on a blocking thread and never stall the
/// dispatcher. The writer exits and flushes once every sender is dropped; await the handle
/// after the dispatcher stops so the farewell line is not lost.
pub(crate) fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let mut out = std::io::LineWriter::new(std::io::stdout().lock());
        let mut err = std::io::LineWriter::new(std::io::stderr().lock());

        while let Some(line) = rx.blocking_recv() {
            let written = match line {
                OutputLine::Stdout(msg) => writeln!(out, "{msg}"),
                OutputLine::Stderr(msg) => writeln!(err, "{msg}"),
            };
            if let Err(e) = written {
                // A closed terminal is not worth tearing the host down for.
                tracing::debug!(error = %e, "console write failed");
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

/// Parse one input line. Blank lines yield `None`.
pub(crate) fn parse_command(line: &str) -> Result<Option<UiCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let cmd = match (word.to_ascii_lowercase().as_str(), rest) {
        ("load", "") | ("open", "") | ("modify", "") => bail!("{word}: missing argument"),
        ("load", path) => UiCommand::Load(path.into()),
        ("open", resource) => UiCommand::Open(resource.to_string()),
        ("modify", resource) => UiCommand::Modify(resource.to_string()),
        ("close", "") => UiCommand::CloseProject,
        ("exit", "") | ("quit", "") => UiCommand::Exit,
        ("y", "") | ("yes", "") => UiCommand::Answer(PromptAnswer::Save),
        ("n", "") | ("no", "") => UiCommand::Answer(PromptAnswer::Discard),
        ("c", "") | ("cancel", "") => UiCommand::Answer(PromptAnswer::Cancel),
        ("editors", "") => UiCommand::ListEditors,
        ("recent", "") => UiCommand::ListRecent,
        ("status", "") => UiCommand::Status,
        ("help", "") | ("?", "") => UiCommand::Help,
        _ => bail!("unknown command: {line} (type 'help')"),
    };
    Ok(Some(cmd))
}

/// Read stdin on a dedicated thread and forward parsed commands.
///
/// The thread ends at end of input, which closes the channel.
pub(crate) fn spawn_input_reader(tx: mpsc::UnboundedSender<UiCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let cmd = match parse_command(&line) {
                Ok(Some(cmd)) => cmd,
                Ok(None) => continue,
                Err(e) => UiCommand::Invalid(format!("{e:#}")),
            };
            if tx.send(cmd).is_err() {
                break;
            }
        }
    });
}

/// Render a dispatched signal for the console, if it is worth showing.
fn render_signal(signal: &Signal) -> Option<OutputLine> {
    match signal {
        Signal::MessageModal {
            kind: ModalKind::Error,
            title,
            message,
        } => Some(OutputLine::Stderr(if title == message {
            format!("error: {title}")
        } else {
            format!("error: {title}: {message}")
        })),
        Signal::MessageModal {
            kind: ModalKind::Info,
            message,
            ..
        } => Some(OutputLine::Stdout(message.clone())),
        Signal::ProjectLoaded { project_path } => Some(OutputLine::Stdout(format!(
            "Project loaded: {}",
            project_path.display()
        ))),
        Signal::ProjectUnloaded => Some(OutputLine::Stdout("Project closed.".into())),
        Signal::ActiveSceneChange { scene: Some(scene) } => {
            Some(OutputLine::Stdout(format!("Active scene: {}", scene.0)))
        }
        Signal::ActiveSceneChange { scene: None } => {
            Some(OutputLine::Stdout("No active scene.".into()))
        }
        Signal::ResourceEditorClosed { editor } => {
            Some(OutputLine::Stdout(format!("Closed {editor}")))
        }
        Signal::LoadProject { .. }
        | Signal::CloseProject
        | Signal::ExitRequested
        | Signal::AllResourceEditorsClosed => None,
    }
}

/// Print dispatched signals until the bus goes away.
pub(crate) fn spawn_observer(
    mut rx: broadcast::Receiver<Signal>,
    out: mpsc::UnboundedSender<OutputLine>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(signal) => {
                    if let Some(line) = render_signal(&signal) {
                        let _ = out.send(line);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "console fell behind; signals skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Console commands that act on editors or report state rather than raising intents.
pub(crate) struct Console {
    editors: SharedEditorTabs,
    out: mpsc::UnboundedSender<OutputLine>,
}

impl Console {
    pub fn new(editors: SharedEditorTabs, out: mpsc::UnboundedSender<OutputLine>) -> Self {
        Self { editors, out }
    }

    pub fn greet(&self) {
        self.say("Type 'help' for commands.");
    }

    pub fn apply(&mut self, cmd: UiCommand, controller: &LifecycleController) {
        match cmd {
            UiCommand::Open(resource) => {
                let id = self.editors.borrow_mut().open(&resource);
                self.say(format!("Editing {id}"));
            }
            UiCommand::Modify(resource) => {
                if self.editors.borrow_mut().mark_modified(&resource) {
                    self.say(format!("{resource} modified"));
                } else {
                    self.complain(format!("no editor open for {resource}"));
                }
            }
            UiCommand::Answer(answer) => {
                if !self.editors.borrow_mut().answer(answer) {
                    self.complain("nothing to answer");
                }
            }
            UiCommand::ListEditors => {
                let tabs = self.editors.borrow();
                let list = tabs.list();
                if list.is_empty() {
                    self.say("No open editors.");
                }
                let prompt = tabs.pending_prompt();
                for (id, modified) in list.iter().rev() {
                    let mut line = format!("  {id}");
                    if *modified {
                        line.push_str(" (modified)");
                    }
                    if prompt == Some(id) {
                        line.push_str(" [awaiting answer]");
                    }
                    self.say(line);
                }
            }
            UiCommand::ListRecent => {
                let recent = controller.recent_projects();
                if recent.is_empty() {
                    self.say("No recent projects.");
                }
                for (i, entry) in recent.iter().enumerate() {
                    self.say(format!("  {}. {}  {}", i + 1, entry.path.display(), entry.opened_at));
                }
            }
            UiCommand::Status => {
                match controller.current_project() {
                    Some(project) => self.say(format!(
                        "Project: {} ({})",
                        project.name,
                        project.path.display()
                    )),
                    None => self.say("No project loaded."),
                }
                let state = match controller.state() {
                    LifecycleState::Idle => "idle",
                    LifecycleState::ClosingForProjectClose => "closing editors for project close",
                    LifecycleState::ClosingForExit => "closing editors for exit",
                };
                self.say(format!("State: {state}"));
            }
            UiCommand::Help => self.say(HELP),
            UiCommand::Invalid(msg) => self.complain(msg),
            UiCommand::Load(_) | UiCommand::CloseProject | UiCommand::Exit => {
                tracing::debug!(?cmd, "lifecycle command reached the console");
            }
        }
    }

    fn say(&self, msg: impl Into<String>) {
        let _ = self.out.send(OutputLine::Stdout(msg.into()));
    }

    fn complain(&self, msg: impl Into<String>) {
        let _ = self.out.send(OutputLine::Stderr(msg.into()));
    }
}
