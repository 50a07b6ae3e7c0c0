//! Collaborators the lifecycle controller drives but does not own the semantics of.
//!
//! The controller only talks to these traits; the console binary plugs in the concrete
//! implementations below, and the tests plug in recording doubles.

mod editors;
mod project;
mod shell;

pub(crate) use editors::{EditorTabs, PromptAnswer, SharedEditorTabs};
pub(crate) use project::FsProjectSystem;
pub(crate) use shell::ConsoleShell;

use crate::model::{EditorId, ProjectInfo, RecentProject};
use anyhow::Result;
use std::path::Path;

/// Open resource editors, closed one at a time.
pub trait ResourceEditorRegistry {
    /// The editor a close request would currently target, if any.
    fn current_editor(&self) -> Option<EditorId>;

    /// Ask the current editor to close and return immediately.
    ///
    /// The registry sends `ResourceEditorClosed` once the editor is gone. The editor may
    /// decline (the user cancels a save prompt), in which case nothing is sent. Repeating
    /// the request while that editor is already closing must be a no-op.
    fn request_close_current(&mut self);
}

/// Owner of the single active project.
pub trait ProjectSystem {
    fn current_project(&self) -> Option<ProjectInfo>;

    /// Load synchronously. On failure nothing is left half-loaded.
    fn load_project(&mut self, path: &Path) -> Result<ProjectInfo>;

    /// Close the active project; sends `ProjectUnloaded` when done.
    fn close_project(&mut self);
}

/// Persisted preferences: recent projects plus arbitrary key/values.
pub trait PreferencesStore {
    fn register_recent_project(&mut self, path: &Path);

    fn recent_projects(&self) -> Vec<RecentProject>;

    fn write(&mut self) -> Result<()>;
}

/// The UI toolkit and engine loop, as far as lifecycle transitions are concerned.
pub trait HostShell {
    fn set_window_title(&mut self, title: &str);

    fn shutdown_ui(&mut self);

    /// Stop the engine loop. Called exactly once, as the last step of exit.
    fn exit_engine(&mut self);
}

/// Everything the controller needs from the outside world.
pub struct Collaborators {
    pub projects: Box<dyn ProjectSystem>,
    pub editors: Box<dyn ResourceEditorRegistry>,
    pub preferences: Box<dyn PreferencesStore>,
    pub shell: Box<dyn HostShell>,
}
