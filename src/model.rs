use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifies an open resource editor (the resource path it edits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditorId(pub String);

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to the scene that scene-dependent observers should track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRef(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalKind {
    Error,
    Info,
}

/// Signals carried by the event bus.
///
/// The first group are intents and notifications consumed by the lifecycle
/// controller; the rest are emitted for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    LoadProject {
        path: PathBuf,
    },
    CloseProject,
    ExitRequested,
    ResourceEditorClosed {
        editor: EditorId,
    },
    ProjectUnloaded,
    ProjectLoaded {
        project_path: PathBuf,
    },
    AllResourceEditorsClosed,
    ActiveSceneChange {
        scene: Option<SceneRef>,
    },
    MessageModal {
        kind: ModalKind,
        title: String,
        message: String,
    },
}

impl Signal {
    pub fn modal_error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Signal::MessageModal {
            kind: ModalKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Stable signal name, used for log fields and one-shot subscriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Signal::LoadProject { .. } => "LoadProject",
            Signal::CloseProject => "CloseProject",
            Signal::ExitRequested => "ExitRequested",
            Signal::ResourceEditorClosed { .. } => "ResourceEditorClosed",
            Signal::ProjectUnloaded => "ProjectUnloaded",
            Signal::ProjectLoaded { .. } => "ProjectLoaded",
            Signal::AllResourceEditorsClosed => "AllResourceEditorsClosed",
            Signal::ActiveSceneChange { .. } => "ActiveSceneChange",
            Signal::MessageModal { .. } => "MessageModal",
        }
    }
}

/// Which lifecycle transition, if any, is waiting on a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    ClosingForProjectClose,
    ClosingForExit,
}

/// Reason a drain was requested. Each reason is fulfilled once per drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainRequest {
    ProjectClose,
    Exit,
}

/// Project currently owned by the project system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub path: PathBuf,
    pub name: String,
}

/// One entry of the most-recently-used project list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentProject {
    pub path: PathBuf,
    #[serde(default)]
    pub opened_at: String,
}
