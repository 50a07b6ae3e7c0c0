use crate::model::Signal;
use std::path::PathBuf;

/// Why a lifecycle intent was refused. Every variant leaves the host unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Project already loaded: {}", path.display())]
    AlreadyLoaded { path: PathBuf },

    #[error("Project transition in progress")]
    TransitionInProgress,

    #[error("Failed to load project {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl LifecycleError {
    /// The user-visible modal error for this failure.
    pub fn to_modal(&self) -> Signal {
        match self {
            LifecycleError::AlreadyLoaded { .. } => {
                Signal::modal_error("Project already loaded", "Project already loaded")
            }
            LifecycleError::TransitionInProgress => Signal::modal_error(
                "Project transition in progress",
                "Wait for open editors to close before loading a project",
            ),
            LifecycleError::Load { path, source } => Signal::modal_error(
                "Failed to load project",
                format!("{}: {source:#}", path.display()),
            ),
        }
    }
}
