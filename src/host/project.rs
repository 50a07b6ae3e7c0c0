use super::ProjectSystem;
use crate::bus::EventBus;
use crate::model::{ProjectInfo, Signal};
use anyhow::{Context, Result};
use std::path::Path;

/// Project system backed by a directory on disk.
pub(crate) struct FsProjectSystem {
    bus: EventBus,
    current: Option<ProjectInfo>,
}

impl FsProjectSystem {
    pub fn new(bus: EventBus) -> Self {
        Self { bus, current: None }
    }
}

impl ProjectSystem for FsProjectSystem {
    fn current_project(&self) -> Option<ProjectInfo> {
        self.current.clone()
    }

    fn load_project(&mut self, path: &Path) -> Result<ProjectInfo> {
        let path = path
            .canonicalize()
            .with_context(|| format!("resolve project path {}", path.display()))?;
        let meta = std::fs::metadata(&path)
            .with_context(|| format!("read project {}", path.display()))?;
        // A project is its directory; a project file stands for its parent directory.
        let root = if meta.is_dir() {
            path.clone()
        } else {
            path.parent()
                .map(Path::to_path_buf)
                .with_context(|| format!("project file {} has no parent", path.display()))?
        };
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        let project = ProjectInfo { path: root, name };
        tracing::info!(project = %project.name, path = %project.path.display(), "project loaded");
        self.current = Some(project.clone());
        Ok(project)
    }

    fn close_project(&mut self) {
        if let Some(project) = self.current.take() {
            tracing::info!(project = %project.name, "project closed");
            self.bus.send(Signal::ProjectUnloaded);
        }
    }
}
