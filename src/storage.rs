//! Preferences file: recent projects plus whatever other keys are already in it.

use crate::host::PreferencesStore;
use crate::model::RecentProject;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferencesDoc {
    #[serde(default)]
    recent_projects: Vec<RecentProject>,
    /// Keys owned by other parts of the host; written back untouched.
    #[serde(flatten)]
    other: serde_json::Map<String, serde_json::Value>,
}

/// JSON-backed preferences store.
pub(crate) struct JsonPreferences {
    path: PathBuf,
    limit: usize,
    doc: PreferencesDoc,
}

impl JsonPreferences {
    /// Read the preferences file. A missing file is an empty store.
    pub fn open(path: &Path, limit: usize) -> Result<Self> {
        let doc = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse preferences {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PreferencesDoc::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("read preferences {}", path.display()))
            }
        };
        let mut prefs = Self {
            path: path.to_path_buf(),
            limit,
            doc,
        };
        prefs.doc.recent_projects.truncate(limit);
        Ok(prefs)
    }

    /// Like [`JsonPreferences::open`], but an unreadable file starts an empty store.
    pub fn load_or_default(path: &Path, limit: usize) -> Self {
        match Self::open(path, limit) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "starting with empty preferences");
                Self {
                    path: path.to_path_buf(),
                    limit,
                    doc: PreferencesDoc::default(),
                }
            }
        }
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}

impl PreferencesStore for JsonPreferences {
    fn register_recent_project(&mut self, path: &Path) {
        let recent = &mut self.doc.recent_projects;
        recent.retain(|r| r.path != path);
        recent.insert(
            0,
            RecentProject {
                path: path.to_path_buf(),
                opened_at: now_rfc3339(),
            },
        );
        recent.truncate(self.limit);
    }

    fn recent_projects(&self) -> Vec<RecentProject> {
        self.doc.recent_projects.clone()
    }

    fn write(&mut self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let json = serde_json::to_vec_pretty(&self.doc).context("serialize preferences")?;
        // Write beside the target and rename so a failed write never truncates the old file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "preferences written");
        Ok(())
    }
}
