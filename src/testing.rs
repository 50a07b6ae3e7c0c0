//! Recording test doubles for the host collaborators.
//!
//! Every double appends to a shared [`Journal`], so tests can assert on the relative order of
//! editor close requests, project close, preference writes and engine shutdown.

use crate::bus::EventBus;
use crate::host::{
    Collaborators, HostShell, PreferencesStore, ProjectSystem, ResourceEditorRegistry,
};
use crate::model::{EditorId, ProjectInfo, RecentProject, Signal};
use crate::orchestrator::LifecycleController;
use anyhow::{bail, Result};
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    RequestClose(String),
    LoadProject(PathBuf),
    CloseProject,
    RegisterRecent(PathBuf),
    WritePreferences,
    SetTitle(String),
    ShutdownUi,
    ExitEngine,
}

#[derive(Clone, Default)]
pub(crate) struct Journal(Rc<RefCell<Vec<Call>>>);

impl Journal {
    pub fn record(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }
}

#[derive(Default)]
struct EditorsInner {
    open: VecDeque<EditorId>,
    declined: HashSet<EditorId>,
    closing: Option<EditorId>,
}

/// Editors closed front to back. A close completes only when the test says so.
#[derive(Clone)]
pub(crate) struct MockEditors {
    inner: Rc<RefCell<EditorsInner>>,
    journal: Journal,
}

impl MockEditors {
    pub fn new(names: &[&str]) -> (Self, Journal) {
        let journal = Journal::default();
        (Self::with_journal(names, journal.clone()), journal)
    }

    pub fn with_journal(names: &[&str], journal: Journal) -> Self {
        let inner = EditorsInner {
            open: names.iter().map(|n| EditorId(n.to_string())).collect(),
            ..Default::default()
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
            journal,
        }
    }

    /// Close requests for `id` are ignored, as if the user cancelled the prompt.
    pub fn decline(&self, id: &EditorId) {
        self.inner.borrow_mut().declined.insert(id.clone());
    }

    /// Open an editor in front of the others, making it the current one.
    pub fn open_front(&self, name: &str) {
        self.inner.borrow_mut().open.push_front(EditorId(name.to_string()));
    }

    pub fn accept(&self, id: &EditorId) {
        self.inner.borrow_mut().declined.remove(id);
    }

    /// Finish the outstanding close, if any, and return the closed editor.
    pub fn complete_close(&self) -> Option<EditorId> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.closing.take()?;
        inner.open.retain(|e| e != &id);
        Some(id)
    }
}

impl ResourceEditorRegistry for MockEditors {
    fn current_editor(&self) -> Option<EditorId> {
        self.inner.borrow().open.front().cloned()
    }

    fn request_close_current(&mut self) {
        let mut inner = self.inner.borrow_mut();
        let Some(id) = inner.open.front().cloned() else {
            return;
        };
        self.journal.record(Call::RequestClose(id.0.clone()));
        if !inner.declined.contains(&id) {
            inner.closing = Some(id);
        }
    }
}

#[derive(Clone)]
pub(crate) struct MockProjects {
    current: Rc<RefCell<Option<ProjectInfo>>>,
    fail: Rc<RefCell<bool>>,
    bus: EventBus,
    journal: Journal,
}

impl MockProjects {
    pub fn fail_loads(&self) {
        *self.fail.borrow_mut() = true;
    }

    fn set(&self, path: &Path) {
        *self.current.borrow_mut() = Some(ProjectInfo {
            path: path.to_path_buf(),
            name: "test".into(),
        });
    }
}

impl ProjectSystem for MockProjects {
    fn current_project(&self) -> Option<ProjectInfo> {
        self.current.borrow().clone()
    }

    fn load_project(&mut self, path: &Path) -> Result<ProjectInfo> {
        self.journal.record(Call::LoadProject(path.to_path_buf()));
        if *self.fail.borrow() {
            bail!("no project at {}", path.display());
        }
        self.set(path);
        self.current_project()
            .ok_or_else(|| anyhow::anyhow!("project vanished"))
    }

    fn close_project(&mut self) {
        self.journal.record(Call::CloseProject);
        if self.current.borrow_mut().take().is_some() {
            self.bus.send(Signal::ProjectUnloaded);
        }
    }
}

#[derive(Clone)]
pub(crate) struct MockPreferences {
    recent: Rc<RefCell<Vec<RecentProject>>>,
    fail: Rc<RefCell<bool>>,
    journal: Journal,
}

impl MockPreferences {
    pub fn fail_writes(&self) {
        *self.fail.borrow_mut() = true;
    }
}

impl PreferencesStore for MockPreferences {
    fn register_recent_project(&mut self, path: &Path) {
        self.journal.record(Call::RegisterRecent(path.to_path_buf()));
        self.recent.borrow_mut().insert(
            0,
            RecentProject {
                path: path.to_path_buf(),
                opened_at: String::new(),
            },
        );
    }

    fn recent_projects(&self) -> Vec<RecentProject> {
        self.recent.borrow().clone()
    }

    fn write(&mut self) -> Result<()> {
        self.journal.record(Call::WritePreferences);
        if *self.fail.borrow() {
            bail!("disk full");
        }
        Ok(())
    }
}

pub(crate) struct MockShell {
    journal: Journal,
}

impl HostShell for MockShell {
    fn set_window_title(&mut self, title: &str) {
        self.journal.record(Call::SetTitle(title.to_string()));
    }

    fn shutdown_ui(&mut self) {
        self.journal.record(Call::ShutdownUi);
    }

    fn exit_engine(&mut self) {
        self.journal.record(Call::ExitEngine);
    }
}

/// Collaborators wired to one journal, with handles kept for the test to poke at.
pub(crate) fn mock_collaborators(
    bus: &EventBus,
    editors: MockEditors,
    journal: &Journal,
) -> (Collaborators, MockProjects, MockPreferences) {
    let projects = MockProjects {
        current: Rc::default(),
        fail: Rc::default(),
        bus: bus.clone(),
        journal: journal.clone(),
    };
    let preferences = MockPreferences {
        recent: Rc::default(),
        fail: Rc::default(),
        journal: journal.clone(),
    };
    let collab = Collaborators {
        projects: Box::new(projects.clone()),
        editors: Box::new(editors),
        preferences: Box::new(preferences.clone()),
        shell: Box::new(MockShell {
            journal: journal.clone(),
        }),
    };
    (collab, projects, preferences)
}

/// A controller plus a synchronous stand-in for the dispatcher loop.
pub(crate) struct Harness {
    pub controller: LifecycleController,
    pub bus: EventBus,
    pub inbox: UnboundedReceiver<Signal>,
    pub editors: MockEditors,
    pub projects: MockProjects,
    pub preferences: MockPreferences,
    pub journal: Journal,
    /// Every signal taken off the queue, in dispatch order. Signals taken after exit are not
    /// dispatched but still reach observers, as in the real loop.
    pub dispatched: Vec<Signal>,
}

impl Harness {
    pub fn new(editors: &[&str]) -> Self {
        let (bus, inbox) = EventBus::new();
        let journal = Journal::default();
        let editors = MockEditors::with_journal(editors, journal.clone());
        let (collab, projects, preferences) =
            mock_collaborators(&bus, editors.clone(), &journal);
        let controller = LifecycleController::new("Editor", bus.clone(), collab);
        Self {
            controller,
            bus,
            inbox,
            editors,
            projects,
            preferences,
            journal,
            dispatched: Vec::new(),
        }
    }

    /// Start with a project already open, bypassing the load flow.
    pub fn with_project(self, path: &str) -> Self {
        self.projects.set(Path::new(path));
        self
    }

    pub fn current_project_path(&self) -> Option<PathBuf> {
        self.controller.current_project().map(|p| p.path)
    }

    /// Queue a signal and run the queue dry.
    pub fn send(&mut self, signal: Signal) {
        self.bus.send(signal);
        self.pump();
    }

    pub fn dispatch_one(&mut self) {
        if let Ok(signal) = self.inbox.try_recv() {
            self.dispatched.push(signal.clone());
            self.controller.dispatch(signal);
        }
    }

    pub fn pump(&mut self) {
        while let Ok(signal) = self.inbox.try_recv() {
            self.dispatched.push(signal.clone());
            self.controller.dispatch(signal);
        }
    }

    /// Let the outstanding editor close complete. False when none was outstanding.
    pub fn close_next(&mut self) -> bool {
        match self.editors.complete_close() {
            Some(editor) => {
                self.send(Signal::ResourceEditorClosed { editor });
                true
            }
            None => false,
        }
    }

    pub fn dispatched_named(&self, name: &str) -> usize {
        self.dispatched.iter().filter(|s| s.name() == name).count()
    }
}
