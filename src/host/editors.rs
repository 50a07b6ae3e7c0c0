use super::ResourceEditorRegistry;
use crate::bus::EventBus;
use crate::model::{EditorId, ModalKind, Signal};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// User's answer to a "save changes?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptAnswer {
    Save,
    Discard,
    Cancel,
}

#[derive(Debug)]
struct Tab {
    id: EditorId,
    modified: bool,
}

/// Open resource editors as tabs; the most recently focused tab is the current editor.
///
/// Closing a modified tab raises a prompt and completes only once the user answers it.
pub(crate) struct EditorTabs {
    bus: EventBus,
    tabs: Vec<Tab>,
    prompt: Option<EditorId>,
}

impl EditorTabs {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            tabs: Vec::new(),
            prompt: None,
        }
    }

    /// Open an editor for `resource`, or focus it if it is already open.
    pub fn open(&mut self, resource: &str) -> EditorId {
        let id = EditorId(resource.to_string());
        let tab = match self.tabs.iter().position(|t| t.id == id) {
            Some(idx) => self.tabs.remove(idx),
            None => {
                tracing::debug!(editor = %id, "editor opened");
                Tab {
                    id: id.clone(),
                    modified: false,
                }
            }
        };
        self.tabs.push(tab);
        id
    }

    /// Returns false when no editor is open for `resource`.
    pub fn mark_modified(&mut self, resource: &str) -> bool {
        match self.tabs.iter_mut().find(|t| t.id.0 == resource) {
            Some(tab) => {
                tab.modified = true;
                true
            }
            None => false,
        }
    }

    /// Open editors, oldest first, with their modified flag.
    pub fn list(&self) -> Vec<(EditorId, bool)> {
        self.tabs
            .iter()
            .map(|t| (t.id.clone(), t.modified))
            .collect()
    }

    pub fn pending_prompt(&self) -> Option<&EditorId> {
        self.prompt.as_ref()
    }

    /// Resolve the pending prompt. Returns false when there was nothing to answer.
    pub fn answer(&mut self, answer: PromptAnswer) -> bool {
        let Some(id) = self.prompt.take() else {
            return false;
        };
        match answer {
            PromptAnswer::Save => {
                tracing::info!(editor = %id, "changes saved");
                self.close_tab(&id);
            }
            PromptAnswer::Discard => {
                tracing::info!(editor = %id, "changes discarded");
                self.close_tab(&id);
            }
            PromptAnswer::Cancel => {
                tracing::info!(editor = %id, "close cancelled");
            }
        }
        true
    }

    fn close_tab(&mut self, id: &EditorId) {
        self.tabs.retain(|t| &t.id != id);
        tracing::debug!(editor = %id, "editor closed");
        self.bus.send(Signal::ResourceEditorClosed { editor: id.clone() });
    }
}

impl ResourceEditorRegistry for EditorTabs {
    fn current_editor(&self) -> Option<EditorId> {
        self.tabs.last().map(|t| t.id.clone())
    }

    fn request_close_current(&mut self) {
        let Some(tab) = self.tabs.last() else {
            return;
        };
        let id = tab.id.clone();
        if self.prompt.as_ref() == Some(&id) {
            return;
        }
        if tab.modified {
            self.prompt = Some(id.clone());
            self.bus.send(Signal::MessageModal {
                kind: ModalKind::Info,
                title: "Unsaved changes".into(),
                message: format!("Save changes to {id}? [y]es / [n]o / [c]ancel"),
            });
        } else {
            self.close_tab(&id);
        }
    }
}

/// Handle shared between the lifecycle controller and the console front-end.
///
/// Both live on the dispatcher thread and never hold a borrow across a dispatch.
#[derive(Clone)]
pub(crate) struct SharedEditorTabs(Rc<RefCell<EditorTabs>>);

impl SharedEditorTabs {
    pub fn new(tabs: EditorTabs) -> Self {
        Self(Rc::new(RefCell::new(tabs)))
    }

    pub fn borrow(&self) -> Ref<'_, EditorTabs> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, EditorTabs> {
        self.0.borrow_mut()
    }
}

impl ResourceEditorRegistry for SharedEditorTabs {
    fn current_editor(&self) -> Option<EditorId> {
        self.0.borrow().current_editor()
    }

    fn request_close_current(&mut self) {
        self.0.borrow_mut().request_close_current();
    }
}
