//! Drain of open resource editors.
//!
//! The coordinator closes editors one at a time: it asks the registry's current editor to
//! close, waits for `ResourceEditorClosed`, then looks again, because closing one editor can
//! reveal another and the user can decline a close. When the registry reports no editor the
//! drain is complete. At most one drain is in flight; asking again joins it.

use crate::host::ResourceEditorRegistry;
use crate::model::EditorId;
use std::time::{Duration, Instant};

/// Result of feeding the coordinator a drain request or a close notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DrainProgress {
    /// No editor remains. Reported exactly once per drain cycle.
    AllClosed,
    /// Waiting for the awaited editor to close.
    Pending,
    /// A joined drain is waiting on an editor that is no longer the current one, so it
    /// cannot be asked again until the user switches back to it.
    Blocked { awaited: EditorId },
    /// Nothing is being drained; the notification was not ours.
    Idle,
}

#[derive(Debug)]
enum DrainState {
    Idle,
    Waiting {
        editor: EditorId,
        since: Instant,
        closed_so_far: usize,
        stall_reported: bool,
    },
}

#[derive(Debug)]
pub(crate) struct ShutdownCoordinator {
    state: DrainState,
    cycles: u64,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            state: DrainState::Idle,
            cycles: 0,
        }
    }

    pub fn is_draining(&self) -> bool {
        matches!(self.state, DrainState::Waiting { .. })
    }

    /// Start a drain, or join the one already in flight.
    ///
    /// Joining never starts a second chain of close requests. It repeats the close request
    /// for the awaited editor, which registries ignore while that close is still underway
    /// and which re-prompts the user if they declined earlier. Only the current editor can
    /// be asked to close; when another editor has been brought to the front since, the join
    /// reports [`DrainProgress::Blocked`] and asks nothing.
    pub fn drain(&mut self, editors: &mut dyn ResourceEditorRegistry) -> DrainProgress {
        if let DrainState::Waiting { editor, .. } = &self.state {
            tracing::debug!(editor = %editor, "drain already in flight; joining");
            if editors.current_editor().as_ref() != Some(editor) {
                return DrainProgress::Blocked {
                    awaited: editor.clone(),
                };
            }
            editors.request_close_current();
            return DrainProgress::Pending;
        }
        self.cycles += 1;
        tracing::debug!(cycle = self.cycles, "drain started");
        self.advance(editors, 0)
    }

    /// Feed a `ResourceEditorClosed` notification.
    pub fn on_editor_closed(
        &mut self,
        editors: &mut dyn ResourceEditorRegistry,
        closed: &EditorId,
    ) -> DrainProgress {
        let DrainState::Waiting {
            editor,
            closed_so_far,
            ..
        } = &self.state
        else {
            return DrainProgress::Idle;
        };
        let awaited = editor.clone();
        let closed_so_far = *closed_so_far;

        if closed != &awaited && editors.current_editor().as_ref() == Some(&awaited) {
            // Some other editor went away; ours is still being asked.
            return DrainProgress::Pending;
        }
        self.advance(editors, closed_so_far + 1)
    }

    /// The awaited editor, once it has been closing for longer than `after`.
    ///
    /// Reported once per awaited editor.
    pub fn take_stall(&mut self, now: Instant, after: Duration) -> Option<EditorId> {
        match &mut self.state {
            DrainState::Waiting {
                editor,
                since,
                stall_reported,
                ..
            } if !*stall_reported && now.saturating_duration_since(*since) >= after => {
                *stall_reported = true;
                Some(editor.clone())
            }
            _ => None,
        }
    }

    fn advance(
        &mut self,
        editors: &mut dyn ResourceEditorRegistry,
        closed_so_far: usize,
    ) -> DrainProgress {
        match editors.current_editor() {
            None => {
                tracing::info!(
                    cycle = self.cycles,
                    closed = closed_so_far,
                    "all resource editors closed"
                );
                self.state = DrainState::Idle;
                DrainProgress::AllClosed
            }
            Some(editor) => {
                tracing::debug!(editor = %editor, "requesting editor close");
                // State first: the registry may report the close before returning.
                self.state = DrainState::Waiting {
                    editor,
                    since: Instant::now(),
                    closed_so_far,
                    stall_reported: false,
                };
                editors.request_close_current();
                DrainProgress::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockEditors};

    fn id(s: &str) -> EditorId {
        EditorId(s.into())
    }

    #[test]
    fn no_editors_completes_immediately() {
        let (mut editors, journal) = MockEditors::new(&[]);
        let mut coordinator = ShutdownCoordinator::new();

        assert_eq!(coordinator.drain(&mut editors), DrainProgress::AllClosed);
        assert!(!coordinator.is_draining());
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn completes_after_exactly_n_round_trips() {
        for n in 0..5 {
            let names: Vec<String> = (0..n).map(|i| format!("e{i}")).collect();
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let (mut editors, journal) = MockEditors::new(&names);
            let mut coordinator = ShutdownCoordinator::new();

            let mut progress = coordinator.drain(&mut editors);
            let mut completions = 0;
            let mut all_closed = usize::from(progress == DrainProgress::AllClosed);
            while let Some(closed) = editors.complete_close() {
                assert_eq!(progress, DrainProgress::Pending);
                completions += 1;
                progress = coordinator.on_editor_closed(&mut editors, &closed);
                if progress == DrainProgress::AllClosed {
                    all_closed += 1;
                    assert_eq!(completions, n, "AllClosed before the last close");
                }
            }

            assert_eq!(all_closed, 1);
            assert_eq!(completions, n);
            assert_eq!(journal.count(|c| matches!(c, Call::RequestClose(_))), n);
        }
    }

    #[test]
    fn declined_close_stays_pending() {
        let (mut editors, _journal) = MockEditors::new(&["dirty"]);
        editors.decline(&id("dirty"));
        let mut coordinator = ShutdownCoordinator::new();

        assert_eq!(coordinator.drain(&mut editors), DrainProgress::Pending);
        assert_eq!(editors.complete_close(), None);
        assert!(coordinator.is_draining());
    }

    #[test]
    fn second_drain_joins_without_double_completion() {
        let (mut editors, journal) = MockEditors::new(&["a", "b"]);
        let mut coordinator = ShutdownCoordinator::new();

        assert_eq!(coordinator.drain(&mut editors), DrainProgress::Pending);
        assert_eq!(coordinator.drain(&mut editors), DrainProgress::Pending);

        let mut all_closed = 0;
        while let Some(closed) = editors.complete_close() {
            if coordinator.on_editor_closed(&mut editors, &closed) == DrainProgress::AllClosed {
                all_closed += 1;
            }
        }
        assert_eq!(all_closed, 1);
        // The join re-asked "a" but opened no second chain.
        assert_eq!(journal.count(|c| matches!(c, Call::RequestClose(_))), 3);
        assert_eq!(coordinator.on_editor_closed(&mut editors, &id("b")), DrainProgress::Idle);
    }

    #[test]
    fn join_reasks_declined_editor() {
        let (mut editors, journal) = MockEditors::new(&["dirty"]);
        editors.decline(&id("dirty"));
        let mut coordinator = ShutdownCoordinator::new();

        coordinator.drain(&mut editors);
        editors.accept(&id("dirty"));
        assert_eq!(coordinator.drain(&mut editors), DrainProgress::Pending);

        let closed = editors.complete_close().unwrap();
        assert_eq!(
            coordinator.on_editor_closed(&mut editors, &closed),
            DrainProgress::AllClosed
        );
        assert_eq!(journal.count(|c| matches!(c, Call::RequestClose(_))), 2);
    }

    #[test]
    fn join_reports_blocked_when_awaited_editor_lost_focus() {
        let (mut editors, journal) = MockEditors::new(&["dirty"]);
        editors.decline(&id("dirty"));
        let mut coordinator = ShutdownCoordinator::new();

        coordinator.drain(&mut editors);
        editors.open_front("fresh");
        assert_eq!(
            coordinator.drain(&mut editors),
            DrainProgress::Blocked {
                awaited: id("dirty")
            }
        );
        assert_eq!(journal.count(|c| matches!(c, Call::RequestClose(_))), 1);
        assert!(coordinator.is_draining());
    }

    #[test]
    fn stray_close_while_idle_is_ignored() {
        let (mut editors, journal) = MockEditors::new(&["a"]);
        let mut coordinator = ShutdownCoordinator::new();

        assert_eq!(coordinator.on_editor_closed(&mut editors, &id("a")), DrainProgress::Idle);
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn close_of_other_editor_does_not_reask() {
        let (mut editors, journal) = MockEditors::new(&["awaited", "other"]);
        editors.decline(&id("awaited"));
        let mut coordinator = ShutdownCoordinator::new();

        coordinator.drain(&mut editors);
        assert_eq!(
            coordinator.on_editor_closed(&mut editors, &id("other")),
            DrainProgress::Pending
        );
        assert_eq!(journal.count(|c| matches!(c, Call::RequestClose(_))), 1);
    }

    #[test]
    fn stall_reported_once_per_awaited_editor() {
        let (mut editors, _journal) = MockEditors::new(&["dirty"]);
        editors.decline(&id("dirty"));
        let mut coordinator = ShutdownCoordinator::new();
        let after = Duration::from_secs(3);

        assert_eq!(coordinator.take_stall(Instant::now(), after), None);
        coordinator.drain(&mut editors);
        assert_eq!(coordinator.take_stall(Instant::now(), after), None);

        let later = Instant::now() + Duration::from_secs(5);
        assert_eq!(coordinator.take_stall(later, after), Some(id("dirty")));
        assert_eq!(coordinator.take_stall(later, after), None);
    }
}
