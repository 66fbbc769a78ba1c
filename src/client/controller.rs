//! Optimistic reorder state machine.
//!
//! Holds the list the user sees and the list the server last confirmed.
//! Drops mutate the displayed list immediately; the session decides when to
//! send it and feeds the outcome back in. Nothing here does I/O.

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::entity::Note;
use crate::order::plan_move;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderState {
    /// Displayed list equals the last confirmed server list.
    Idle,
    /// A local arrangement is applied and scheduled or in flight.
    Pending,
    /// A call failed; waiting for the authoritative list.
    Reconciling,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("reorder rejected while reconciling with the server")]
    Reconciling,

    #[error("no note at position {index} (list has {len})")]
    OutOfRange { index: usize, len: usize },
}

/// An arrangement handed to the network, tagged with the local revision it
/// was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub revision: u64,
    pub ids: Vec<Uuid>,
}

#[derive(Debug)]
pub struct ReorderController {
    state: ReorderState,
    displayed: Vec<Note>,
    confirmed: Vec<Note>,
    /// Bumped on every local drop.
    revision: u64,
    /// Highest revision handed out by `take_dispatch`.
    sent_revision: u64,
}

impl Default for ReorderController {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ReorderController {
    pub fn new(notes: Vec<Note>) -> Self {
        Self {
            state: ReorderState::Idle,
            displayed: notes.clone(),
            confirmed: notes,
            revision: 0,
            sent_revision: 0,
        }
    }

    pub fn state(&self) -> ReorderState {
        self.state
    }

    pub fn displayed(&self) -> &[Note] {
        &self.displayed
    }

    pub fn confirmed(&self) -> &[Note] {
        &self.confirmed
    }

    pub fn displayed_ids(&self) -> Vec<Uuid> {
        self.displayed.iter().map(|n| n.base.id).collect()
    }

    /// True when the displayed arrangement has changes not yet handed out.
    pub fn has_unsent(&self) -> bool {
        self.state == ReorderState::Pending && self.has_newer_drops()
    }

    /// Drops made after the last arrangement handed to the network.
    fn has_newer_drops(&self) -> bool {
        self.revision != self.sent_revision
    }

    /// Replace both lists with server truth and drop any local changes.
    pub fn reset(&mut self, notes: Vec<Note>) {
        self.displayed = notes.clone();
        self.confirmed = notes;
        self.sent_revision = self.revision;
        self.state = ReorderState::Idle;
    }

    /// Move the note at `from` so it ends up at `to` (clamped to the end).
    ///
    /// Returns whether the arrangement changed.
    pub fn apply_drop(&mut self, from: usize, to: usize) -> Result<bool, ControllerError> {
        if self.state == ReorderState::Reconciling {
            return Err(ControllerError::Reconciling);
        }
        let len = self.displayed.len();
        if from >= len {
            return Err(ControllerError::OutOfRange { index: from, len });
        }

        let to = to.min(len - 1);
        if from == to {
            return Ok(false);
        }

        let note = self.displayed.remove(from);
        self.displayed.insert(to, note);
        self.revision += 1;
        self.state = ReorderState::Pending;

        debug!(from, to, revision = self.revision, "Applied local reorder");
        Ok(true)
    }

    /// Hand out the current arrangement for sending, if there is anything new.
    pub fn take_dispatch(&mut self) -> Option<Dispatch> {
        if !self.has_unsent() {
            return None;
        }
        self.sent_revision = self.revision;
        Some(Dispatch {
            revision: self.revision,
            ids: self.displayed_ids(),
        })
    }

    /// The server accepted `dispatch` and returned its list in the new order.
    pub fn on_success(&mut self, dispatch: &Dispatch, server_notes: Vec<Note>) {
        if self.state == ReorderState::Reconciling {
            return;
        }
        self.confirmed = server_notes;

        if dispatch.revision == self.revision {
            self.displayed = self.confirmed.clone();
            self.state = ReorderState::Idle;
        } else {
            // A newer drop is waiting for its own dispatch.
            debug!(
                sent = dispatch.revision,
                latest = self.revision,
                "Accepted older arrangement, newer one still pending"
            );
        }
    }

    /// The server rejected or never received the arrangement. The caller must
    /// refetch and report back through `on_refetched` / `on_refetch_failed`.
    pub fn on_failure(&mut self) {
        self.state = ReorderState::Reconciling;
    }

    /// Take the server list as truth. Drops made after the failed
    /// arrangement are kept on top of it and stay `Pending` for their own
    /// dispatch.
    pub fn on_refetched(&mut self, server_notes: Vec<Note>) {
        if !self.has_newer_drops() {
            self.reset(server_notes);
            return;
        }

        self.displayed = rebase(&self.displayed, &server_notes);
        self.confirmed = server_notes;
        self.state = ReorderState::Pending;
        debug!(
            revision = self.revision,
            notes = self.displayed.len(),
            "Kept newer arrangement over refetched list"
        );
    }

    /// Refetch failed too: fall back to the last list the server confirmed,
    /// unless newer drops are still waiting to be sent.
    pub fn on_refetch_failed(&mut self) {
        if self.has_newer_drops() {
            self.state = ReorderState::Pending;
            return;
        }
        let confirmed = self.confirmed.clone();
        self.reset(confirmed);
    }

    /// A single-note move was accepted. Mirror its range shift onto the
    /// confirmed list so a failed refetch never restores the pre-move order.
    pub fn on_moved(&mut self, moved: &Note) {
        let Some(old) = self
            .confirmed
            .iter()
            .find(|n| n.base.id == moved.base.id)
            .map(|n| n.order)
        else {
            return;
        };

        let plan = plan_move(old, moved.order, i64::MAX);
        for note in &mut self.confirmed {
            if note.base.id == moved.base.id {
                *note = moved.clone();
            } else if let Some(shift) = &plan.shift {
                note.order = shift.apply(note.order);
            }
        }
        self.confirmed.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then(b.base.created_at.cmp(&a.base.created_at))
        });

        if !self.has_newer_drops() {
            self.displayed = self.confirmed.clone();
        }
    }
}

/// `local`'s order applied to the notes in `server`. Notes the server no
/// longer has are dropped; notes only the server has keep their server
/// position.
fn rebase(local: &[Note], server: &[Note]) -> Vec<Note> {
    let mut kept: Vec<Note> = local
        .iter()
        .filter_map(|l| server.iter().find(|s| s.base.id == l.base.id).cloned())
        .collect();

    for (index, note) in server.iter().enumerate() {
        if !local.iter().any(|l| l.base.id == note.base.id) {
            kept.insert(index.min(kept.len()), note.clone());
        }
    }
    kept
}
