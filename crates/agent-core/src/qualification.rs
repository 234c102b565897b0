//! Qualification values and the staged/visible qualification buffer
//!
//! The provider announces the qualifications valid for a call inside the
//! "call connected" payload, but they must not be offered to the agent until
//! the call is answered. The buffer therefore keeps two sets: the *staged*
//! set captured at connect time and the *visible* set revealed at answer
//! time.
//!
//! The buffer also owns the post-call grace timer. When a call ends, the
//! session is not reset immediately - a late "answered" event may still be in
//! flight for a rapid answer-then-hangup sequence, and clearing right away
//! would drop a legitimate qualification opportunity. The timer is one-shot,
//! cancellable and re-armable; every re-arm bumps an epoch so that a stale
//! timer that already fired past its `abort()` cannot clear a newer call's
//! sets.

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Identifier of a qualification as issued by the provider
pub type QualificationId = i64;

/// A disposition code applied to an answered call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    /// Provider-issued qualification identifier
    pub id: QualificationId,
    /// Display name (e.g. "Sale", "No answer")
    pub name: String,
}

impl Qualification {
    /// Sentinel recorded when the provider reports a call as qualified
    /// without saying which qualification was applied
    pub fn unidentified() -> Self {
        Self {
            id: -1,
            name: "unidentified".to_string(),
        }
    }
}

/// Staged/visible qualification sets plus the grace-delay reset timer
#[derive(Debug, Default)]
pub struct QualificationBuffer {
    staged: Vec<Qualification>,
    visible: Vec<Qualification>,
    reset_epoch: u64,
    reset_task: Option<JoinHandle<()>>,
}

impl QualificationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the staged set with the one offered for a newly connected call
    pub fn stage(&mut self, set: Vec<Qualification>) {
        self.staged = set;
    }

    /// Copy the staged set into the visible set (the call was answered)
    pub fn reveal(&mut self) {
        self.visible = self.staged.clone();
    }

    /// Clear the visible set without touching the staged one
    pub fn hide(&mut self) {
        self.visible.clear();
    }

    /// Clear both sets
    pub fn clear(&mut self) {
        self.staged.clear();
        self.visible.clear();
    }

    /// The qualifications currently offered to the agent
    pub fn visible(&self) -> &[Qualification] {
        &self.visible
    }

    /// Look up a visible qualification by id
    pub fn find_visible(&self, id: QualificationId) -> Option<&Qualification> {
        self.visible.iter().find(|q| q.id == id)
    }

    /// Cancel a pending reset, if any. Bumps the epoch so a task that
    /// already fired but has not yet run to completion becomes a no-op.
    pub fn cancel_reset(&mut self) {
        self.reset_epoch = self.reset_epoch.wrapping_add(1);
        if let Some(task) = self.reset_task.take() {
            task.abort();
        }
    }

    /// Prepare to arm a new reset: cancels any pending one and returns the
    /// epoch the new timer task must carry
    pub fn begin_reset(&mut self) -> u64 {
        self.cancel_reset();
        self.reset_epoch
    }

    /// Install the spawned reset task produced for [`Self::begin_reset`]'s epoch
    pub fn install_reset(&mut self, task: JoinHandle<()>) {
        self.reset_task = Some(task);
    }

    /// Whether `epoch` still identifies the most recently armed reset
    pub fn is_current(&self, epoch: u64) -> bool {
        self.reset_epoch == epoch
    }

    /// Whether a reset timer is currently armed
    pub fn has_pending_reset(&self) -> bool {
        self.reset_task
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for QualificationBuffer {
    fn drop(&mut self) {
        if let Some(task) = self.reset_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quals() -> Vec<Qualification> {
        vec![
            Qualification {
                id: 1,
                name: "Sale".to_string(),
            },
            Qualification {
                id: 2,
                name: "NoAnswer".to_string(),
            },
        ]
    }

    #[test]
    fn staging_does_not_make_qualifications_visible() {
        let mut buffer = QualificationBuffer::new();
        buffer.stage(quals());
        assert!(buffer.visible().is_empty());

        buffer.reveal();
        assert_eq!(buffer.visible().len(), 2);
        assert_eq!(buffer.find_visible(1).unwrap().name, "Sale");
    }

    #[test]
    fn hide_keeps_the_staged_set() {
        let mut buffer = QualificationBuffer::new();
        buffer.stage(quals());
        buffer.reveal();
        buffer.hide();
        assert!(buffer.visible().is_empty());

        // a late answer can still reveal the same call's set
        buffer.reveal();
        assert_eq!(buffer.visible().len(), 2);
    }

    #[test]
    fn staging_a_new_call_replaces_the_old_set() {
        let mut buffer = QualificationBuffer::new();
        buffer.stage(quals());
        buffer.reveal();

        buffer.stage(vec![Qualification {
            id: 9,
            name: "Callback".to_string(),
        }]);
        buffer.reveal();
        assert_eq!(buffer.visible().len(), 1);
        assert!(buffer.find_visible(1).is_none());
    }

    #[tokio::test]
    async fn cancel_invalidates_the_armed_epoch() {
        let mut buffer = QualificationBuffer::new();
        let epoch = buffer.begin_reset();
        buffer.install_reset(tokio::spawn(async {}));
        assert!(buffer.is_current(epoch));

        buffer.cancel_reset();
        assert!(!buffer.is_current(epoch));
    }
}
