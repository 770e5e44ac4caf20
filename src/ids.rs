//! Identifier assignment for new aggregate roots.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::models::LegoSet;

/// Monotonic id counter shared by everything that creates roots.
///
/// Starts at 0; [`IdSequence::next_id`] pre-increments, so the first id is 1.
#[derive(Debug, Default)]
pub struct IdSequence {
    current: AtomicI64,
}

impl IdSequence {
    pub const fn new() -> Self {
        Self {
            current: AtomicI64::new(0),
        }
    }

    pub fn next_id(&self) -> i64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last id handed out, 0 if none.
    pub fn current(&self) -> i64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Moves the counter forward to at least `id`. Never moves it back.
    pub fn advance_to(&self, id: i64) {
        self.current.fetch_max(id, Ordering::SeqCst);
    }
}

/// Gives a new [`LegoSet`] its id and copies it onto the manual.
#[derive(Debug, Clone, Default)]
pub struct IdAssigner {
    sequence: Arc<IdSequence>,
}

impl IdAssigner {
    pub fn new(sequence: Arc<IdSequence>) -> Self {
        Self { sequence }
    }

    pub fn sequence(&self) -> &Arc<IdSequence> {
        &self.sequence
    }

    /// Assigns an id if the set has none. Returns whether one was assigned.
    ///
    /// A manual present at assignment time receives the same id. A manual
    /// attached after the first save does not; call [`IdAssigner::propagate`]
    /// for that case.
    pub fn assign(&self, set: &mut LegoSet) -> bool {
        if !set.is_new() {
            return false;
        }
        set.id = self.sequence.next_id();
        self.propagate(set);
        true
    }

    pub fn propagate(&self, set: &mut LegoSet) {
        if let Some(manual) = set.manual.as_mut() {
            manual.id = set.id;
        }
    }
}
