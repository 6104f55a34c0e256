// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification and the pending change log.
//!
//! Observers see every successful write as a [`PropertyChange`]. The
//! [`ChangeLog`] keeps the ordered list of mutations a runtime has not seen
//! yet, along with the set of nodes the runtime already knows.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashSet;

use crate::id::{ModelId, PropertyId};
use crate::value::Value;

/// A successful property write, as delivered to observers.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    /// The written model.
    pub model: ModelId,
    /// The property name.
    pub property: String,
    /// The value read before the write (possibly the default).
    pub old: Value,
    /// The value now stored.
    pub new: Value,
}

/// Callback invoked for every [`PropertyChange`].
pub type ChangeCallback = Box<dyn Fn(&PropertyChange) + Send + Sync>;

/// Handle returned by [`Document::on_change`](crate::Document::on_change).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

#[derive(Default)]
pub(crate) struct Observers {
    next: u32,
    entries: Vec<(ObserverId, ChangeCallback)>,
}

impl Observers {
    pub(crate) fn add(&mut self, callback: ChangeCallback) -> ObserverId {
        let id = ObserverId(self.next);
        self.next += 1;
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Calls every observer in registration order.
    pub(crate) fn notify(&self, change: &PropertyChange) {
        for (_, callback) in &self.entries {
            callback(change);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// One recorded mutation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Change {
    Set {
        model: ModelId,
        property: PropertyId,
        value: Value,
    },
    AddRoot(ModelId),
    RemoveRoot(ModelId),
}

/// Pending mutations plus the sync state they are relative to.
#[derive(Clone, Debug, Default)]
pub(crate) struct ChangeLog {
    recording: bool,
    pending: Vec<Change>,
    /// Serials of nodes whose record the runtime has received.
    synced: HashSet<u64>,
}

impl ChangeLog {
    /// Turns recording on and resets the pending list and sync state.
    pub(crate) fn start(&mut self, synced: impl IntoIterator<Item = u64>) {
        self.recording = true;
        self.pending.clear();
        self.synced.clear();
        self.synced.extend(synced);
    }

    #[inline]
    pub(crate) fn is_recording(&self) -> bool {
        self.recording
    }

    /// Pauses or resumes recording, returning the previous state.
    pub(crate) fn set_recording(&mut self, recording: bool) -> bool {
        core::mem::replace(&mut self.recording, recording)
    }

    pub(crate) fn record(&mut self, change: Change) {
        if self.recording {
            self.pending.push(change);
        }
    }

    pub(crate) fn pending(&self) -> &[Change] {
        &self.pending
    }

    pub(crate) fn take(&mut self) -> Vec<Change> {
        core::mem::take(&mut self.pending)
    }

    pub(crate) fn is_synced(&self, serial: u64) -> bool {
        self.synced.contains(&serial)
    }

    pub(crate) fn synced(&self) -> impl Iterator<Item = u64> + '_ {
        self.synced.iter().copied()
    }

    pub(crate) fn mark_synced(&mut self, serial: u64) {
        self.synced.insert(serial);
    }

    /// Drops nodes that left the reachable closure from the sync state.
    pub(crate) fn forget(&mut self, serials: impl IntoIterator<Item = u64>) {
        for serial in serials {
            self.synced.remove(&serial);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::DocumentId;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn observers_are_called_until_removed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut observers = Observers::default();
        let counter = Arc::clone(&calls);
        let id = observers.add(Box::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        let doc = DocumentId::next();
        let change = PropertyChange {
            model: ModelId::new(doc, 1),
            property: "text".into(),
            old: Value::Null,
            new: Value::from("Unemployment"),
        };
        observers.notify(&change);
        assert!(observers.remove(id));
        assert!(!observers.remove(id));
        observers.notify(&change);

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(observers.is_empty());
    }

    #[test]
    fn log_records_only_while_recording() {
        let doc = DocumentId::next();
        let id = ModelId::new(doc, 1);
        let mut log = ChangeLog::default();

        log.record(Change::AddRoot(id));
        assert!(log.pending().is_empty());

        log.start([1, 2]);
        log.record(Change::AddRoot(id));
        log.record(Change::RemoveRoot(id));
        assert!(log.is_synced(2));
        assert_eq!(log.take().len(), 2);
        assert!(log.take().is_empty());

        log.forget([2]);
        assert!(!log.is_synced(2));
        assert!(log.is_synced(1));
    }
}
