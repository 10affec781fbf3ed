//! In-order reassembly of out-of-order segment payloads.

use std::collections::BTreeMap;

/// Payloads that arrived ahead of the write cursor.
///
/// Owned by the collector only. Holds at most (workers − 1) entries in
/// practice, since that many fetches can finish ahead of the cursor.
#[derive(Debug)]
pub(super) struct ReassemblyBuffer {
    pending: BTreeMap<u64, Vec<u8>>,
    next: u64,
}

impl ReassemblyBuffer {
    pub(super) fn new(start: u64) -> Self {
        Self {
            pending: BTreeMap::new(),
            next: start,
        }
    }

    pub(super) fn insert(&mut self, index: u64, payload: Vec<u8>) {
        debug_assert!(index >= self.next, "segment {index} already written");
        debug_assert!(!self.pending.contains_key(&index), "segment {index} received twice");
        self.pending.insert(index, payload);
    }

    /// Takes the payload at the cursor, if present, and advances the cursor.
    pub(super) fn pop_next(&mut self) -> Option<(u64, Vec<u8>)> {
        let payload = self.pending.remove(&self.next)?;
        let index = self.next;
        self.next += 1;
        Some((index, payload))
    }

    pub(super) fn next_expected(&self) -> u64 {
        self.next
    }

    pub(super) fn len(&self) -> usize {
        self.pending.len()
    }
}
