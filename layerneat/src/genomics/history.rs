use crate::{Innovation, NodeId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Next innovation number to hand out. Shared by every
/// ledger in the process, so populations living side by
/// side never reuse a number for different edges.
static NEXT_INNOVATION: AtomicUsize = AtomicUsize::new(1);

/// One recorded structural edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub from: NodeId,
    pub to: NodeId,
    pub innovation: Innovation,
}

/// An `InnovationLedger` keeps track of the connections
/// created in a population, in order to make sure identical
/// structural mutations are assigned the same innovation numbers.
///
/// Connections are identified by their `(from, to)` endpoints.
/// Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct InnovationLedger {
    entries: Vec<LedgerEntry>,
    index: HashMap<(NodeId, NodeId), Innovation, RandomState>,
}

impl InnovationLedger {
    /// Creates an empty ledger.
    pub fn new() -> InnovationLedger {
        InnovationLedger::default()
    }

    /// Returns the innovation number of the `from -> to` edge,
    /// allocating and recording a new one the first time the
    /// edge is seen.
    ///
    /// # Examples
    /// ```
    /// use layerneat::genomics::InnovationLedger;
    ///
    /// let mut ledger = InnovationLedger::new();
    /// let first = ledger.innovation_for(3, 7);
    ///
    /// assert_eq!(ledger.innovation_for(3, 7), first);
    /// assert!(ledger.innovation_for(7, 3) > first);
    /// ```
    pub fn innovation_for(&mut self, from: NodeId, to: NodeId) -> Innovation {
        match self.index.entry((from, to)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let innovation = NEXT_INNOVATION.fetch_add(1, Ordering::SeqCst);
                entry.insert(innovation);
                self.entries.push(LedgerEntry {
                    from,
                    to,
                    innovation,
                });
                innovation
            }
        }
    }

    /// Records an edge with an already-assigned innovation number,
    /// as found in a snapshot. The process-wide counter is advanced
    /// past `innovation`.
    ///
    /// Returns `false` if the edge was already recorded with a
    /// different number, in which case the earlier record is kept.
    pub(crate) fn record(&mut self, from: NodeId, to: NodeId, innovation: Innovation) -> bool {
        NEXT_INNOVATION.fetch_max(innovation + 1, Ordering::SeqCst);
        match self.index.entry((from, to)) {
            Entry::Occupied(entry) => {
                if *entry.get() != innovation {
                    log::warn!(
                        "innovation ledger conflict: edge {} -> {} is {} but snapshot says {}",
                        from,
                        to,
                        entry.get(),
                        innovation
                    );
                    false
                } else {
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(innovation);
                self.entries.push(LedgerEntry {
                    from,
                    to,
                    innovation,
                });
                true
            }
        }
    }

    /// Returns the recorded edges in the order they were first seen.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
