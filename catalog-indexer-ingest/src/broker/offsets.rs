//! Contiguous offset commit tracking.
//!
//! Deliveries from one partition complete in arbitrary order because the
//! consumer handles up to the in-flight limit concurrently. Committing each
//! delivery's own offset as it finishes would let a later offset's commit
//! land while an earlier delivery is still outstanding or was returned to
//! the queue; a restart would then resume past the unresolved message. The
//! tracker only ever advances the durable position over a contiguous prefix
//! of completed offsets, so an outstanding delivery pins every commit at or
//! beyond it until it resolves.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

#[derive(Default)]
struct PartitionState {
    /// Offsets handed out and not yet completed.
    in_flight: BTreeSet<i64>,
    /// Completed offsets not yet covered by a commit.
    completed: BTreeSet<i64>,
    /// The committed position (next offset to read), once advanced.
    committed: Option<i64>,
}

/// Per-partition low-watermark tracker for commit positions.
#[derive(Default)]
pub struct OffsetTracker {
    partitions: Mutex<HashMap<(String, i32), PartitionState>>,
}

impl OffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delivery handed out by the broker. Redeliveries of an
    /// already-tracked offset are idempotent.
    pub fn delivered(&self, topic: &str, partition: i32, offset: i64) {
        let mut partitions = self.partitions.lock().unwrap();
        let state = partitions
            .entry((topic.to_string(), partition))
            .or_default();

        // A rebalance can replay offsets the group already committed past
        if state.committed.map_or(false, |committed| offset < committed) {
            return;
        }
        state.in_flight.insert(offset);
    }

    /// Mark a delivery completed and return the new commit position if it
    /// advanced.
    ///
    /// The position moves to just past the contiguous prefix of completed
    /// offsets; while an earlier offset is still in flight, completion is
    /// recorded but `None` is returned and no commit must be issued.
    pub fn completed(&self, topic: &str, partition: i32, offset: i64) -> Option<i64> {
        let mut partitions = self.partitions.lock().unwrap();
        let state = partitions.get_mut(&(topic.to_string(), partition))?;

        state.in_flight.remove(&offset);
        state.completed.insert(offset);

        // Everything completed below the lowest in-flight offset is safe
        let floor = state
            .in_flight
            .iter()
            .next()
            .copied()
            .unwrap_or(i64::MAX);

        let mut highest = None;
        while let Some(&lowest) = state.completed.iter().next() {
            if lowest >= floor {
                break;
            }
            state.completed.remove(&lowest);
            highest = Some(lowest);
        }

        let next = highest? + 1;
        if state.committed.map_or(true, |committed| next > committed) {
            state.committed = Some(next);
            Some(next)
        } else {
            None
        }
    }
}
