// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Incremental maintenance of a single key's value and branch from the update log.
//!
//! A tracker watching key `k` never needs the tree. For each logged write to another key `u`, let `i` be the depth at
//! which the paths of `k` and `u` split. The write only touched nodes on the path of `u`, and the only one of those
//! that is a sibling on the path of `k` is the node at depth `i + 1` on the side of `u`. So `branch[i]` is the one slot
//! that can change, and its new value is the hash of that node, which the tracker recomputes from the logged value and
//! branch of `u` by folding from the leaf up to depth `i + 1`. Slots above `i` hang off the shared part of the path
//! and slots below `i` lie inside the subtree of `k` that `u` never enters.
//!
//! A write to `k` itself replaces the cached value, and the logged branch is taken as the new cached branch.
//!
//! A checked read needs the log and the root published with it. A tracker that can also reach the tree checks its
//! value against the tree too; one that only sees a [`SharedUpdateLog`] reads through a [`crate::LogSnapshot`].

use std::marker::PhantomData;

use digest::{consts::U32, Digest};
use log::*;

use crate::{
    EmptySubtreeTable,
    MerkleBranch,
    NodeKey,
    RootSource,
    SharedUpdateLog,
    SmtError,
    UpdateLogEntry,
    UpdateLogSource,
    ValueHash,
    ValueSource,
};

const LOG_TARGET: &str = "c::smt_sync::tracker";

/// Keeps one key's value and branch current against an update log.
///
/// Each tracker owns its cached branch and its log cursor. Trackers never share sibling storage, and any number of
/// them may read the same log concurrently.
#[derive(Debug, Clone)]
pub struct ProofTracker<D> {
    key: NodeKey,
    value: ValueHash,
    branch: MerkleBranch,
    empty_branch: MerkleBranch,
    next_index: usize,
    _digest: PhantomData<D>,
}

impl<D: Digest<OutputSize = U32>> ProofTracker<D> {
    /// Creates a tracker for `key` in a tree of the given height, starting from the empty tree.
    pub fn new(key: NodeKey, height: usize) -> Result<Self, SmtError> {
        let empty = EmptySubtreeTable::<D>::new(height)?;
        Self::with_empty_branch(key, &empty.branch())
    }

    /// Creates a tracker for `key` from the tree's empty branch constant. The tracker keeps its own copy, and returns
    /// to it on [`ProofTracker::reset`].
    pub fn with_empty_branch(key: NodeKey, empty_branch: &MerkleBranch) -> Result<Self, SmtError> {
        if empty_branch.is_empty() {
            return Err(SmtError::InvalidTreeHeight { height: 0 });
        }
        key.validate(empty_branch.len())?;
        Ok(Self {
            key,
            value: ValueHash::default(),
            branch: empty_branch.clone(),
            empty_branch: empty_branch.clone(),
            next_index: 0,
            _digest: PhantomData,
        })
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn height(&self) -> usize {
        self.branch.len()
    }

    /// The cached value, as of the last sync. Use [`ProofTracker::status`] for a checked read.
    pub fn cached_value(&self) -> &ValueHash {
        &self.value
    }

    /// The cached branch, as of the last sync.
    pub fn branch(&self) -> &MerkleBranch {
        &self.branch
    }

    /// The index of the first log entry that has not been applied yet.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Folds one log entry into the cached value and branch. This does not move the log cursor.
    pub fn apply(&mut self, entry: &UpdateLogEntry) -> Result<(), SmtError> {
        let height = self.height();
        if entry.branch.len() != height {
            return Err(SmtError::InvalidBranchLength {
                expected: height,
                actual: entry.branch.len(),
            });
        }
        match self.key.divergence_depth(&entry.key, height)? {
            None => {
                trace!(
                    target: LOG_TARGET,
                    "Value of {} changed from {} to {}", self.key, self.value, entry.value
                );
                self.value = entry.value;
                self.branch = entry.branch.clone();
            },
            Some(depth) => {
                let hash = entry.branch.path_hash::<D>(&entry.key, &entry.value, depth + 1)?;
                trace!(
                    target: LOG_TARGET,
                    "Update to {} changes sibling {} of {} to {}", entry.key, depth, self.key, hash
                );
                self.branch.set(depth, hash);
            },
        }
        Ok(())
    }

    /// Applies every unread entry of `log`, in order, and returns the number applied.
    pub fn sync<L>(&mut self, log: &L) -> Result<usize, SmtError>
    where L: UpdateLogSource + ?Sized {
        let entries = log.entries_from(self.next_index)?;
        for entry in &entries {
            self.apply(entry)?;
            self.next_index += 1;
        }
        if !entries.is_empty() {
            debug!(
                target: LOG_TARGET,
                "Tracker for {} applied {} update(s), next index is {}",
                self.key,
                entries.len(),
                self.next_index
            );
        }
        Ok(entries.len())
    }

    /// Syncs, then returns the cached value once it has been checked against the source.
    ///
    /// The cached branch must reconstruct the source's current root, and if the source can answer for the key its
    /// value must equal the cached one. A failure of either check is a fault in the incremental update and is returned
    /// as [`SmtError::TrackerInconsistency`]. Retrying cannot repair it.
    pub fn status<S>(&mut self, source: &S) -> Result<ValueHash, SmtError>
    where S: UpdateLogSource + RootSource + ValueSource + ?Sized {
        self.sync(source)?;
        let root = source.current_root()?;
        let computed = self.branch.calculate_root::<D>(&self.key, &self.value)?;
        if computed != root {
            error!(
                target: LOG_TARGET,
                "Tracker for {} computes root {} but the published root is {}", self.key, computed, root
            );
            return Err(SmtError::TrackerInconsistency {
                key: self.key.clone(),
                details: format!("cached branch gives root {} but the published root is {}", computed, root),
            });
        }
        if let Some(value) = source.authoritative_value(&self.key)? {
            if value != self.value {
                error!(
                    target: LOG_TARGET,
                    "Tracker for {} holds value {} but the tree holds {}", self.key, self.value, value
                );
                return Err(SmtError::TrackerInconsistency {
                    key: self.key.clone(),
                    details: format!("cached value {} but the tree holds {}", self.value, value),
                });
            }
        }
        Ok(self.value)
    }

    /// A checked read for a tracker that only sees the log. The unread entries and the root published with them are
    /// taken in one step, and only the root check applies.
    pub fn status_from_log(&mut self, log: &SharedUpdateLog) -> Result<ValueHash, SmtError> {
        let snapshot = log.snapshot_from(self.next_index)?;
        self.status(&snapshot)
    }

    /// Drops all cached state, so that the next sync replays the log from the start.
    pub fn reset(&mut self) {
        self.value = ValueHash::default();
        self.branch = self.empty_branch.clone();
        self.next_index = 0;
    }
}
