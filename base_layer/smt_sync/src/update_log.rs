// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::{Arc, RwLock};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{MerkleBranch, NodeHash, NodeKey, SmtError, ValueHash};

/// One committed write: the key, its new value and its branch after the write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UpdateLogEntry {
    pub key: NodeKey,
    pub value: ValueHash,
    pub branch: MerkleBranch,
}

impl UpdateLogEntry {
    pub fn new(key: NodeKey, value: ValueHash, branch: MerkleBranch) -> Self {
        Self { key, value, branch }
    }
}

/// An ordered, append-only sequence of committed writes that only ever grows.
pub trait UpdateLogSource {
    /// The number of entries committed so far
    fn log_len(&self) -> Result<usize, SmtError>;

    /// Every entry from index `from` onwards, in commit order. Returns an empty list if `from` is at or past the end.
    fn entries_from(&self, from: usize) -> Result<Vec<UpdateLogEntry>, SmtError>;
}

/// Returns the authoritative current root. The root reflects every entry in the matching [`UpdateLogSource`].
pub trait RootSource {
    fn current_root(&self) -> Result<NodeHash, SmtError>;
}

/// An authoritative source for the value held at a key. Observers that only see the log have no such source, and
/// answer `None`.
pub trait ValueSource {
    fn authoritative_value(&self, key: &NodeKey) -> Result<Option<ValueHash>, SmtError>;
}

impl UpdateLogSource for [UpdateLogEntry] {
    fn log_len(&self) -> Result<usize, SmtError> {
        Ok(self.len())
    }

    fn entries_from(&self, from: usize) -> Result<Vec<UpdateLogEntry>, SmtError> {
        Ok(self.get(from..).map(<[_]>::to_vec).unwrap_or_default())
    }
}

impl UpdateLogSource for Vec<UpdateLogEntry> {
    fn log_len(&self) -> Result<usize, SmtError> {
        self.as_slice().log_len()
    }

    fn entries_from(&self, from: usize) -> Result<Vec<UpdateLogEntry>, SmtError> {
        self.as_slice().entries_from(from)
    }
}

#[derive(Debug)]
struct LogState {
    entries: Vec<UpdateLogEntry>,
    root: NodeHash,
}

/// SharedUpdateLog is a shareable, memory only, append-only log, together with the root published by its writer.
/// Clones share the same entries, so one writer can append while any number of readers on other threads read from
/// their own cursor.
///
/// An entry and the root after it are published together. Use [`SharedUpdateLog::snapshot_from`] to read entries and
/// the root that reflects them in one step.
#[derive(Debug, Clone)]
pub struct SharedUpdateLog {
    state: Arc<RwLock<LogState>>,
}

impl SharedUpdateLog {
    /// Creates an empty log for a tree whose root is currently `initial_root`.
    pub fn new(initial_root: NodeHash) -> Self {
        Self {
            state: Arc::new(RwLock::new(LogState {
                entries: Vec::new(),
                root: initial_root,
            })),
        }
    }

    /// Appends an entry along with the root after that write, and returns the entry's index.
    pub fn push(&self, entry: UpdateLogEntry, root: NodeHash) -> Result<usize, SmtError> {
        let mut state = self.state.write().map_err(|e| SmtError::StoreError(e.to_string()))?;
        state.entries.push(entry);
        state.root = root;
        Ok(state.entries.len() - 1)
    }

    pub fn get(&self, index: usize) -> Result<Option<UpdateLogEntry>, SmtError> {
        Ok(self
            .state
            .read()
            .map_err(|e| SmtError::StoreError(e.to_string()))?
            .entries
            .get(index)
            .cloned())
    }

    pub fn is_empty(&self) -> Result<bool, SmtError> {
        Ok(self.log_len()? == 0)
    }

    /// Every entry from index `from` onwards and the root that reflects them, read under one lock.
    pub fn snapshot_from(&self, from: usize) -> Result<LogSnapshot, SmtError> {
        let state = self.state.read().map_err(|e| SmtError::StoreError(e.to_string()))?;
        let offset = from.min(state.entries.len());
        Ok(LogSnapshot {
            offset,
            entries: state.entries[offset..].to_vec(),
            root: state.root,
        })
    }
}

impl UpdateLogSource for SharedUpdateLog {
    fn log_len(&self) -> Result<usize, SmtError> {
        Ok(self
            .state
            .read()
            .map_err(|e| SmtError::StoreError(e.to_string()))?
            .entries
            .len())
    }

    fn entries_from(&self, from: usize) -> Result<Vec<UpdateLogEntry>, SmtError> {
        self.state
            .read()
            .map_err(|e| SmtError::StoreError(e.to_string()))?
            .entries
            .as_slice()
            .entries_from(from)
    }
}

impl RootSource for SharedUpdateLog {
    fn current_root(&self) -> Result<NodeHash, SmtError> {
        Ok(self.state.read().map_err(|e| SmtError::StoreError(e.to_string()))?.root)
    }
}

/// The tail of an update log from index `offset`, with the root published after its last entry.
///
/// This is everything an observer without access to the tree needs for a checked read. It has no authoritative
/// values, so the value cross-check is skipped and the root check stands alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LogSnapshot {
    offset: usize,
    entries: Vec<UpdateLogEntry>,
    root: NodeHash,
}

impl LogSnapshot {
    pub fn new(offset: usize, entries: Vec<UpdateLogEntry>, root: NodeHash) -> Self {
        Self { offset, entries, root }
    }

    /// The log index of the first entry held
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn entries(&self) -> &[UpdateLogEntry] {
        &self.entries
    }

    pub fn root(&self) -> &NodeHash {
        &self.root
    }
}

impl UpdateLogSource for LogSnapshot {
    fn log_len(&self) -> Result<usize, SmtError> {
        Ok(self.offset + self.entries.len())
    }

    fn entries_from(&self, from: usize) -> Result<Vec<UpdateLogEntry>, SmtError> {
        if from < self.offset {
            return Err(SmtError::LogIndexUnavailable {
                requested: from,
                first: self.offset,
            });
        }
        self.entries.entries_from(from - self.offset)
    }
}

impl RootSource for LogSnapshot {
    fn current_root(&self) -> Result<NodeHash, SmtError> {
        Ok(self.root)
    }
}

impl ValueSource for LogSnapshot {
    fn authoritative_value(&self, _key: &NodeKey) -> Result<Option<ValueHash>, SmtError> {
        Ok(None)
    }
}
