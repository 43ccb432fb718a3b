// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::collections::HashMap;

use digest::{consts::U32, Digest};
use log::*;

use crate::{
    MerkleBranch,
    Node,
    NodeHash,
    NodeKey,
    NodeStore,
    RootSource,
    SharedUpdateLog,
    SmtConfig,
    SmtError,
    SparseMerkleTree,
    UpdateLogEntry,
    UpdateLogSource,
    ValueHash,
    ValueSource,
};

const LOG_TARGET: &str = "c::smt_sync::registry";

/// A status registry: a sparse Merkle tree whose every committed write is published to an update log.
///
/// Writers must present the current branch of the key they write. Each successful write appends
/// `(key, value, branch_after_write)` to the log, which is all a [`crate::ProofTracker`] needs to keep its own proof
/// current.
#[derive(Debug)]
pub struct StatusRegistry<D, S = HashMap<NodeHash, Node>> {
    tree: SparseMerkleTree<D, S>,
    log: SharedUpdateLog,
}

impl<D: Digest<OutputSize = U32>> StatusRegistry<D> {
    pub fn new(height: usize) -> Result<Self, SmtError> {
        Ok(Self::from_tree(SparseMerkleTree::new(height)?))
    }

    pub fn from_config(config: &SmtConfig) -> Result<Self, SmtError> {
        Ok(Self::from_tree(SparseMerkleTree::from_config(config)?))
    }
}

impl<D, S> StatusRegistry<D, S>
where
    D: Digest<OutputSize = U32>,
    S: NodeStore,
{
    /// Creates an empty registry on top of `store`.
    pub fn with_store(height: usize, store: S) -> Result<Self, SmtError> {
        Ok(Self::from_tree(SparseMerkleTree::with_store(height, store)?))
    }

    fn from_tree(tree: SparseMerkleTree<D, S>) -> Self {
        let log = SharedUpdateLog::new(*tree.root());
        Self { tree, log }
    }

    /// Sets `key` to `value`, provided `proof` is the key's current branch. Returns the branch after the write.
    pub fn set(&mut self, key: NodeKey, value: ValueHash, proof: &MerkleBranch) -> Result<MerkleBranch, SmtError> {
        let branch = self.tree.update(key.clone(), value, proof)?;
        let index = self
            .log
            .push(UpdateLogEntry::new(key, value, branch.clone()), *self.tree.root())?;
        debug!(target: LOG_TARGET, "Committed update #{} with root {}", index, self.tree.root());
        Ok(branch)
    }

    /// Sets `key` to `value` using the key's current branch, for callers that hold the full tree.
    pub fn set_current(&mut self, key: NodeKey, value: ValueHash) -> Result<MerkleBranch, SmtError> {
        let proof = self.tree.branch(&key)?;
        self.set(key, value, &proof)
    }

    pub fn status(&self, key: &NodeKey) -> Result<ValueHash, SmtError> {
        self.tree.get(key)
    }

    pub fn branch(&self, key: &NodeKey) -> Result<MerkleBranch, SmtError> {
        self.tree.branch(key)
    }

    pub fn root(&self) -> &NodeHash {
        self.tree.root()
    }

    pub fn height(&self) -> usize {
        self.tree.height()
    }

    pub fn tree(&self) -> &SparseMerkleTree<D, S> {
        &self.tree
    }

    /// A handle on the update log and the published root. Handles share the same entries and can be sent to other
    /// threads.
    pub fn log(&self) -> SharedUpdateLog {
        self.log.clone()
    }
}

impl<D, S> UpdateLogSource for StatusRegistry<D, S> {
    fn log_len(&self) -> Result<usize, SmtError> {
        self.log.log_len()
    }

    fn entries_from(&self, from: usize) -> Result<Vec<UpdateLogEntry>, SmtError> {
        self.log.entries_from(from)
    }
}

impl<D, S> RootSource for StatusRegistry<D, S>
where
    D: Digest<OutputSize = U32>,
    S: NodeStore,
{
    fn current_root(&self) -> Result<NodeHash, SmtError> {
        Ok(*self.tree.root())
    }
}

impl<D, S> ValueSource for StatusRegistry<D, S>
where
    D: Digest<OutputSize = U32>,
    S: NodeStore,
{
    fn authoritative_value(&self, key: &NodeKey) -> Result<Option<ValueHash>, SmtError> {
        self.tree.get(key).map(Some)
    }
}

#[cfg(test)]
mod test {
    use sha3::Keccak256;

    use super::*;

    fn key(v: u64) -> NodeKey {
        NodeKey::from_u64(v, 4).unwrap()
    }

    #[test]
    fn writes_are_logged() {
        let mut registry = StatusRegistry::<Keccak256>::new(4).unwrap();
        assert_eq!(registry.log_len().unwrap(), 0);
        let branch = registry.set_current(key(5), ValueHash::from([1u8; 32])).unwrap();
        registry.set_current(key(4), ValueHash::from([2u8; 32])).unwrap();
        let entries = registry.entries_from(0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], UpdateLogEntry::new(key(5), ValueHash::from([1u8; 32]), branch));
        assert_eq!(entries[1].key, key(4));
        assert_eq!(registry.status(&key(4)).unwrap(), ValueHash::from([2u8; 32]));
        assert_eq!(registry.current_root().unwrap(), *registry.root());
        assert_eq!(registry.log().current_root().unwrap(), *registry.root());
        assert_eq!(
            registry.authoritative_value(&key(5)).unwrap(),
            Some(ValueHash::from([1u8; 32]))
        );
    }

    #[test]
    fn rejected_writes_are_not_logged() {
        let mut registry = StatusRegistry::<Keccak256>::new(4).unwrap();
        let stale = registry.branch(&key(0)).unwrap();
        registry.set_current(key(1), ValueHash::from([1u8; 32])).unwrap();
        let root = *registry.root();
        let err = registry.set(key(0), ValueHash::from([2u8; 32]), &stale).unwrap_err();
        assert!(matches!(err, SmtError::ProofMismatch { .. }));
        assert_eq!(registry.root(), &root);
        assert_eq!(registry.log_len().unwrap(), 1);
        assert_eq!(registry.log().current_root().unwrap(), root);
    }

    #[test]
    fn log_publishes_the_initial_root() {
        let registry = StatusRegistry::<Keccak256>::new(4).unwrap();
        let snapshot = registry.log().snapshot_from(0).unwrap();
        assert!(snapshot.entries().is_empty());
        assert_eq!(snapshot.root(), registry.root());
    }
}
