// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::collections::HashMap;

use crate::{Node, NodeHash, SmtError};

/// A content-addressed node store, mapping a node hash to the node itself.
///
/// Stores are append-only. A node is never overwritten once written: inserting a hash that is already present leaves
/// the existing entry in place.
pub trait NodeStore {
    type Error: std::error::Error;

    /// Returns the number of nodes held in the store
    fn len(&self) -> Result<usize, Self::Error>;

    fn is_empty(&self) -> Result<bool, Self::Error> {
        Ok(self.len()? == 0)
    }

    /// Return the node with the given hash, if it has been stored
    fn get(&self, hash: &NodeHash) -> Result<Option<Node>, Self::Error>;

    /// Store a node under its hash. Returns `true` if the node was not already present.
    fn insert(&mut self, hash: NodeHash, node: Node) -> Result<bool, Self::Error>;

    fn contains(&self, hash: &NodeHash) -> Result<bool, Self::Error> {
        Ok(self.get(hash)?.is_some())
    }
}

impl NodeStore for HashMap<NodeHash, Node> {
    type Error = SmtError;

    fn len(&self) -> Result<usize, Self::Error> {
        Ok(HashMap::len(self))
    }

    fn get(&self, hash: &NodeHash) -> Result<Option<Node>, Self::Error> {
        Ok(HashMap::get(self, hash).copied())
    }

    fn insert(&mut self, hash: NodeHash, node: Node) -> Result<bool, Self::Error> {
        if HashMap::contains_key(self, &hash) {
            return Ok(false);
        }
        HashMap::insert(self, hash, node);
        Ok(true)
    }
}

/// An opaque key-to-bytes map, as a persistence layer would hold it. Nodes are kept in their serialized form.
impl NodeStore for HashMap<NodeHash, Vec<u8>> {
    type Error = SmtError;

    fn len(&self) -> Result<usize, Self::Error> {
        Ok(HashMap::len(self))
    }

    fn get(&self, hash: &NodeHash) -> Result<Option<Node>, Self::Error> {
        HashMap::get(self, hash).map(|bytes| Node::from_bytes(bytes)).transpose()
    }

    fn insert(&mut self, hash: NodeHash, node: Node) -> Result<bool, Self::Error> {
        if HashMap::contains_key(self, &hash) {
            return Ok(false);
        }
        HashMap::insert(self, hash, node.to_bytes());
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ValueHash;

    #[test]
    fn insert_never_overwrites() {
        let mut store = HashMap::<NodeHash, Node>::new();
        let hash = NodeHash::from([1u8; 32]);
        let first = Node::Leaf(ValueHash::from([1u8; 32]));
        let second = Node::Leaf(ValueHash::from([2u8; 32]));
        assert!(NodeStore::is_empty(&store).unwrap());
        assert!(NodeStore::insert(&mut store, hash, first).unwrap());
        assert!(!NodeStore::insert(&mut store, hash, second).unwrap());
        assert_eq!(NodeStore::get(&store, &hash).unwrap(), Some(first));
        assert_eq!(NodeStore::len(&store).unwrap(), 1);
    }

    #[test]
    fn byte_store_decodes_nodes() {
        let mut store = HashMap::<NodeHash, Vec<u8>>::new();
        let hash = NodeHash::from([1u8; 32]);
        let node = Node::Branch {
            left: NodeHash::from([2u8; 32]),
            right: NodeHash::from([3u8; 32]),
        };
        NodeStore::insert(&mut store, hash, node).unwrap();
        assert_eq!(HashMap::get(&store, &hash).map(Vec::len), Some(64));
        assert_eq!(NodeStore::get(&store, &hash).unwrap(), Some(node));
        assert!(NodeStore::contains(&store, &hash).unwrap());
        assert!(!NodeStore::contains(&store, &NodeHash::zero()).unwrap());

        HashMap::insert(&mut store, NodeHash::zero(), vec![0u8; 3]);
        assert!(matches!(
            NodeStore::get(&store, &NodeHash::zero()),
            Err(SmtError::InvalidNodeEncoding(_))
        ));
    }
}
