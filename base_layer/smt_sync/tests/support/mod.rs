// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use rand::{rngs::StdRng, Rng, SeedableRng};
use sha3::Keccak256;
use tari_smt_sync::{NodeKey, ProofTracker, StatusRegistry, ValueHash};

pub type TestRegistry = StatusRegistry<Keccak256>;
pub type TestTracker = ProofTracker<Keccak256>;

pub fn init_logging() {
    let _ = env_logger::try_init();
}

pub fn key(v: u64, height: usize) -> NodeKey {
    NodeKey::from_u64(v, height).unwrap()
}

pub fn value(v: u64) -> ValueHash {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&v.to_be_bytes());
    ValueHash::from(bytes)
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A random key for a tree of the given height
pub fn random_key<R: Rng>(rng: &mut R, height: usize) -> NodeKey {
    let mut bytes = vec![0u8; tari_smt_sync::key_length(height)];
    rng.fill(bytes.as_mut_slice());
    let unused_bits = bytes.len() * 8 - height;
    if unused_bits > 0 {
        bytes[0] &= 0xff >> unused_bits;
    }
    NodeKey::from(bytes)
}

pub fn random_value<R: Rng>(rng: &mut R) -> ValueHash {
    ValueHash::from(rng.gen::<[u8; 32]>())
}
