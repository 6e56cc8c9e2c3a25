//! Sorted-pair sha256 Merkle tree used to sign several chain-specific
//! digests with one signature.

use sha2::{Digest, Sha256};

fn hash_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

#[derive(Clone, Debug)]
pub struct MerkleTree {
    pub root: [u8; 32],
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree over pre-hashed leaves, padding each level by repeating its last node
    pub fn new(leaves: &[[u8; 32]]) -> Self {
        let Some(last) = leaves.last().copied() else {
            let root = [0u8; 32];
            return Self {
                root,
                levels: vec![vec![root]],
            };
        };

        let mut current = leaves.to_vec();
        let size = current.len().next_power_of_two();
        current.resize(size, last);

        let mut levels = vec![current.clone()];
        while current.len() > 1 {
            current = current
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], &pair[1]))
                .collect();
            levels.push(current.clone());
        }

        let root = current[0];
        Self { root, levels }
    }

    pub fn proof(&self, mut index: usize) -> Vec<[u8; 32]> {
        let mut proof = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = index ^ 1;
            if let Some(node) = level.get(sibling) {
                proof.push(*node);
            }
            index /= 2;
        }
        proof
    }

    pub fn levels(&self) -> usize {
        self.levels.len()
    }
}

pub fn verify_proof(leaf: &[u8; 32], proof: &[[u8; 32]], root: &[u8; 32]) -> bool {
    let computed = proof
        .iter()
        .fold(*leaf, |acc, node| hash_pair(&acc, node));
    &computed == root
}
