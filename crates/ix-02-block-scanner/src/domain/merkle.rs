//! # Merkle Verifier
//!
//! Recomputes a block's transaction merkle root from its txids and compares it
//! to the header field.
//!
//! ALGORITHM: level by level, left to right. Each node is
//! `reverse(SHA256d(reverse(left) || reverse(right)))`; identifiers are kept in
//! display order throughout. An odd level pairs its last node with itself.

use shared_types::{hash256, reversed, Hash};

/// Header merkle field that is accepted whatever the transactions hash to.
///
/// Display order. This is the only entry in the allow-list.
pub const MERKLE_EXEMPT_ROOT: Hash = [
    0xda, 0x2b, 0x9e, 0xb7, 0xe8, 0xa3, 0x61, 0x97, 0x34, 0xa1, 0x7b, 0x55, 0xc4, 0x7b, 0xdd, 0x6f,
    0xd8, 0x55, 0xb0, 0xaf, 0xa9, 0xc7, 0xe1, 0x4e, 0x3a, 0x16, 0x4a, 0x27, 0x9e, 0x51, 0xbb, 0xa9,
];

/// Result of comparing a computed root against a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerkleCheck {
    /// Computed root equals the header field.
    Match,
    /// Header carries [`MERKLE_EXEMPT_ROOT`]; accepted without comparison.
    Exempt,
    /// Roots differ.
    Mismatch { expected: Hash, computed: Hash },
}

/// Parent of two display-order nodes.
pub fn hash_merkle_node(left: &Hash, right: &Hash) -> Hash {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&reversed(left));
    buf[32..].copy_from_slice(&reversed(right));
    reversed(&hash256(&buf))
}

/// Root over display-order txids. `None` for an empty list.
pub fn merkle_root(txids: &[Hash]) -> Option<Hash> {
    let mut level: Vec<Hash> = txids.to_vec();
    if level.is_empty() {
        return None;
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                hash_merkle_node(left, right)
            })
            .collect();
    }

    level.pop()
}

/// Compare the header's display-order merkle field with the txids.
pub fn verify(header_root: &Hash, txids: &[Hash]) -> MerkleCheck {
    let computed = merkle_root(txids).unwrap_or([0u8; 32]);
    if computed == *header_root {
        MerkleCheck::Match
    } else if *header_root == MERKLE_EXEMPT_ROOT {
        MerkleCheck::Exempt
    } else {
        MerkleCheck::Mismatch {
            expected: *header_root,
            computed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{parse_hash, to_hex};

    // Transactions of block 100000.
    const BLOCK_100000_TXIDS: [&str; 4] = [
        "8c14f0db3df150123e6f3dbbf30f8b955a8249b62ac1d1ff16284aefa3d06d87",
        "fff2525b8931402dd09222c50775608f75787bd2b87e56995a7bdd30f79702c4",
        "6359f0868171b1d194cbee1af2f16ea598ae8fad666d9b012c8ed2b79a236ec4",
        "e9a66845e05d5abc0ad04ec80f774a7e585c6e8db975962d069a522137b80c1d",
    ];

    fn txids() -> Vec<Hash> {
        BLOCK_100000_TXIDS
            .iter()
            .map(|s| parse_hash(s).unwrap())
            .collect()
    }

    #[test]
    fn test_single_txid_is_root() {
        let ids = txids();
        assert_eq!(merkle_root(&ids[..1]), Some(ids[0]));
    }

    #[test]
    fn test_empty_list_has_no_root() {
        assert_eq!(merkle_root(&[]), None);
    }

    #[test]
    fn test_block_100000_root() {
        let root = merkle_root(&txids()).unwrap();
        assert_eq!(
            to_hex(&root),
            "f3e94742aca4b5ef85488dc37c06c3282295ffec960994b2c0d5ac2a25a95766"
        );
    }

    #[test]
    fn test_even_list_matches_manual_pairing() {
        let ids = txids();
        let left = hash_merkle_node(&ids[0], &ids[1]);
        assert_eq!(
            to_hex(&left),
            "ccdafb73d8dcd0173d5d5c3c9a0770d0b3953db889dab99ef05b1907518cb815"
        );
        let right = hash_merkle_node(&ids[2], &ids[3]);
        assert_eq!(merkle_root(&ids), Some(hash_merkle_node(&left, &right)));
    }

    #[test]
    fn test_odd_list_duplicates_last() {
        let ids = txids();
        let three = &ids[..3];
        let expected = hash_merkle_node(
            &hash_merkle_node(&three[0], &three[1]),
            &hash_merkle_node(&three[2], &three[2]),
        );
        let root = merkle_root(three).unwrap();
        assert_eq!(root, expected);
        assert_eq!(
            to_hex(&root),
            "fa435470825de273081dcc706b25514c936fa6dc80ab965ce6970d68ddd0b553"
        );
    }

    #[test]
    fn test_verify_outcomes() {
        let ids = txids();
        let root = merkle_root(&ids).unwrap();
        assert_eq!(verify(&root, &ids), MerkleCheck::Match);

        let wrong = [0x42; 32];
        assert!(matches!(
            verify(&wrong, &ids),
            MerkleCheck::Mismatch { expected, computed } if expected == wrong && computed == root
        ));
    }

    #[test]
    fn test_exempt_root_is_accepted() {
        assert_eq!(
            to_hex(&MERKLE_EXEMPT_ROOT),
            "da2b9eb7e8a3619734a17b55c47bdd6fd855b0afa9c7e14e3a164a279e51bba9"
        );
        let check = verify(&MERKLE_EXEMPT_ROOT, &txids());
        assert_eq!(check, MerkleCheck::Exempt);

        // Only the literal is exempt, not its neighbours.
        let mut near = MERKLE_EXEMPT_ROOT;
        near[31] ^= 1;
        assert!(matches!(verify(&near, &txids()), MerkleCheck::Mismatch { .. }));
    }
}
