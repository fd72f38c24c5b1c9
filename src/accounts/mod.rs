// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account derivation from TEE key material.
//!
//! Pure functions mapping derived key material to public chain identities:
//! - Ethereum: secp256k1 scalar → Keccak-256 of the public point → EIP-55
//! - Solana: Ed25519 seed → base58 public key
//!
//! The 32-byte scalar/seed is SHA-256 over the full decoded key, so the
//! whole derived key contributes to the account rather than a prefix of it.

pub mod ethereum;
pub mod solana;

use serde::Serialize;
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::deriver::KeyMaterial;

pub use ethereum::{ethereum_account, ethereum_address};
pub use solana::{solana_account, solana_address};

/// Size of a secp256k1 scalar and of an Ed25519 seed.
pub const SEED_LEN: usize = 32;

/// Account derivation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("Malformed key material: expected {expected} bytes, got {actual}")]
    MalformedKeyMaterial { expected: usize, actual: usize },

    #[error("Malformed key material: {0}")]
    InvalidScalar(String),
}

/// Chain an [`Account`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Solana,
}

/// Public identity derived from key material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct Account {
    pub chain: Chain,
    pub address: String,
}

/// Compress key material into the 32-byte scalar/seed used by both chains.
pub fn account_seed(material: &KeyMaterial) -> Result<Zeroizing<[u8; SEED_LEN]>, AccountError> {
    let bytes = material.as_bytes();
    if bytes.is_empty() {
        return Err(AccountError::MalformedKeyMaterial {
            expected: SEED_LEN,
            actual: 0,
        });
    }

    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    seed.copy_from_slice(&Sha256::digest(bytes));
    Ok(seed)
}

/// Check a scalar/seed slice has the expected length.
fn seed_array(seed: &[u8]) -> Result<&[u8; SEED_LEN], AccountError> {
    seed.try_into()
        .map_err(|_| AccountError::MalformedKeyMaterial {
            expected: SEED_LEN,
            actual: seed.len(),
        })
}
