// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Solana account derivation (Ed25519).

use ed25519_dalek::SigningKey;

use super::{account_seed, seed_array, Account, AccountError, Chain};
use crate::deriver::KeyMaterial;

/// Derive the Solana account bound to `material`.
pub fn solana_account(material: &KeyMaterial) -> Result<Account, AccountError> {
    let seed = account_seed(material)?;
    Ok(Account {
        chain: Chain::Solana,
        address: solana_address(seed.as_slice())?,
    })
}

/// Base58 public key for a 32-byte Ed25519 seed.
pub fn solana_address(seed: &[u8]) -> Result<String, AccountError> {
    let signing_key = SigningKey::from_bytes(seed_array(seed)?);
    Ok(bs58::encode(signing_key.verifying_key().as_bytes()).into_string())
}
