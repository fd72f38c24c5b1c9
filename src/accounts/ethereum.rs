// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ethereum account derivation (secp256k1).

use alloy::primitives::{keccak256, Address};
use k256::ecdsa::SigningKey;

use super::{account_seed, seed_array, Account, AccountError, Chain};
use crate::deriver::KeyMaterial;

/// Derive the Ethereum account bound to `material`.
pub fn ethereum_account(material: &KeyMaterial) -> Result<Account, AccountError> {
    let scalar = account_seed(material)?;
    Ok(Account {
        chain: Chain::Ethereum,
        address: ethereum_address(scalar.as_slice())?,
    })
}

/// EIP-55 checksummed address for a 32-byte secp256k1 private scalar.
pub fn ethereum_address(scalar: &[u8]) -> Result<String, AccountError> {
    let scalar = seed_array(scalar)?;
    let signing_key = SigningKey::from_bytes(&(*scalar).into())
        .map_err(|_| AccountError::InvalidScalar("not a valid secp256k1 scalar".to_string()))?;

    let public_key = signing_key.verifying_key().to_encoded_point(false);
    // Skip the 0x04 SEC1 tag; the address is the low 20 bytes of the hash.
    let hash = keccak256(&public_key.as_bytes()[1..]);
    let address = Address::from_slice(&hash[12..]);

    Ok(address.to_checksum(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(last: u8) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[31] = last;
        bytes
    }

    #[test]
    fn scalar_one_matches_known_address() {
        let address = ethereum_address(&scalar(1)).unwrap();
        assert_eq!(address, "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }

    #[test]
    fn address_is_checksummed_hex() {
        let material = KeyMaterial::new("test", "", vec![], b"some derived key".to_vec());
        let account = ethereum_account(&material).unwrap();

        assert_eq!(account.chain, Chain::Ethereum);
        assert_eq!(account.address.len(), 42);
        assert!(account.address.starts_with("0x"));
        assert!(account.address[2..].chars().all(|c| c.is_ascii_hexdigit()));
        assert!(Address::parse_checksummed(&account.address, None).is_ok());
    }

    #[test]
    fn derivation_is_deterministic() {
        let material = KeyMaterial::new("test", "", vec![], vec![9u8; 121]);
        let first = ethereum_account(&material).unwrap();
        for _ in 0..8 {
            assert_eq!(ethereum_account(&material).unwrap(), first);
        }
    }

    #[test]
    fn distinct_material_gives_distinct_addresses() {
        let a = KeyMaterial::new("a", "", vec![], vec![1u8; 32]);
        let b = KeyMaterial::new("b", "", vec![], vec![2u8; 32]);
        assert_ne!(
            ethereum_account(&a).unwrap().address,
            ethereum_account(&b).unwrap().address
        );
    }

    #[test]
    fn zero_scalar_is_rejected() {
        assert!(matches!(
            ethereum_address(&[0u8; 32]),
            Err(AccountError::InvalidScalar(_))
        ));
    }

    #[test]
    fn short_scalar_is_rejected() {
        assert_eq!(
            ethereum_address(&[1u8; 20]).unwrap_err(),
            AccountError::MalformedKeyMaterial {
                expected: 32,
                actual: 20
            }
        );
    }
}
