// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key material derivation adapter.
//!
//! Thin wrapper over [`AttestationBackend::derive_key`]: applies the default
//! path, decodes the returned PEM and hands back [`KeyMaterial`]. There is no
//! retry here; a failed call is reported to the caller immediately.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::tappd::{AttestationBackend, TappdError};

/// Path used when the request does not name one.
pub const DEFAULT_KEY_PATH: &str = "dstack";

/// Raw key material derived for a path.
///
/// Buffers are wiped on drop; `Debug` never prints secret bytes.
pub struct KeyMaterial {
    path: String,
    pem: Zeroizing<String>,
    certificate_chain: Vec<String>,
    bytes: Zeroizing<Vec<u8>>,
}

impl KeyMaterial {
    pub fn new(
        path: impl Into<String>,
        pem: impl Into<String>,
        certificate_chain: Vec<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            path: path.into(),
            pem: Zeroizing::new(pem.into()),
            certificate_chain,
            bytes: Zeroizing::new(bytes),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// DER bytes of the derived private key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Record returned by the key endpoints.
    pub fn to_record(&self) -> KeyRecord {
        KeyRecord {
            key: self.pem.as_str().to_owned(),
            certificate_chain: self.certificate_chain.clone(),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("path", &self.path)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Key endpoint response body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct KeyRecord {
    /// PEM-encoded derived private key.
    pub key: String,
    /// Certificate chain binding the key to this app.
    pub certificate_chain: Vec<String>,
}

/// Derives [`KeyMaterial`] through the shared attestation backend.
#[derive(Clone)]
pub struct KeyDeriver {
    backend: Arc<dyn AttestationBackend>,
}

impl KeyDeriver {
    pub fn new(backend: Arc<dyn AttestationBackend>) -> Self {
        Self { backend }
    }

    /// Derive key material for `path`, or [`DEFAULT_KEY_PATH`] when absent.
    pub async fn derive(&self, path: Option<&str>) -> Result<KeyMaterial, TappdError> {
        let path = path.unwrap_or(DEFAULT_KEY_PATH);
        let response = self.backend.derive_key(path).await?;
        let bytes = response.decode_key()?;

        Ok(KeyMaterial::new(
            path,
            response.key.as_str(),
            response.certificate_chain.clone(),
            bytes.to_vec(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingBackend, StubBackend};

    #[tokio::test]
    async fn absent_path_uses_default() {
        let backend = Arc::new(StubBackend::default());
        let deriver = KeyDeriver::new(backend.clone());

        let material = deriver.derive(None).await.expect("derive succeeds");
        assert_eq!(material.path(), DEFAULT_KEY_PATH);
        assert_eq!(backend.derived_paths(), vec![DEFAULT_KEY_PATH.to_string()]);
        assert!(!material.as_bytes().is_empty());
    }

    #[tokio::test]
    async fn explicit_path_is_passed_through_unchanged() {
        let backend = Arc::new(StubBackend::default());
        let deriver = KeyDeriver::new(backend.clone());

        deriver.derive(Some("a/b c")).await.expect("derive succeeds");
        assert_eq!(backend.derived_paths(), vec!["a/b c".to_string()]);
    }

    #[tokio::test]
    async fn same_path_yields_same_bytes() {
        let deriver = KeyDeriver::new(Arc::new(StubBackend::default()));
        let one = deriver.derive(Some("x")).await.unwrap();
        let two = deriver.derive(Some("x")).await.unwrap();
        let other = deriver.derive(Some("y")).await.unwrap();

        assert_eq!(one.as_bytes(), two.as_bytes());
        assert_ne!(one.as_bytes(), other.as_bytes());
    }

    #[tokio::test]
    async fn backend_failure_is_returned_immediately() {
        let backend = Arc::new(FailingBackend::default());
        let deriver = KeyDeriver::new(backend.clone());

        assert!(deriver.derive(Some("x")).await.is_err());
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn debug_output_hides_secret() {
        let material = KeyMaterial::new("p", "PEM-SECRET", vec![], vec![0xde, 0xad]);
        let debug = format!("{material:?}");
        assert!(!debug.contains("PEM-SECRET"));
        assert!(!debug.contains("222"));
        assert!(debug.contains("len"));
    }
}
