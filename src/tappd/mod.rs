// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! dstack tappd integration.
//!
//! This module provides:
//! - The [`AttestationBackend`] capability used by the HTTP handlers
//! - [`TappdClient`], the production implementation over a Unix socket or
//!   the simulator's HTTP endpoint
//! - RPC payload types, report-data encoding and RTMR replay

pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::{TappdClient, TappdEndpoint, TappdError, DEFAULT_TAPPD_SOCKET};
pub use types::*;

/// Attestation capabilities exposed by the TEE guest agent.
///
/// Implementations are shared across concurrent requests and must be
/// stateless per call.
#[async_trait]
pub trait AttestationBackend: Send + Sync {
    /// Attestation metadata for this CVM (opaque JSON).
    async fn info(&self) -> Result<serde_json::Value, TappdError>;

    /// Produce a TDX quote binding `report_data`.
    async fn tdx_quote(
        &self,
        report_data: &[u8],
        hash_algorithm: QuoteHashAlgorithm,
    ) -> Result<TdxQuoteResponse, TappdError>;

    /// Derive key material bound to `path`.
    async fn derive_key(&self, path: &str) -> Result<DeriveKeyResponse, TappdError>;
}
