// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! dstack Attestation Facade
//!
//! HTTP facade in front of the dstack tappd guest agent running in a TDX
//! confidential VM. It serves attestation info and quotes, derived keys, and
//! the Ethereum / Solana accounts bound to those keys, and restarts itself
//! when tappd stops answering.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `tappd` - tappd RPC client and the `AttestationBackend` capability
//! - `deriver` - key material derivation adapter
//! - `accounts` - Ethereum / Solana account derivation
//! - `liveness` - consecutive-failure tracker and forced restart

pub mod accounts;
pub mod api;
pub mod config;
pub mod deriver;
pub mod error;
pub mod liveness;
pub mod logging;
pub mod models;
pub mod state;
pub mod tappd;

#[cfg(test)]
pub(crate) mod test_support;
