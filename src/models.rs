// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Query parameters and response bodies used by the HTTP handlers. Response
//! types derive `ToSchema` for the OpenAPI document.
//!
//! ## Defaults
//!
//! - Quote endpoints sign [`DEFAULT_QUOTE_TEXT`] when `text` is absent
//! - Key and account endpoints derive from `dstack` when `key` is absent

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::tappd::TdxQuoteResponse;

/// Message quoted when the request carries no `text`.
pub const DEFAULT_QUOTE_TEXT: &str = "hello dstack";

// =============================================================================
// Query parameters
// =============================================================================

/// Query for the quote endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuoteQuery {
    /// Message to bind into the quote.
    pub text: Option<String>,
    /// Hash applied to the message by tappd (`sha512` when absent).
    pub hash_algorithm: Option<String>,
}

impl QuoteQuery {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or(DEFAULT_QUOTE_TEXT)
    }
}

/// Query for `/tdx_quote_raw`; the hash algorithm is always `raw`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RawQuoteQuery {
    /// Message placed verbatim in the report data (at most 64 bytes).
    pub text: Option<String>,
}

impl RawQuoteQuery {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or(DEFAULT_QUOTE_TEXT)
    }
}

/// Query for the key and account endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KeyQuery {
    /// Key derivation path.
    pub key: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// Quote endpoint response body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuoteRecord {
    #[serde(flatten)]
    pub quote: TdxQuoteResponse,
    /// Hex of the report data submitted to tappd.
    pub report_data: String,
    /// RTMR0..3 replayed from the event log, when it parses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtmrs: Option<Vec<String>>,
}

/// Account endpoint response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AddressResponse {
    pub address: String,
}

/// `/healthz` response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct HealthzResponse {
    pub ok: bool,
}
