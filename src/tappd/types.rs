// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request and response types for the tappd RPC surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha384};
use utoipa::ToSchema;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::client::TappdError;

/// Maximum report data accepted by the `raw` hash algorithm (TDX REPORTDATA).
pub const RAW_REPORT_DATA_LEN: usize = 64;

/// Size of a TDX measurement register (SHA-384 digest).
const RTMR_LEN: usize = 48;

/// Number of runtime measurement registers replayed from the event log.
const RTMR_COUNT: usize = 4;

// =============================================================================
// Quote hash algorithms
// =============================================================================

/// Hash applied by tappd to the report data before it is placed in the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum QuoteHashAlgorithm {
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha384")]
    Sha384,
    #[default]
    #[serde(rename = "sha512")]
    Sha512,
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "sha3-384")]
    Sha3_384,
    #[serde(rename = "sha3-512")]
    Sha3_512,
    #[serde(rename = "keccak256")]
    Keccak256,
    #[serde(rename = "keccak384")]
    Keccak384,
    #[serde(rename = "keccak512")]
    Keccak512,
    /// Report data is used verbatim, zero-padded to 64 bytes.
    #[serde(rename = "raw")]
    Raw,
}

impl QuoteHashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteHashAlgorithm::Sha256 => "sha256",
            QuoteHashAlgorithm::Sha384 => "sha384",
            QuoteHashAlgorithm::Sha512 => "sha512",
            QuoteHashAlgorithm::Sha3_256 => "sha3-256",
            QuoteHashAlgorithm::Sha3_384 => "sha3-384",
            QuoteHashAlgorithm::Sha3_512 => "sha3-512",
            QuoteHashAlgorithm::Keccak256 => "keccak256",
            QuoteHashAlgorithm::Keccak384 => "keccak384",
            QuoteHashAlgorithm::Keccak512 => "keccak512",
            QuoteHashAlgorithm::Raw => "raw",
        }
    }
}

impl fmt::Display for QuoteHashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteHashAlgorithm {
    type Err = TappdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let algorithm = match s.to_ascii_lowercase().as_str() {
            "sha256" => QuoteHashAlgorithm::Sha256,
            "sha384" => QuoteHashAlgorithm::Sha384,
            "sha512" => QuoteHashAlgorithm::Sha512,
            "sha3-256" => QuoteHashAlgorithm::Sha3_256,
            "sha3-384" => QuoteHashAlgorithm::Sha3_384,
            "sha3-512" => QuoteHashAlgorithm::Sha3_512,
            "keccak256" => QuoteHashAlgorithm::Keccak256,
            "keccak384" => QuoteHashAlgorithm::Keccak384,
            "keccak512" => QuoteHashAlgorithm::Keccak512,
            "raw" => QuoteHashAlgorithm::Raw,
            other => {
                return Err(TappdError::InvalidReportData(format!(
                    "unsupported hash algorithm: {other}"
                )))
            }
        };
        Ok(algorithm)
    }
}

/// Hex-encode report data for `Tappd.TdxQuote`.
///
/// With [`QuoteHashAlgorithm::Raw`] the data must fit in 64 bytes and is
/// left-padded with zeros to 64 bytes; every other algorithm is hashed by
/// tappd.
pub fn encode_report_data(
    report_data: &[u8],
    algorithm: QuoteHashAlgorithm,
) -> Result<String, TappdError> {
    if algorithm != QuoteHashAlgorithm::Raw {
        return Ok(alloy::hex::encode(report_data));
    }

    if report_data.len() > RAW_REPORT_DATA_LEN {
        return Err(TappdError::InvalidReportData(format!(
            "raw report data must be at most {RAW_REPORT_DATA_LEN} bytes, got {}",
            report_data.len()
        )));
    }

    let mut padded = [0u8; RAW_REPORT_DATA_LEN];
    padded[RAW_REPORT_DATA_LEN - report_data.len()..].copy_from_slice(report_data);
    Ok(alloy::hex::encode(padded))
}

// =============================================================================
// RPC payloads
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct DeriveKeyRequest<'a> {
    pub path: &'a str,
    pub subject: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TdxQuoteRequest<'a> {
    pub report_data: &'a str,
    pub hash_algorithm: &'a str,
}

/// `Tappd.DeriveKey` response.
///
/// `key` is a PKCS#8 PEM private key; it is wiped on drop and redacted from
/// `Debug` output.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct DeriveKeyResponse {
    pub key: String,
    #[serde(default)]
    pub certificate_chain: Vec<String>,
}

impl fmt::Debug for DeriveKeyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeriveKeyResponse")
            .field("key", &"<redacted>")
            .field("certificate_chain", &self.certificate_chain.len())
            .finish()
    }
}

impl DeriveKeyResponse {
    /// Decode the PEM body into raw DER bytes.
    pub fn decode_key(&self) -> Result<Zeroizing<Vec<u8>>, TappdError> {
        let parsed = pem::parse(self.key.as_bytes())
            .map_err(|e| TappdError::InvalidResponse(format!("derived key is not PEM: {e}")))?;
        Ok(Zeroizing::new(parsed.into_contents()))
    }
}

/// `Tappd.TdxQuote` response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TdxQuoteResponse {
    /// Hex-encoded TDX quote.
    pub quote: String,
    /// JSON-encoded event log backing RTMR0..3.
    pub event_log: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Single entry of the TDX event log.
#[derive(Debug, Clone, Deserialize)]
pub struct EventLogEntry {
    pub imr: u32,
    pub digest: String,
    #[serde(default)]
    pub event: String,
}

impl TdxQuoteResponse {
    /// Parse the event log string.
    pub fn events(&self) -> Result<Vec<EventLogEntry>, TappdError> {
        serde_json::from_str(&self.event_log)
            .map_err(|e| TappdError::InvalidResponse(format!("invalid event log: {e}")))
    }

    /// Replay RTMR0..3 from the event log.
    ///
    /// Each register starts at 48 zero bytes and is extended as
    /// `SHA-384(mr || digest)`, with digests shorter than 48 bytes
    /// right-padded with zeros.
    pub fn replay_rtmrs(&self) -> Result<[String; RTMR_COUNT], TappdError> {
        let events = self.events()?;
        let mut rtmrs: [String; RTMR_COUNT] = Default::default();

        for (idx, slot) in rtmrs.iter_mut().enumerate() {
            let mut mr = [0u8; RTMR_LEN];
            for entry in events.iter().filter(|e| e.imr as usize == idx) {
                let mut digest = alloy::hex::decode(&entry.digest).map_err(|e| {
                    TappdError::InvalidResponse(format!(
                        "invalid digest in event log ({}): {e}",
                        entry.event
                    ))
                })?;
                if digest.len() < RTMR_LEN {
                    digest.resize(RTMR_LEN, 0);
                }

                let mut hasher = Sha384::new();
                hasher.update(mr);
                hasher.update(&digest);
                mr.copy_from_slice(&hasher.finalize());
            }
            *slot = alloy::hex::encode(mr);
        }

        Ok(rtmrs)
    }
}
