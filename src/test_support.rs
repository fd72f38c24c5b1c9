// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process backend and shutdown doubles shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::liveness::{LivenessTracker, ShutdownTrigger};
use crate::state::AppState;
use crate::tappd::{
    encode_report_data, AttestationBackend, DeriveKeyResponse, QuoteHashAlgorithm, TappdError,
    TdxQuoteResponse,
};

/// Backend that answers every call, deterministically per input.
#[derive(Default)]
pub struct StubBackend {
    derived: Mutex<Vec<String>>,
    event_log: Option<String>,
}

impl StubBackend {
    /// Stub whose quotes carry `event_log` verbatim.
    pub fn with_event_log(event_log: impl Into<String>) -> Self {
        Self {
            event_log: Some(event_log.into()),
            ..Self::default()
        }
    }

    pub fn derived_paths(&self) -> Vec<String> {
        self.derived.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttestationBackend for StubBackend {
    async fn info(&self) -> Result<serde_json::Value, TappdError> {
        Ok(json!({ "app_id": "stub-app", "instance_id": "stub-instance" }))
    }

    async fn tdx_quote(
        &self,
        report_data: &[u8],
        hash_algorithm: QuoteHashAlgorithm,
    ) -> Result<TdxQuoteResponse, TappdError> {
        Ok(TdxQuoteResponse {
            quote: format!("quote:{}", encode_report_data(report_data, hash_algorithm)?),
            event_log: self
                .event_log
                .clone()
                .unwrap_or_else(|| r#"[{"imr":0,"digest":"aa","event":"boot"}]"#.to_string()),
            hash_algorithm: Some(hash_algorithm.to_string()),
            prefix: None,
        })
    }

    async fn derive_key(&self, path: &str) -> Result<DeriveKeyResponse, TappdError> {
        self.derived.lock().unwrap().push(path.to_string());
        let der = format!("derived-key-material-for:{path}").into_bytes();
        Ok(DeriveKeyResponse {
            key: pem::encode(&pem::Pem::new("PRIVATE KEY", der)),
            certificate_chain: vec![format!("cert:{path}")],
        })
    }
}

/// Backend whose every call fails.
#[derive(Default)]
pub struct FailingBackend {
    calls: AtomicUsize,
}

impl FailingBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> TappdError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TappdError::Transport("connection refused".to_string())
    }
}

#[async_trait]
impl AttestationBackend for FailingBackend {
    async fn info(&self) -> Result<serde_json::Value, TappdError> {
        Err(self.fail())
    }

    async fn tdx_quote(
        &self,
        _report_data: &[u8],
        _hash_algorithm: QuoteHashAlgorithm,
    ) -> Result<TdxQuoteResponse, TappdError> {
        Err(self.fail())
    }

    async fn derive_key(&self, _path: &str) -> Result<DeriveKeyResponse, TappdError> {
        Err(self.fail())
    }
}

/// Shutdown trigger that only records invocations.
#[derive(Default)]
pub struct RecordingShutdown {
    reasons: Mutex<Vec<String>>,
}

impl RecordingShutdown {
    pub fn count(&self) -> usize {
        self.reasons.lock().unwrap().len()
    }

    pub fn last_reason(&self) -> Option<String> {
        self.reasons.lock().unwrap().last().cloned()
    }
}

impl ShutdownTrigger for RecordingShutdown {
    fn trigger(&self, reason: &str) {
        self.reasons.lock().unwrap().push(reason.to_string());
    }
}

/// Application state over `backend` with a recording shutdown trigger.
pub fn test_state(
    backend: Arc<dyn AttestationBackend>,
    threshold: u32,
) -> (AppState, Arc<RecordingShutdown>) {
    let shutdown = Arc::new(RecordingShutdown::default());
    let liveness = Arc::new(LivenessTracker::new(threshold, shutdown.clone()));
    (AppState::new(backend, liveness), shutdown)
}
