// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{deriver::KeyDeriver, liveness::LivenessTracker, tappd::AttestationBackend};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn AttestationBackend>,
    pub deriver: KeyDeriver,
    pub liveness: Arc<LivenessTracker>,
    /// Serve `/env`. Off unless explicitly enabled.
    pub expose_env: bool,
    /// Serve `/openapi.json`.
    pub api_docs: bool,
}

impl AppState {
    pub fn new(backend: Arc<dyn AttestationBackend>, liveness: Arc<LivenessTracker>) -> Self {
        Self {
            deriver: KeyDeriver::new(backend.clone()),
            backend,
            liveness,
            expose_env: false,
            api_docs: false,
        }
    }

    pub fn with_expose_env(mut self, expose_env: bool) -> Self {
        self.expose_env = expose_env;
        self
    }

    pub fn with_api_docs(mut self, api_docs: bool) -> Self {
        self.api_docs = api_docs;
        self
    }
}
