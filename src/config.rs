// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is read once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `FAILURE_THRESHOLD` | Consecutive backend failures before exit | `10` |
//! | `DSTACK_SIMULATOR_ENDPOINT` | tappd simulator URL (takes precedence) | unset |
//! | `TAPPD_ENDPOINT` | tappd socket path or URL | `/var/run/tappd.sock` |
//! | `EXPOSE_ENV` | Serve the process environment on `/env` | `false` |
//! | `API_DOCS` | Serve the OpenAPI document on `/openapi.json` | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashMap;

use tracing::warn;

use crate::liveness::DEFAULT_FAILURE_THRESHOLD;
use crate::tappd::DEFAULT_TAPPD_SOCKET;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const FAILURE_THRESHOLD_ENV: &str = "FAILURE_THRESHOLD";

/// Set by the dstack simulator; overrides [`TAPPD_ENDPOINT_ENV`].
pub const SIMULATOR_ENDPOINT_ENV: &str = "DSTACK_SIMULATOR_ENDPOINT";
pub const TAPPD_ENDPOINT_ENV: &str = "TAPPD_ENDPOINT";

/// Opt-in for the environment dump endpoint.
///
/// `/env` returns every variable visible to the process, secrets included,
/// so it stays disabled unless a deployment asks for it.
pub const EXPOSE_ENV_ENV: &str = "EXPOSE_ENV";
pub const API_DOCS_ENV: &str = "API_DOCS";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// A configured value that was rejected in favour of the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedVar {
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub failure_threshold: u32,
    pub tappd_endpoint: String,
    pub expose_env: bool,
    pub api_docs: bool,
    pub log_format: LogFormat,
    /// Values replaced by defaults; logged once tracing is up.
    pub discarded: Vec<DiscardedVar>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            tappd_endpoint: DEFAULT_TAPPD_SOCKET.to_string(),
            expose_env: false,
            api_docs: false,
            log_format: LogFormat::Pretty,
            discarded: Vec::new(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Build configuration from an explicit variable map.
    ///
    /// Unparseable values fall back to their defaults and are recorded in
    /// [`Config::discarded`]. A `FAILURE_THRESHOLD` of `0` is treated the
    /// same way, since a tracker that trips before any failure is useless.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let get = |name: &str| lookup(vars, name);

        let defaults = Self::default();
        let mut discarded = Vec::new();

        let port = parse_or_discard(get(PORT_ENV), PORT_ENV, &mut discarded, |v| {
            v.parse::<u16>().ok()
        })
        .unwrap_or(defaults.port);

        let failure_threshold = parse_or_discard(
            get(FAILURE_THRESHOLD_ENV),
            FAILURE_THRESHOLD_ENV,
            &mut discarded,
            |v| v.parse::<u32>().ok().filter(|n| *n > 0),
        )
        .unwrap_or(defaults.failure_threshold);

        let tappd_endpoint = get(SIMULATOR_ENDPOINT_ENV)
            .or_else(|| get(TAPPD_ENDPOINT_ENV))
            .map(str::to_string)
            .unwrap_or(defaults.tappd_endpoint);

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            host: get(HOST_ENV).map(str::to_string).unwrap_or(defaults.host),
            port,
            failure_threshold,
            tappd_endpoint,
            expose_env: get(EXPOSE_ENV_ENV).map(parse_flag).unwrap_or(false),
            api_docs: get(API_DOCS_ENV).map(parse_flag).unwrap_or(false),
            log_format,
            discarded,
        }
    }

    /// Warn about every value that was replaced by its default.
    pub fn warn_discarded(&self) {
        for var in &self.discarded {
            warn!(
                name = var.name,
                value = %var.value,
                "Ignoring invalid configuration value, using default"
            );
        }
    }
}

fn parse_or_discard<T>(
    raw: Option<&str>,
    name: &'static str,
    discarded: &mut Vec<DiscardedVar>,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Option<T> {
    let raw = raw?;
    let parsed = parse(raw);
    if parsed.is_none() {
        discarded.push(DiscardedVar {
            name,
            value: raw.to_string(),
        });
    }
    parsed
}

fn lookup<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
