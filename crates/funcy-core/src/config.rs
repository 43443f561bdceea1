// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use crate::coercion::{CoercionMode, CoercionOptions};

/// Funcy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Primitive conversion mode
    pub coercion: CoercionMode,
    /// Maximum nesting depth for struct reconstruction
    pub max_record_depth: usize,
    /// Maximum requests the runner keeps in flight
    pub max_in_flight: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coercion: CoercionMode::Strict,
            max_record_depth: 32,
            max_in_flight: 64,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `FUNCY_COERCION`: `strict` or `lenient` (default: strict)
    /// - `FUNCY_MAX_RECORD_DEPTH`: struct nesting limit (default: 32)
    /// - `FUNCY_MAX_IN_FLIGHT`: concurrent requests in the runner (default: 64)
    pub fn from_env() -> Result<Self, ConfigError> {
        let coercion = match std::env::var("FUNCY_COERCION") {
            Ok(value) => value.parse().map_err(|_| {
                ConfigError::Invalid("FUNCY_COERCION", "must be 'strict' or 'lenient'")
            })?,
            Err(_) => CoercionMode::Strict,
        };

        let max_record_depth = positive("FUNCY_MAX_RECORD_DEPTH", 32)?;
        let max_in_flight = positive("FUNCY_MAX_IN_FLIGHT", 64)?;

        Ok(Self {
            coercion,
            max_record_depth,
            max_in_flight,
        })
    }

    pub fn coercion_options(&self) -> CoercionOptions {
        CoercionOptions {
            mode: self.coercion,
            max_depth: self.max_record_depth,
        }
    }
}

fn positive(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    let value: usize = match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(var, "must be a positive integer"))?,
        Err(_) => default,
    };

    if value == 0 {
        return Err(ConfigError::Invalid(var, "must be greater than zero"));
    }
    Ok(value)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
