//! Slasher layout configuration and validation
//!
//! The addressing functions in [`crate::domain::params`] are total and accept
//! zero sizes and partial last chunks. This is where both are turned into a
//! startup error.
//!
//! # Example
//!
//! ```ignore
//! use qc_18_slasher::{Parameters, SlasherConfig};
//!
//! let params: Parameters = SlasherConfig::from_env()?
//!     .with_history_length(8192)
//!     .try_into()?;
//! ```

use crate::domain::params::{
    Parameters, DEFAULT_CHUNK_SIZE, DEFAULT_HISTORY_LENGTH, DEFAULT_VALIDATOR_CHUNK_SIZE,
};
use crate::error::{SlasherError, SlasherResult};
use serde::{Deserialize, Serialize};

/// Upper bound on cells per chunk, so one chunk stays a small allocation.
pub const MAX_CHUNK_CELLS: u64 = 1 << 24;

pub const ENV_CHUNK_SIZE: &str = "QC_SLASHER_CHUNK_SIZE";
pub const ENV_VALIDATOR_CHUNK_SIZE: &str = "QC_SLASHER_VALIDATOR_CHUNK_SIZE";
pub const ENV_HISTORY_LENGTH: &str = "QC_SLASHER_HISTORY_LENGTH";

/// Sizing of the span-chunk layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlasherConfig {
    /// Epochs per chunk, per validator
    pub chunk_size: u64,
    /// Validators grouped into one chunk
    pub validator_chunk_size: u64,
    /// Epochs retained before wraparound
    pub history_length: u64,
}

impl Default for SlasherConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            validator_chunk_size: DEFAULT_VALIDATOR_CHUNK_SIZE,
            history_length: DEFAULT_HISTORY_LENGTH,
        }
    }
}

impl SlasherConfig {
    /// Read overrides from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `QC_SLASHER_CHUNK_SIZE` (default: 16)
    /// - `QC_SLASHER_VALIDATOR_CHUNK_SIZE` (default: 256)
    /// - `QC_SLASHER_HISTORY_LENGTH` (default: 4096)
    pub fn from_env() -> SlasherResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`SlasherConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> SlasherResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            chunk_size: parse_var(&lookup, ENV_CHUNK_SIZE, defaults.chunk_size)?,
            validator_chunk_size: parse_var(
                &lookup,
                ENV_VALIDATOR_CHUNK_SIZE,
                defaults.validator_chunk_size,
            )?,
            history_length: parse_var(&lookup, ENV_HISTORY_LENGTH, defaults.history_length)?,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_validator_chunk_size(mut self, validator_chunk_size: u64) -> Self {
        self.validator_chunk_size = validator_chunk_size;
        self
    }

    pub fn with_history_length(mut self, history_length: u64) -> Self {
        self.history_length = history_length;
        self
    }

    /// Reject layouts the storage service cannot use.
    pub fn validate(&self) -> SlasherResult<()> {
        for (field, value) in [
            ("chunk_size", self.chunk_size),
            ("validator_chunk_size", self.validator_chunk_size),
            ("history_length", self.history_length),
        ] {
            if value == 0 {
                return Err(SlasherError::InvalidConfig {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        // A partial last chunk folds distinct retained epochs onto one cell.
        if self.history_length % self.chunk_size != 0 {
            return Err(SlasherError::InvalidConfig {
                field: "history_length",
                reason: format!(
                    "{} is not a multiple of chunk_size {}",
                    self.history_length, self.chunk_size
                ),
            });
        }

        match self.validator_chunk_size.checked_mul(self.chunk_size) {
            Some(cells) if cells <= MAX_CHUNK_CELLS => Ok(()),
            _ => Err(SlasherError::InvalidConfig {
                field: "chunk_size",
                reason: format!(
                    "chunk_size * validator_chunk_size exceeds {MAX_CHUNK_CELLS} cells"
                ),
            }),
        }
    }
}

impl TryFrom<SlasherConfig> for Parameters {
    type Error = SlasherError;

    fn try_from(config: SlasherConfig) -> Result<Self, Self::Error> {
        if let Err(e) = config.validate() {
            tracing::warn!("[qc-18] Rejecting slasher configuration: {}", e);
            return Err(e);
        }
        tracing::debug!(
            chunk_size = config.chunk_size,
            validator_chunk_size = config.validator_chunk_size,
            history_length = config.history_length,
            "[qc-18] Slasher parameters accepted"
        );
        Ok(Parameters::new(
            config.chunk_size,
            config.validator_chunk_size,
            config.history_length,
        ))
    }
}

impl From<Parameters> for SlasherConfig {
    fn from(params: Parameters) -> Self {
        Self {
            chunk_size: params.chunk_size(),
            validator_chunk_size: params.validator_chunk_size(),
            history_length: params.history_length(),
        }
    }
}

fn parse_var<F>(lookup: &F, name: &'static str, default: u64) -> SlasherResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| SlasherError::InvalidConfig {
                field: name,
                reason: format!("cannot parse {raw:?}: {e}"),
            }),
    }
}
