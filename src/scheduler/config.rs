//! Batch configuration.

use std::time::Duration;

use crate::error::{BatchError, Result};

pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration fixed at controller construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum items simultaneously `Generating`.
    pub concurrency: usize,
    /// Minimum gap between two launches.
    pub item_delay: Duration,
    /// How many times a single item may be re-admitted by a retry.
    pub max_retries: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            item_delay: Duration::ZERO,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl BatchConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(BatchError::InvalidConfig("concurrency must be >= 1".to_string()));
        }
        Ok(())
    }
}
