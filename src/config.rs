//! Runtime configuration shared by the binary and the state constructor.

use std::path::PathBuf;

use crate::api::API_BASE;
use crate::search::{DEBOUNCE_MS, RANDOM_BATCH_SIZE, ROSTER_SIZE};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    /// How many random Pokemon an empty search box shows.
    pub batch_size: usize,
    pub debounce_ms: u64,
    pub roster_limit: usize,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            batch_size: RANDOM_BATCH_SIZE,
            debounce_ms: DEBOUNCE_MS,
            roster_limit: ROSTER_SIZE as usize,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Batch sizes are drawn without replacement from the roster, so they are
    /// clamped to `1..=roster_limit`.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, self.roster_limit.max(1))
    }
}
