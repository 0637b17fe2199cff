//! Worker pool and scheduler configuration.

use serde::{Deserialize, Serialize};

use crate::core::worker_pool::resolve_worker_count;

/// Default prefix for worker thread names (`sage-worker-0`, `sage-worker-1`, ...).
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "sage-worker";

/// Smallest stack size accepted for worker threads, in bytes.
pub const MIN_THREAD_STACK_SIZE: usize = 64 * 1024;

const ENV_WORKER_COUNT: &str = "SAGE_JOBS_WORKER_COUNT";
const ENV_THREAD_PREFIX: &str = "SAGE_JOBS_THREAD_PREFIX";
const ENV_STACK_SIZE: &str = "SAGE_JOBS_STACK_SIZE";

/// Configuration for a worker pool and the scheduler built on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of worker threads; `0` means one per hardware thread.
    pub worker_count: usize,
    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
    /// Stack size for worker threads; `None` keeps the platform default.
    pub thread_stack_size: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            thread_stack_size: None,
        }
    }
}

impl SchedulerConfig {
    /// Default configuration: hardware-sized pool, default thread names and stacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads (`0` = hardware concurrency).
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set an explicit worker stack size in bytes.
    #[must_use]
    pub fn with_thread_stack_size(mut self, stack_size: usize) -> Self {
        self.thread_stack_size = Some(stack_size);
        self
    }

    /// Worker count after resolving `0` to the hardware concurrency.
    #[must_use]
    pub fn resolved_worker_count(&self) -> usize {
        resolve_worker_count(self.worker_count)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name_prefix.trim().is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        if let Some(stack_size) = self.thread_stack_size {
            if stack_size < MIN_THREAD_STACK_SIZE {
                return Err(format!(
                    "thread_stack_size must be at least {MIN_THREAD_STACK_SIZE} bytes, got {stack_size}"
                ));
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from variables resolved by `lookup`.
    ///
    /// Reads `SAGE_JOBS_WORKER_COUNT`, `SAGE_JOBS_THREAD_PREFIX` and
    /// `SAGE_JOBS_STACK_SIZE`; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of an unparsable or invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_WORKER_COUNT) {
            cfg.worker_count = parse_number(ENV_WORKER_COUNT, &raw)?;
        }
        if let Some(prefix) = lookup(ENV_THREAD_PREFIX) {
            cfg.thread_name_prefix = prefix;
        }
        if let Some(raw) = lookup(ENV_STACK_SIZE) {
            cfg.thread_stack_size = Some(parse_number(ENV_STACK_SIZE, &raw)?);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading `.env` first
    /// if one is present.
    ///
    /// # Errors
    ///
    /// Returns a description of an unparsable or invalid value.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<usize, String> {
    raw.trim()
        .parse()
        .map_err(|e| format!("{key}: invalid number `{raw}`: {e}"))
}
