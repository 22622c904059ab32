//! Worker configuration.
//!
//! Configuration is written in TOML. Every field has a default, so an empty
//! file is valid:
//!
//! ```toml
//! service = "MyService"
//! broker_url = "redis://127.0.0.1:6379"
//! idle_interval_ms = 1000
//! invoke_timeout_ms = 30000
//!
//! [queues]
//! pending = "crush:queues:"
//! finished = "crush:finished:"
//! failed = "crush:failed:"
//!
//! [backoff]
//! base_ms = 100
//! factor = 2.0
//! cap_ms = 30000
//! ```
//!
//! When loaded from a file, the `CRUSH_BROKER_URL` environment variable
//! overrides `broker_url`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crush_broker::QueuePrefixes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`WorkerConfig::broker_url`].
pub const BROKER_URL_ENV: &str = "CRUSH_BROKER_URL";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A field holds a value the worker cannot run with.
	#[error("invalid value for '{field}': {reason}")]
	Invalid { field: &'static str, reason: String },
}

/// Bounded exponential backoff applied after consecutive broker failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffPolicy {
	/// Delay after the first failure.
	pub base_ms: u64,
	/// Growth factor per additional consecutive failure.
	pub factor: f64,
	/// Upper bound for any single delay.
	pub cap_ms: u64,
}

impl Default for BackoffPolicy {
	fn default() -> Self {
		Self {
			base_ms: 100,
			factor: 2.0,
			cap_ms: 30_000,
		}
	}
}

impl BackoffPolicy {
	/// Delay before retrying after `attempt` consecutive failures.
	pub fn delay(&self, attempt: u32) -> Duration {
		if attempt == 0 {
			return Duration::ZERO;
		}
		let exp = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
		let raw = self.base_ms as f64 * self.factor.powi(exp);
		let cap = self.cap_ms as f64;
		let ms = if raw.is_finite() { raw.min(cap) } else { cap };
		Duration::from_millis(ms.round() as u64)
	}
}

/// Settings for one dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
	/// Queue name suffix. Defaults to the bound service's name.
	pub service: Option<String>,
	/// Broker address.
	pub broker_url: String,
	/// Sleep between polls while the pending queue is empty.
	pub idle_interval_ms: u64,
	/// Per-call execution limit. Unset means calls may run indefinitely.
	///
	/// An expired call is routed to failed and the loop moves on, but its
	/// handler keeps running on its blocking thread until it returns. While it
	/// does, the next calls run alongside it, so handlers must tolerate
	/// overlapping with a timed-out predecessor.
	pub invoke_timeout_ms: Option<u64>,
	/// Queue key prefixes.
	pub queues: QueuePrefixes,
	/// Retry pacing while the broker is failing.
	pub backoff: BackoffPolicy,
}

impl Default for WorkerConfig {
	fn default() -> Self {
		Self {
			service: None,
			broker_url: "redis://127.0.0.1:6379".to_string(),
			idle_interval_ms: 1000,
			invoke_timeout_ms: None,
			queues: QueuePrefixes::default(),
			backoff: BackoffPolicy::default(),
		}
	}
}

impl WorkerConfig {
	/// Parses and validates a TOML string. The environment is not consulted.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads a TOML file, applies environment overrides, and validates.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let mut config: Self = toml::from_str(&input)?;
		config.apply_env(|key| std::env::var(key).ok());
		config.validate()?;
		Ok(config)
	}

	/// Applies overrides from an environment lookup.
	pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
		if let Some(url) = lookup(BROKER_URL_ENV).filter(|url| !url.is_empty()) {
			self.broker_url = url;
		}
	}

	/// Rejects values that would make the worker spin or never connect.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let invalid = |field, reason: &str| {
			Err(ConfigError::Invalid {
				field,
				reason: reason.to_string(),
			})
		};

		if self.service.as_deref() == Some("") {
			return invalid("service", "must not be empty");
		}
		if self.broker_url.is_empty() {
			return invalid("broker_url", "must not be empty");
		}
		if self.idle_interval_ms == 0 {
			return invalid("idle_interval_ms", "must be greater than zero");
		}
		if self.invoke_timeout_ms == Some(0) {
			return invalid("invoke_timeout_ms", "must be greater than zero when set");
		}
		if self.backoff.base_ms == 0 {
			return invalid("backoff.base_ms", "must be greater than zero");
		}
		if !self.backoff.factor.is_finite() || self.backoff.factor < 1.0 {
			return invalid("backoff.factor", "must be a finite number >= 1.0");
		}
		if self.backoff.cap_ms < self.backoff.base_ms {
			return invalid("backoff.cap_ms", "must not be below backoff.base_ms");
		}
		Ok(())
	}

	pub fn idle_interval(&self) -> Duration {
		Duration::from_millis(self.idle_interval_ms)
	}

	pub fn invoke_timeout(&self) -> Option<Duration> {
		self.invoke_timeout_ms.map(Duration::from_millis)
	}
}
