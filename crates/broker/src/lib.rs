//! Queue broker abstraction.
//!
//! The dispatcher only needs three list primitives per queue, each assumed
//! atomic by the backing store: append at the tail, pop from the head, and
//! read the length. [`MemoryBroker`] keeps lists in process; `RedisBroker`
//! maps them onto `RPUSH`/`LPOP`/`LLEN`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;
#[cfg(feature = "redis")]
mod redis_list;

pub use memory::MemoryBroker;
#[cfg(feature = "redis")]
pub use redis_list::RedisBroker;

/// Connectivity or command failure reported by a broker.
#[derive(Debug, Error)]
pub enum BrokerError {
	/// The broker cannot be reached or refused the command.
	#[error("broker unavailable: {0}")]
	Unavailable(String),
	/// Error reported by the Redis client.
	#[cfg(feature = "redis")]
	#[error("redis error: {0}")]
	Redis(#[from] ::redis::RedisError),
}

/// Atomic FIFO list store.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
	/// Checks connectivity.
	async fn ping(&self) -> Result<(), BrokerError>;

	/// Appends `payload` at the tail of `queue`.
	async fn append(&self, queue: &str, payload: String) -> Result<(), BrokerError>;

	/// Removes and returns the head of `queue`, or `None` if it is empty.
	///
	/// The entry is returned as raw bytes; it is already gone from the queue
	/// whether or not it turns out to be valid UTF-8.
	async fn pop_head(&self, queue: &str) -> Result<Option<Vec<u8>>, BrokerError>;

	/// Returns the number of entries in `queue`.
	async fn length(&self, queue: &str) -> Result<u64, BrokerError>;
}

/// Key prefixes for the three per-service queues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueuePrefixes {
	pub pending: String,
	pub finished: String,
	pub failed: String,
}

impl Default for QueuePrefixes {
	fn default() -> Self {
		Self {
			pending: "crush:queues:".to_string(),
			finished: "crush:finished:".to_string(),
			failed: "crush:failed:".to_string(),
		}
	}
}

/// Fully qualified queue keys for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKeys {
	/// Calls waiting to run.
	pub pending: String,
	/// Calls that ran to completion.
	pub finished: String,
	/// Calls rejected or failed during execution.
	pub failed: String,
}

impl QueueKeys {
	pub fn new(prefixes: &QueuePrefixes, service: &str) -> Self {
		Self {
			pending: format!("{}{service}", prefixes.pending),
			finished: format!("{}{service}", prefixes.finished),
			failed: format!("{}{service}", prefixes.failed),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keys_concatenate_prefix_and_service() {
		let keys = QueueKeys::new(&QueuePrefixes::default(), "MyService");
		assert_eq!(keys.pending, "crush:queues:MyService");
		assert_eq!(keys.finished, "crush:finished:MyService");
		assert_eq!(keys.failed, "crush:failed:MyService");
	}
}
