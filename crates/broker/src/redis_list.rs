use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use crate::{Broker, BrokerError};

/// Broker backed by Redis lists over one multiplexed connection.
#[derive(Clone)]
pub struct RedisBroker {
	conn: MultiplexedConnection,
}

impl RedisBroker {
	/// Connects to `url` (e.g. `redis://127.0.0.1:6379`) and pings it.
	///
	/// An unreachable server fails here rather than on first use.
	pub async fn connect(url: &str) -> Result<Self, BrokerError> {
		let client = redis::Client::open(url)?;
		let conn = client.get_multiplexed_async_connection().await?;
		let broker = Self { conn };
		broker.ping().await?;
		tracing::debug!(url, "broker.redis.connected");
		Ok(broker)
	}
}

impl std::fmt::Debug for RedisBroker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RedisBroker").finish_non_exhaustive()
	}
}

#[async_trait]
impl Broker for RedisBroker {
	async fn ping(&self) -> Result<(), BrokerError> {
		let mut conn = self.conn.clone();
		let _: String = redis::cmd("PING").query_async(&mut conn).await?;
		Ok(())
	}

	async fn append(&self, queue: &str, payload: String) -> Result<(), BrokerError> {
		let mut conn = self.conn.clone();
		let _: i64 = conn.rpush(queue, payload).await?;
		Ok(())
	}

	async fn pop_head(&self, queue: &str) -> Result<Option<Vec<u8>>, BrokerError> {
		let mut conn = self.conn.clone();
		let payload: Option<Vec<u8>> = conn.lpop(queue, None).await?;
		Ok(payload)
	}

	async fn length(&self, queue: &str) -> Result<u64, BrokerError> {
		let mut conn = self.conn.clone();
		let len: u64 = conn.llen(queue).await?;
		Ok(len)
	}
}
