use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{Broker, BrokerError};

#[derive(Debug, Default)]
struct MemoryInner {
	lists: Mutex<FxHashMap<String, VecDeque<Vec<u8>>>>,
	unavailable: AtomicBool,
	pops: AtomicU64,
}

/// In-process broker backed by one `VecDeque` per queue.
///
/// Clones share the same lists. Each primitive takes the lock once, so
/// append/pop/length are atomic with respect to each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
	inner: Arc<MemoryInner>,
}

impl MemoryBroker {
	/// Creates a broker with no queues.
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes every subsequent command fail with [`BrokerError::Unavailable`].
	pub fn set_unavailable(&self, unavailable: bool) {
		self.inner.unavailable.store(unavailable, Ordering::Release);
	}

	/// Number of `pop_head` calls served so far, including empty pops.
	pub fn pop_count(&self) -> u64 {
		self.inner.pops.load(Ordering::Acquire)
	}

	/// Appends raw bytes, bypassing the UTF-8 payloads `append` accepts.
	pub fn push_raw(&self, queue: &str, payload: Vec<u8>) {
		self.inner.lists.lock().entry(queue.to_string()).or_default().push_back(payload);
	}

	/// Returns a copy of the queue contents, head first.
	///
	/// Entries that are not UTF-8 are converted lossily.
	pub fn contents(&self, queue: &str) -> Vec<String> {
		self.inner
			.lists
			.lock()
			.get(queue)
			.map(|list| list.iter().map(|entry| String::from_utf8_lossy(entry).into_owned()).collect())
			.unwrap_or_default()
	}

	fn check(&self) -> Result<(), BrokerError> {
		if self.inner.unavailable.load(Ordering::Acquire) {
			return Err(BrokerError::Unavailable("memory broker marked unavailable".to_string()));
		}
		Ok(())
	}
}

#[async_trait]
impl Broker for MemoryBroker {
	async fn ping(&self) -> Result<(), BrokerError> {
		self.check()
	}

	async fn append(&self, queue: &str, payload: String) -> Result<(), BrokerError> {
		self.check()?;
		self.push_raw(queue, payload.into_bytes());
		Ok(())
	}

	async fn pop_head(&self, queue: &str) -> Result<Option<Vec<u8>>, BrokerError> {
		self.check()?;
		self.inner.pops.fetch_add(1, Ordering::AcqRel);
		Ok(self.inner.lists.lock().get_mut(queue).and_then(VecDeque::pop_front))
	}

	async fn length(&self, queue: &str) -> Result<u64, BrokerError> {
		self.check()?;
		let len = self.inner.lists.lock().get(queue).map_or(0, VecDeque::len);
		Ok(len as u64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn fifo_per_queue() {
		let broker = MemoryBroker::new();
		broker.append("a", "1".into()).await.unwrap();
		broker.append("a", "2".into()).await.unwrap();
		broker.append("b", "x".into()).await.unwrap();

		assert_eq!(broker.length("a").await.unwrap(), 2);
		assert_eq!(broker.pop_head("a").await.unwrap().as_deref(), Some(&b"1"[..]));
		assert_eq!(broker.contents("a"), vec!["2".to_string()]);
		assert_eq!(broker.contents("b"), vec!["x".to_string()]);
		assert_eq!(broker.length("missing").await.unwrap(), 0);
	}

	#[tokio::test]
	async fn empty_pop_returns_none_and_is_counted() {
		let broker = MemoryBroker::new();
		assert_eq!(broker.pop_head("q").await.unwrap(), None);
		assert_eq!(broker.pop_count(), 1);
	}

	#[tokio::test]
	async fn raw_entries_pop_unchanged() {
		let broker = MemoryBroker::new();
		broker.push_raw("q", vec![0xff, b'{']);
		assert_eq!(broker.contents("q"), vec!["\u{fffd}{".to_string()]);
		assert_eq!(broker.pop_head("q").await.unwrap(), Some(vec![0xff, b'{']));
	}

	#[tokio::test]
	async fn clones_share_lists() {
		let broker = MemoryBroker::new();
		let clone = broker.clone();
		clone.append("q", "payload".into()).await.unwrap();
		assert_eq!(broker.length("q").await.unwrap(), 1);
	}

	#[tokio::test]
	async fn unavailable_fails_every_command() {
		let broker = MemoryBroker::new();
		broker.set_unavailable(true);
		assert!(matches!(broker.ping().await, Err(BrokerError::Unavailable(_))));
		assert!(broker.length("q").await.is_err());
		assert!(broker.append("q", "x".into()).await.is_err());
		assert!(broker.pop_head("q").await.is_err());

		broker.set_unavailable(false);
		assert!(broker.ping().await.is_ok());
		assert_eq!(broker.contents("q"), Vec::<String>::new());
	}
}
