use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a dispatcher's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
	/// Calls appended to pending by this dispatcher.
	pub enqueued: u64,
	/// Calls appended to finished.
	pub finished: u64,
	/// Payloads appended to failed.
	pub failed: u64,
	/// Polls that found pending empty.
	pub idle_polls: u64,
	/// Broker commands that failed during polling.
	pub broker_errors: u64,
}

#[derive(Debug, Default)]
pub(crate) struct DispatchStats {
	enqueued: AtomicU64,
	finished: AtomicU64,
	failed: AtomicU64,
	idle_polls: AtomicU64,
	broker_errors: AtomicU64,
}

impl DispatchStats {
	pub(crate) fn record_enqueued(&self) {
		self.enqueued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_finished(&self) {
		self.finished.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failed(&self) {
		self.failed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_idle(&self) {
		self.idle_polls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_broker_error(&self) {
		self.broker_errors.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn snapshot(&self) -> StatsSnapshot {
		StatsSnapshot {
			enqueued: self.enqueued.load(Ordering::Relaxed),
			finished: self.finished.load(Ordering::Relaxed),
			failed: self.failed.load(Ordering::Relaxed),
			idle_polls: self.idle_polls.load(Ordering::Relaxed),
			broker_errors: self.broker_errors.load(Ordering::Relaxed),
		}
	}
}
