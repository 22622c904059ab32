//! The polling loop that drains a dispatcher's pending queue.

use std::time::Duration;

use crush_broker::Broker;
use crush_invocation::{CallEnvelope, wire};
use tokio_util::sync::CancellationToken;

use crate::dispatcher::{Dequeued, Dispatcher, unix_now};
use crate::error::InvocationFailure;

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
	/// Pending was empty.
	Idle,
	/// Pending was non-empty but another consumer popped the entry first.
	Raced,
	/// A call ran and was appended to finished.
	Finished,
	/// A payload was appended to failed.
	Failed,
	/// A broker command failed.
	BrokerUnavailable,
}

impl<B: Broker> Dispatcher<B> {
	/// Runs one iteration: check pending, then process at most one call.
	///
	/// Never sleeps; pacing is left to [`Dispatcher::run_until_cancelled`].
	pub async fn poll_once(&self) -> PollOutcome {
		let pending = match self.broker.length(&self.keys.pending).await {
			Ok(pending) => pending,
			Err(error) => {
				self.stats.record_broker_error();
				tracing::error!(service = %self.name, queue = %self.keys.pending, error = %error, "dispatcher.poll.length_failed");
				return PollOutcome::BrokerUnavailable;
			}
		};

		if pending == 0 {
			self.stats.record_idle();
			tracing::trace!(service = %self.name, "dispatcher.poll.idle");
			return PollOutcome::Idle;
		}

		match self.dequeue().await {
			Ok(Some(dequeued)) => self.route(dequeued).await,
			Ok(None) => PollOutcome::Raced,
			Err(error) => {
				self.stats.record_broker_error();
				tracing::error!(service = %self.name, queue = %self.keys.pending, error = %error, "dispatcher.poll.pop_failed");
				PollOutcome::BrokerUnavailable
			}
		}
	}

	/// Polls for the lifetime of the process.
	pub async fn run(&self) {
		self.run_until_cancelled(&CancellationToken::new()).await;
	}

	/// Polls until `cancel` fires.
	///
	/// Cancellation is observed between iterations and during sleeps. A call
	/// that has already started runs to completion and is routed first.
	pub async fn run_until_cancelled(&self, cancel: &CancellationToken) {
		tracing::info!(service = %self.name, "dispatcher.run.start");
		let mut failures: u32 = 0;

		while !cancel.is_cancelled() {
			let delay = match self.poll_once().await {
				PollOutcome::Idle => {
					failures = 0;
					self.idle_interval
				}
				PollOutcome::BrokerUnavailable => {
					failures = failures.saturating_add(1);
					let delay = self.backoff.delay(failures);
					tracing::debug!(service = %self.name, failures, delay_ms = delay.as_millis() as u64, "dispatcher.run.backoff");
					delay
				}
				PollOutcome::Raced | PollOutcome::Finished | PollOutcome::Failed => {
					failures = 0;
					Duration::ZERO
				}
			};

			if delay > Duration::ZERO {
				tokio::select! {
					_ = cancel.cancelled() => break,
					_ = tokio::time::sleep(delay) => {}
				}
			}
		}

		tracing::info!(service = %self.name, stats = ?self.stats(), "dispatcher.run.stopped");
	}

	async fn route(&self, dequeued: Dequeued) -> PollOutcome {
		match dequeued {
			Dequeued::Malformed { payload, error } => {
				tracing::warn!(service = %self.name, error = %error, "dispatcher.poll.malformed");
				self.fail(payload).await
			}
			Dequeued::Invalid { payload, envelope, error } => {
				tracing::warn!(service = %self.name, call = %envelope.describe(), error = %error, "dispatcher.poll.rejected");
				self.fail(payload).await
			}
			Dequeued::Ready { payload, envelope } => match self.invoke(&envelope).await {
				Ok(()) => self.finish(envelope, payload).await,
				Err(failure) => {
					let call = envelope.describe();
					match &failure {
						InvocationFailure::Panicked(_) => {
							tracing::error!(service = %self.name, method = %envelope.method_name, %call, error = %failure, "dispatcher.invoke.panicked");
						}
						_ => {
							tracing::warn!(service = %self.name, method = %envelope.method_name, %call, error = %failure, "dispatcher.invoke.failed");
						}
					}
					self.fail(payload).await
				}
			},
		}
	}

	async fn finish(&self, envelope: CallEnvelope, payload: String) -> PollOutcome {
		let now = unix_now();
		let executed_at = envelope.enqueued_at.map_or(now, |enqueued| now.max(enqueued));
		let envelope = envelope.executed(executed_at);
		let record = match wire::encode(&envelope) {
			Ok(record) => record,
			Err(error) => {
				tracing::warn!(service = %self.name, call = %envelope.describe(), error = %error, "dispatcher.finish.encode_failed");
				return self.fail(payload).await;
			}
		};

		if let Err(error) = self.broker.append(&self.keys.finished, record).await {
			self.stats.record_broker_error();
			tracing::error!(service = %self.name, queue = %self.keys.finished, %payload, error = %error, "dispatcher.finish.append_failed");
			return PollOutcome::BrokerUnavailable;
		}
		self.stats.record_finished();
		tracing::info!(service = %self.name, call = %envelope.describe(), "dispatcher.finished");
		PollOutcome::Finished
	}

	async fn fail(&self, payload: String) -> PollOutcome {
		if let Err(error) = self.broker.append(&self.keys.failed, payload.clone()).await {
			self.stats.record_broker_error();
			tracing::error!(service = %self.name, queue = %self.keys.failed, %payload, error = %error, "dispatcher.fail.append_failed");
			return PollOutcome::BrokerUnavailable;
		}
		self.stats.record_failed();
		PollOutcome::Failed
	}
}
