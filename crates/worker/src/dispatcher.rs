use std::time::Duration;

use crush_broker::{Broker, BrokerError, QueueKeys};
use crush_invocation::{CallEnvelope, Value, WireError, wire};
use crush_registry::{ServiceHandle, ValidationError};

use crate::config::{BackoffPolicy, WorkerConfig};
use crate::error::{DispatchError, InvocationFailure};
use crate::fault;
use crate::stats::{DispatchStats, StatsSnapshot};

/// A payload popped from the pending queue.
///
/// The raw payload is kept in every case so that failures can be appended to
/// the failed queue exactly as they were read. Payloads that are not UTF-8
/// are the exception and are kept in lossy form.
#[derive(Debug)]
pub enum Dequeued {
	/// Decoded and valid against the bound service.
	Ready { payload: String, envelope: CallEnvelope },
	/// Decoded, but the service rejects the call.
	Invalid {
		payload: String,
		envelope: CallEnvelope,
		error: ValidationError,
	},
	/// The payload could not be decoded.
	Malformed { payload: String, error: WireError },
}

impl Dequeued {
	pub fn payload(&self) -> &str {
		match self {
			Self::Ready { payload, .. } | Self::Invalid { payload, .. } | Self::Malformed { payload, .. } => payload,
		}
	}

	pub fn envelope(&self) -> Option<&CallEnvelope> {
		match self {
			Self::Ready { envelope, .. } | Self::Invalid { envelope, .. } => Some(envelope),
			Self::Malformed { .. } => None,
		}
	}
}

/// Binds one service to its pending, finished and failed queues.
#[derive(Debug)]
pub struct Dispatcher<B> {
	pub(crate) service: ServiceHandle,
	pub(crate) broker: B,
	pub(crate) name: String,
	pub(crate) keys: QueueKeys,
	pub(crate) idle_interval: Duration,
	pub(crate) backoff: BackoffPolicy,
	pub(crate) invoke_timeout: Option<Duration>,
	pub(crate) stats: DispatchStats,
}

impl<B: Broker> Dispatcher<B> {
	/// Creates a dispatcher after checking that the broker answers.
	///
	/// Queue names use `config.service` when set, else the handle's name.
	pub async fn connect(service: ServiceHandle, broker: B, config: &WorkerConfig) -> Result<Self, DispatchError> {
		config.validate()?;
		let name = config.service.clone().unwrap_or_else(|| service.name().to_string());
		let keys = QueueKeys::new(&config.queues, &name);

		if let Err(error) = broker.ping().await {
			tracing::error!(service = %name, error = %error, "dispatcher.connect.failed");
			return Err(error.into());
		}

		tracing::info!(service = %name, pending = %keys.pending, methods = ?service.method_names(), "dispatcher.connected");
		Ok(Self {
			service,
			broker,
			name,
			keys,
			idle_interval: config.idle_interval(),
			backoff: config.backoff.clone(),
			invoke_timeout: config.invoke_timeout(),
			stats: DispatchStats::default(),
		})
	}

	/// Name used in queue keys.
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn service(&self) -> &ServiceHandle {
		&self.service
	}

	pub fn broker(&self) -> &B {
		&self.broker
	}

	pub fn keys(&self) -> &QueueKeys {
		&self.keys
	}

	pub fn stats(&self) -> StatsSnapshot {
		self.stats.snapshot()
	}

	/// Validates a call and appends it to the pending queue.
	///
	/// Nothing is written when validation or encoding fails.
	pub async fn enqueue(&self, method_name: impl Into<String>, args: Vec<Value>) -> Result<CallEnvelope, DispatchError> {
		let envelope = CallEnvelope::new(method_name, args).enqueued(unix_now());
		if let Err(error) = self.service.validate(&envelope) {
			tracing::warn!(service = %self.name, call = %envelope.describe(), error = %error, "dispatcher.enqueue.rejected");
			return Err(error.into());
		}
		let payload = wire::encode(&envelope)?;
		self.broker.append(&self.keys.pending, payload).await?;
		self.stats.record_enqueued();
		tracing::debug!(service = %self.name, call = %envelope.describe(), "dispatcher.enqueued");
		Ok(envelope)
	}

	/// Pops the head of the pending queue, if any, and classifies it.
	pub async fn dequeue(&self) -> Result<Option<Dequeued>, BrokerError> {
		let Some(raw) = self.broker.pop_head(&self.keys.pending).await? else {
			return Ok(None);
		};
		let dequeued = match String::from_utf8(raw) {
			Err(err) => Dequeued::Malformed {
				error: WireError::InvalidUtf8(err.utf8_error()),
				payload: String::from_utf8_lossy(err.as_bytes()).into_owned(),
			},
			Ok(payload) => match wire::decode(&payload) {
				Err(error) => Dequeued::Malformed { payload, error },
				Ok(envelope) => match self.service.validate(&envelope) {
					Ok(_) => Dequeued::Ready { payload, envelope },
					Err(error) => Dequeued::Invalid { payload, envelope, error },
				},
			},
		};
		tracing::debug!(service = %self.name, call = ?dequeued.envelope().map(CallEnvelope::describe), "dispatcher.dequeued");
		Ok(Some(dequeued))
	}

	/// Revalidates `envelope` and runs it behind the panic boundary.
	pub async fn invoke(&self, envelope: &CallEnvelope) -> Result<(), InvocationFailure> {
		let method = self.service.resolve(envelope)?;
		fault::invoke_guarded(method, envelope.args.clone(), self.invoke_timeout).await
	}
}

/// Current time in unix seconds.
pub(crate) fn unix_now() -> i64 {
	chrono::Utc::now().timestamp()
}
