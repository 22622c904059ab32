//! Panic boundary around handler calls.

use std::any::Any;
use std::fmt;
use std::time::Duration;

use crush_invocation::Value;
use crush_registry::{BoundMethod, HandlerError};
use tokio::task::JoinError;

use crate::error::InvocationFailure;

/// What a panicking handler left behind.
#[derive(Debug)]
pub enum PanicPayload {
	/// An error value raised with [`std::panic::panic_any`].
	Error(HandlerError),
	/// A `panic!` message.
	Message(String),
	/// Any other payload type.
	Unknown,
}

impl PanicPayload {
	/// Classifies a raw panic payload, preferring an attached error over a message.
	pub fn from_any(payload: Box<dyn Any + Send + 'static>) -> Self {
		let payload = match payload.downcast::<HandlerError>() {
			Ok(error) => return Self::Error(*error),
			Err(other) => other,
		};
		let payload = match payload.downcast::<String>() {
			Ok(message) => return Self::Message(*message),
			Err(other) => other,
		};
		match payload.downcast::<&'static str>() {
			Ok(message) => Self::Message((*message).to_string()),
			Err(_) => Self::Unknown,
		}
	}

	/// Extracts the payload from a panicked task. Returns `None` for cancellation.
	pub fn from_join_error(err: JoinError) -> Option<Self> {
		err.try_into_panic().ok().map(Self::from_any)
	}
}

impl fmt::Display for PanicPayload {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Error(error) => write!(f, "{error}"),
			Self::Message(message) => f.write_str(message),
			Self::Unknown => f.write_str("unknown failure"),
		}
	}
}

/// Runs `method` on the blocking pool and converts panics into failures.
///
/// With a `timeout`, the wait is bounded but the blocking thread cannot be
/// interrupted. It finishes in the background and may overlap the calls that
/// follow.
pub(crate) async fn invoke_guarded(method: BoundMethod, args: Vec<Value>, timeout: Option<Duration>) -> Result<(), InvocationFailure> {
	let task = tokio::task::spawn_blocking(move || method.call(&args));
	let joined = match timeout {
		Some(limit) => match tokio::time::timeout(limit, task).await {
			Ok(joined) => joined,
			Err(_) => return Err(InvocationFailure::TimedOut(limit)),
		},
		None => task.await,
	};

	match joined {
		Ok(Ok(())) => Ok(()),
		Ok(Err(error)) => Err(InvocationFailure::Returned(error)),
		Err(err) if err.is_cancelled() => Err(InvocationFailure::Aborted(err.to_string())),
		Err(err) => Err(InvocationFailure::Panicked(PanicPayload::from_join_error(err).unwrap_or(PanicPayload::Unknown))),
	}
}
