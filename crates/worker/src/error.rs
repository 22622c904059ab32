use std::time::Duration;

use crush_broker::BrokerError;
use crush_invocation::WireError;
use crush_registry::{HandlerError, ValidationError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::fault::PanicPayload;

/// Why a dequeued call did not complete.
#[derive(Debug, Error)]
pub enum InvocationFailure {
	/// The call no longer matches the bound service.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// The handler returned an error.
	#[error("handler returned an error: {0}")]
	Returned(#[source] HandlerError),
	/// The handler panicked.
	#[error("handler panicked: {0}")]
	Panicked(PanicPayload),
	/// The handler exceeded the configured invoke timeout.
	#[error("handler timed out after {0:?}")]
	TimedOut(Duration),
	/// The handler task was torn down before it finished.
	#[error("handler aborted: {0}")]
	Aborted(String),
}

/// Errors surfaced synchronously by dispatcher operations.
#[derive(Debug, Error)]
pub enum DispatchError {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error(transparent)]
	Serialization(#[from] WireError),
	#[error(transparent)]
	Broker(#[from] BrokerError),
	#[error(transparent)]
	Config(#[from] ConfigError),
}
