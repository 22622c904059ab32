use crush_invocation::{CallEnvelope, ValueKind};
use thiserror::Error;

use crate::service::{MethodDescriptor, ServiceHandle};

/// Reasons a call envelope is rejected before execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	/// The service has no method with this name.
	#[error("method not found: {service}.{method}")]
	MethodNotFound { service: String, method: String },
	/// Argument count differs from the declared arity.
	#[error("incorrect number of arguments for {method}: expected {expected}, got {got}")]
	ArityMismatch { method: String, expected: usize, got: usize },
	/// An argument's kind differs from the declared parameter kind.
	#[error("type mismatch for {method} argument {index}: expected {expected}, got {got}")]
	TypeMismatch {
		method: String,
		index: usize,
		expected: ValueKind,
		got: ValueKind,
	},
}

/// Checks a call against the service's registered methods.
///
/// Checks short-circuit in order: method exists, argument count equals the
/// declared arity exactly, then each argument kind equals its parameter kind
/// exactly. There is no variadic, default-argument, or numeric widening
/// leniency.
pub fn validate<'a>(envelope: &CallEnvelope, service: &'a ServiceHandle) -> Result<&'a MethodDescriptor, ValidationError> {
	let method = &envelope.method_name;
	let descriptor = service.lookup(method).ok_or_else(|| ValidationError::MethodNotFound {
		service: service.name().to_string(),
		method: method.clone(),
	})?;

	if envelope.args.len() != descriptor.arity() {
		return Err(ValidationError::ArityMismatch {
			method: method.clone(),
			expected: descriptor.arity(),
			got: envelope.args.len(),
		});
	}

	let mismatch = envelope
		.args
		.iter()
		.zip(descriptor.param_types())
		.position(|(arg, &kind)| !arg.matches_kind(kind));
	if let Some(index) = mismatch {
		return Err(ValidationError::TypeMismatch {
			method: method.clone(),
			index,
			expected: descriptor.param_types()[index],
			got: envelope.args[index].kind(),
		});
	}

	Ok(descriptor)
}
