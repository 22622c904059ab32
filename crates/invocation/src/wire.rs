//! JSON wire form of [`CallEnvelope`].
//!
//! The record is kept human-readable so queue contents can be inspected with
//! ordinary broker tooling:
//!
//! ```text
//! {"MethodName":"Multiply","Args":[1.1,2.5],"Enqueued":1700000000,"Executed":0}
//! ```
//!
//! A timestamp of `0` means unset. Unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

use crate::{CallEnvelope, Value};

/// Validation limits applied to wire records, shared by encode and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
	/// Max size of one serialized record in bytes.
	pub max_payload_len: usize,
	/// Max positional args per call.
	pub max_args: usize,
	/// Max byte length for the method name and each string argument.
	pub max_string_len: usize,
}

/// Default limits for records moving through the broker.
pub const DEFAULT_LIMITS: DecodeLimits = DecodeLimits {
	max_payload_len: 1024 * 1024,
	max_args: 64,
	max_string_len: 64 * 1024,
};

/// Errors raised while converting envelopes to or from the wire form.
#[derive(Debug, Error)]
pub enum WireError {
	/// The payload is not a well-formed envelope record.
	#[error("malformed envelope: {0}")]
	Malformed(#[from] serde_json::Error),
	/// The serialized record is larger than allowed.
	#[error("payload exceeds {limit} bytes")]
	PayloadTooLarge { limit: usize },
	/// The method name is empty.
	#[error("MethodName: must not be empty")]
	EmptyMethodName,
	/// The call carries more arguments than allowed.
	#[error("Args: exceeds {limit} args")]
	TooManyArgs { limit: usize },
	/// A string field is longer than allowed.
	#[error("{field}: exceeds {limit} bytes")]
	StringTooLong { field: String, limit: usize },
	/// An integer literal does not fit in `i64`.
	#[error("Args[{index}]: integer literal outside the i64 range")]
	IntegerOutOfRange { index: usize },
	/// The payload bytes are not UTF-8.
	#[error("payload is not valid UTF-8: {0}")]
	InvalidUtf8(#[from] std::str::Utf8Error),
	/// NaN and infinities have no JSON representation.
	#[error("Args[{index}]: non-finite float cannot be encoded")]
	NonFiniteFloat { index: usize },
}

#[derive(Serialize)]
struct WireRecordRef<'a> {
	#[serde(rename = "MethodName")]
	method_name: &'a str,
	#[serde(rename = "Args")]
	args: &'a [Value],
	#[serde(rename = "Enqueued")]
	enqueued: i64,
	#[serde(rename = "Executed")]
	executed: i64,
}

#[derive(Deserialize)]
struct WireRecord<'a> {
	#[serde(rename = "MethodName")]
	method_name: String,
	#[serde(rename = "Args", borrow)]
	args: Vec<&'a RawValue>,
	#[serde(rename = "Enqueued", default)]
	enqueued: i64,
	#[serde(rename = "Executed", default)]
	executed: i64,
}

/// Serializes an envelope using [`DEFAULT_LIMITS`].
pub fn encode(envelope: &CallEnvelope) -> Result<String, WireError> {
	encode_with_limits(envelope, &DEFAULT_LIMITS)
}

/// Serializes an envelope, rejecting anything a worker would refuse to decode.
pub fn encode_with_limits(envelope: &CallEnvelope, limits: &DecodeLimits) -> Result<String, WireError> {
	if let Some(index) = envelope.args.iter().position(|arg| matches!(arg, Value::Float(v) if !v.is_finite())) {
		return Err(WireError::NonFiniteFloat { index });
	}
	check_limits(&envelope.method_name, &envelope.args, limits)?;

	let payload = serde_json::to_string(&WireRecordRef {
		method_name: &envelope.method_name,
		args: &envelope.args,
		enqueued: envelope.enqueued_at.unwrap_or(0),
		executed: envelope.executed_at.unwrap_or(0),
	})?;
	if payload.len() > limits.max_payload_len {
		return Err(WireError::PayloadTooLarge { limit: limits.max_payload_len });
	}
	Ok(payload)
}

/// Deserializes an envelope using [`DEFAULT_LIMITS`].
pub fn decode(payload: &str) -> Result<CallEnvelope, WireError> {
	decode_with_limits(payload, &DEFAULT_LIMITS)
}

/// Deserializes an envelope, reconciling bare numeric literals into
/// [`Value::Int`] or [`Value::Float`].
///
/// Timestamps are restored verbatim, never recomputed.
pub fn decode_with_limits(payload: &str, limits: &DecodeLimits) -> Result<CallEnvelope, WireError> {
	if payload.len() > limits.max_payload_len {
		return Err(WireError::PayloadTooLarge { limit: limits.max_payload_len });
	}
	let record: WireRecord<'_> = serde_json::from_str(payload)?;
	let args = record
		.args
		.iter()
		.enumerate()
		.map(|(index, raw)| reconcile(index, raw))
		.collect::<Result<Vec<_>, _>>()?;
	check_limits(&record.method_name, &args, limits)?;

	Ok(CallEnvelope {
		method_name: record.method_name,
		args,
		enqueued_at: unset_if_zero(record.enqueued),
		executed_at: unset_if_zero(record.executed),
	})
}

/// Classifies one argument from its literal text.
///
/// A number written without fraction or exponent is an integer and must fit
/// in `i64`; every other literal goes through [`Value`]'s deserializer.
fn reconcile(index: usize, raw: &RawValue) -> Result<Value, WireError> {
	let text = raw.get();
	let is_number = text.starts_with(|c: char| c == '-' || c.is_ascii_digit());
	if is_number && !text.contains(['.', 'e', 'E']) {
		return text.parse().map(Value::Int).map_err(|_| WireError::IntegerOutOfRange { index });
	}
	Ok(serde_json::from_str(text)?)
}

fn unset_if_zero(ts: i64) -> Option<i64> {
	(ts != 0).then_some(ts)
}

fn check_limits(method_name: &str, args: &[Value], limits: &DecodeLimits) -> Result<(), WireError> {
	if method_name.is_empty() {
		return Err(WireError::EmptyMethodName);
	}
	if method_name.len() > limits.max_string_len {
		return Err(WireError::StringTooLong {
			field: "MethodName".to_string(),
			limit: limits.max_string_len,
		});
	}
	if args.len() > limits.max_args {
		return Err(WireError::TooManyArgs { limit: limits.max_args });
	}
	let oversized = args
		.iter()
		.position(|arg| matches!(arg, Value::String(s) if s.len() > limits.max_string_len));
	if let Some(i) = oversized {
		return Err(WireError::StringTooLong {
			field: format!("Args[{i}]"),
			limit: limits.max_string_len,
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests;
