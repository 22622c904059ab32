use crate::Value;

/// A deferred method call plus its lifecycle timestamps.
///
/// Timestamps are unix seconds. `enqueued_at` is stamped by the producer and
/// `executed_at` by the worker once the call completes successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct CallEnvelope {
	/// Name of the target method on the bound service.
	pub method_name: String,
	/// Positional arguments.
	pub args: Vec<Value>,
	/// When the call was accepted into the pending queue.
	pub enqueued_at: Option<i64>,
	/// When the call finished executing.
	pub executed_at: Option<i64>,
}

impl CallEnvelope {
	/// Creates an unstamped envelope.
	pub fn new(method_name: impl Into<String>, args: Vec<Value>) -> Self {
		Self {
			method_name: method_name.into(),
			args,
			enqueued_at: None,
			executed_at: None,
		}
	}

	/// Returns a copy stamped with the given enqueue time.
	#[must_use]
	pub fn enqueued(mut self, at: i64) -> Self {
		self.enqueued_at = Some(at);
		self
	}

	/// Returns a copy stamped with the given execution time.
	#[must_use]
	pub fn executed(mut self, at: i64) -> Self {
		self.executed_at = Some(at);
		self
	}

	/// Short description for tracing/logging.
	pub fn describe(&self) -> String {
		let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
		format!("{}({})", self.method_name, args.join(", "))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn describe_renders_call_syntax() {
		let envelope = CallEnvelope::new("Concat", crate::args!["hello, ", "world"]);
		assert_eq!(envelope.describe(), "Concat(\"hello, \", \"world\")");
		assert_eq!(CallEnvelope::new("Explode", Vec::new()).describe(), "Explode()");
	}

	#[test]
	fn stamps_are_independent() {
		let envelope = CallEnvelope::new("Fibonacci", crate::args![10_i64]).enqueued(100).executed(105);
		assert_eq!(envelope.enqueued_at, Some(100));
		assert_eq!(envelope.executed_at, Some(105));
	}
}
