use std::fmt;
use std::sync::Arc;

use crush_invocation::{CallEnvelope, Value, ValueKind};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::handler::{Handler, HandlerError};
use crate::validate::{ValidationError, validate};

type ErasedHandler = Arc<dyn Fn(&[Value]) -> Result<(), HandlerError> + Send + Sync>;

/// Arity and ordered parameter kinds of one registered method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
	param_types: Vec<ValueKind>,
}

impl MethodDescriptor {
	pub fn new(param_types: Vec<ValueKind>) -> Self {
		Self { param_types }
	}

	/// Number of positional parameters.
	pub fn arity(&self) -> usize {
		self.param_types.len()
	}

	/// Declared parameter kinds, in order.
	pub fn param_types(&self) -> &[ValueKind] {
		&self.param_types
	}
}

/// Errors raised while building a [`ServiceHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	#[error("service name must not be empty")]
	EmptyServiceName,
	#[error("method name must not be empty in service '{service}'")]
	EmptyMethodName { service: String },
	#[error("method '{method}' registered twice in service '{service}'")]
	DuplicateMethod { service: String, method: String },
}

struct MethodEntry {
	descriptor: MethodDescriptor,
	call: ErasedHandler,
}

/// A resolved method, detached from the handle so it can run on another thread.
#[derive(Clone)]
pub struct BoundMethod {
	name: String,
	call: ErasedHandler,
}

impl BoundMethod {
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Calls the handler with positional arguments.
	pub fn call(&self, args: &[Value]) -> Result<(), HandlerError> {
		(self.call)(args)
	}
}

impl fmt::Debug for BoundMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BoundMethod").field("name", &self.name).finish_non_exhaustive()
	}
}

/// Binding to a service's invocable methods.
///
/// Lookups are answered from the handlers themselves, so descriptors always
/// describe what the bound instance will actually accept.
pub struct ServiceHandle {
	name: String,
	methods: FxHashMap<String, MethodEntry>,
}

impl ServiceHandle {
	/// Starts building a handle for the named service.
	pub fn builder(name: impl Into<String>) -> ServiceBuilder {
		ServiceBuilder {
			name: name.into(),
			methods: Vec::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Looks up a method's descriptor by name.
	pub fn lookup(&self, method: &str) -> Option<&MethodDescriptor> {
		self.methods.get(method).map(|entry| &entry.descriptor)
	}

	/// Returns registered method names sorted alphabetically.
	pub fn method_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	/// Checks `envelope` against this service. See [`validate`].
	pub fn validate(&self, envelope: &CallEnvelope) -> Result<&MethodDescriptor, ValidationError> {
		validate(envelope, self)
	}

	/// Validates `envelope` and returns the method it targets.
	pub fn resolve(&self, envelope: &CallEnvelope) -> Result<BoundMethod, ValidationError> {
		validate(envelope, self)?;
		let entry = self
			.methods
			.get(&envelope.method_name)
			.ok_or_else(|| ValidationError::MethodNotFound {
				service: self.name.clone(),
				method: envelope.method_name.clone(),
			})?;
		Ok(BoundMethod {
			name: envelope.method_name.clone(),
			call: Arc::clone(&entry.call),
		})
	}
}

impl fmt::Debug for ServiceHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServiceHandle")
			.field("name", &self.name)
			.field("methods", &self.method_names())
			.finish()
	}
}

/// Builder for [`ServiceHandle`].
pub struct ServiceBuilder {
	name: String,
	methods: Vec<(String, MethodEntry)>,
}

impl ServiceBuilder {
	/// Registers a method. Parameter kinds come from the handler signature.
	#[must_use]
	pub fn method<Args, H>(mut self, name: impl Into<String>, handler: H) -> Self
	where
		H: Handler<Args>,
		Args: 'static,
	{
		let descriptor = MethodDescriptor::new(handler.param_kinds());
		let call: ErasedHandler = Arc::new(move |args: &[Value]| handler.call(args));
		self.methods.push((name.into(), MethodEntry { descriptor, call }));
		self
	}

	/// Finishes the handle, rejecting empty or duplicate names.
	pub fn build(self) -> Result<ServiceHandle, RegistryError> {
		if self.name.is_empty() {
			return Err(RegistryError::EmptyServiceName);
		}
		let mut methods = FxHashMap::default();
		for (method, entry) in self.methods {
			if method.is_empty() {
				return Err(RegistryError::EmptyMethodName { service: self.name });
			}
			if methods.contains_key(&method) {
				return Err(RegistryError::DuplicateMethod { service: self.name, method });
			}
			methods.insert(method, entry);
		}
		Ok(ServiceHandle { name: self.name, methods })
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;

	use crush_invocation::args;
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::Service;

	struct Calculator {
		log: Mutex<Vec<String>>,
	}

	impl Service for Calculator {
		fn name(&self) -> &str {
			"Calculator"
		}

		fn register(self: Arc<Self>, methods: ServiceBuilder) -> ServiceBuilder {
			methods.method("Multiply", move |a: f64, b: f64| {
				self.log.lock().unwrap().push(format!("{}", a * b));
			})
		}
	}

	#[test]
	fn lookup_reflects_registered_signatures() {
		let service = ServiceHandle::builder("MyService")
			.method("Multiply", |_: f64, _: f64| {})
			.method("Fibonacci", |_: i64| {})
			.method("Explode", || {})
			.build()
			.unwrap();

		assert_eq!(service.lookup("Multiply").unwrap().param_types(), &[ValueKind::Float, ValueKind::Float]);
		assert_eq!(service.lookup("Fibonacci").unwrap().arity(), 1);
		assert_eq!(service.lookup("Explode").unwrap().arity(), 0);
		assert!(service.lookup("Derp").is_none());
		assert_eq!(service.lookup("Multiply"), service.lookup("Multiply"));
		assert_eq!(service.method_names(), vec!["Explode", "Fibonacci", "Multiply"]);
	}

	#[test]
	fn build_rejects_bad_names() {
		let dup = ServiceHandle::builder("S").method("A", || {}).method("A", |_: i64| {}).build();
		assert_eq!(
			dup.unwrap_err(),
			RegistryError::DuplicateMethod {
				service: "S".into(),
				method: "A".into(),
			}
		);
		assert_eq!(ServiceHandle::builder("").build().unwrap_err(), RegistryError::EmptyServiceName);
		assert!(matches!(
			ServiceHandle::builder("S").method("", || {}).build(),
			Err(RegistryError::EmptyMethodName { .. })
		));
	}

	#[test]
	fn bound_service_reaches_live_instance() {
		let calc = Arc::new(Calculator { log: Mutex::new(Vec::new()) });
		let service = crate::bind(Arc::clone(&calc)).unwrap();
		assert_eq!(service.name(), "Calculator");

		let method = service.resolve(&CallEnvelope::new("Multiply", args![2.0, 4.0])).unwrap();
		assert_eq!(method.name(), "Multiply");
		method.call(&args![2.0, 4.0]).unwrap();
		assert_eq!(*calc.log.lock().unwrap(), vec!["8".to_string()]);
	}

	#[test]
	fn resolve_validates_first() {
		let service = ServiceHandle::builder("S").method("Fibonacci", |_: i64| {}).build().unwrap();
		let err = service.resolve(&CallEnvelope::new("Fibonacci", args![12.0])).unwrap_err();
		assert!(matches!(err, ValidationError::TypeMismatch { index: 0, .. }));
	}
}
