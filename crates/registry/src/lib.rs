//! Method registry for services that accept deferred calls.
//!
//! A service is exposed to the dispatcher as a [`ServiceHandle`]: an explicit
//! map from method names to typed handler functions. Parameter kinds are taken
//! from each handler's Rust signature, so the [`MethodDescriptor`] returned by
//! [`ServiceHandle::lookup`] always agrees with what the handler will decode.
//!
//! ```
//! use crush_invocation::{CallEnvelope, args};
//! use crush_registry::{ServiceHandle, ValidationError};
//!
//! let service = ServiceHandle::builder("MyService")
//! 	.method("Multiply", |a: f64, b: f64| {
//! 		let _ = a * b;
//! 	})
//! 	.build()
//! 	.unwrap();
//!
//! assert_eq!(service.lookup("Multiply").map(|d| d.arity()), Some(2));
//! assert!(service.validate(&CallEnvelope::new("Multiply", args![1.1, 2.5])).is_ok());
//! assert!(matches!(
//! 	service.validate(&CallEnvelope::new("Multiply", args![1_i64, 2_i64])),
//! 	Err(ValidationError::TypeMismatch { index: 0, .. })
//! ));
//! ```

use std::sync::Arc;

mod handler;
mod service;
mod validate;

pub use handler::{ArgumentError, FromValue, Handler, HandlerError, IntoHandlerResult};
pub use service::{BoundMethod, MethodDescriptor, RegistryError, ServiceBuilder, ServiceHandle};
pub use validate::{ValidationError, validate};

/// A service object that registers its own methods.
///
/// Handlers usually capture a clone of the `Arc` so that every call reaches
/// the same live instance.
pub trait Service: Send + Sync + 'static {
	/// Name used for queue keys and diagnostics.
	fn name(&self) -> &str;

	/// Adds this service's invocable methods to `methods`.
	fn register(self: Arc<Self>, methods: ServiceBuilder) -> ServiceBuilder;
}

/// Binds a [`Service`] instance into a [`ServiceHandle`].
pub fn bind<S: Service>(service: Arc<S>) -> Result<ServiceHandle, RegistryError> {
	let builder = ServiceHandle::builder(service.name());
	service.register(builder).build()
}
