//! Deferred-call dispatcher.
//!
//! A [`Dispatcher`] binds one [`ServiceHandle`] to three broker queues
//! (pending, finished, failed). Producers call [`Dispatcher::enqueue`]; a
//! worker process drives [`Dispatcher::run`], which pops one call at a time,
//! revalidates it against the live service, invokes it behind a panic
//! boundary, and appends the outcome to the finished or failed queue.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use crush_worker::{Dispatcher, MemoryBroker, ServiceHandle, WorkerConfig, args};
//!
//! let service = ServiceHandle::builder("MyService")
//! 	.method("Multiply", |a: f64, b: f64| println!("{}", a * b))
//! 	.build()?;
//! let dispatcher = Dispatcher::connect(service, MemoryBroker::new(), &WorkerConfig::default()).await?;
//! dispatcher.enqueue("Multiply", args![1.1, 2.5]).await?;
//! dispatcher.run().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod dispatcher;
mod error;
mod fault;
mod poll;
mod stats;
#[cfg(test)]
mod test_support;

pub use config::{BROKER_URL_ENV, BackoffPolicy, ConfigError, WorkerConfig};
pub use crush_broker::{Broker, BrokerError, MemoryBroker, QueueKeys, QueuePrefixes};
#[cfg(feature = "redis")]
pub use crush_broker::RedisBroker;
pub use crush_invocation::{CallEnvelope, Value, ValueKind, WireError, args};
pub use crush_registry::{HandlerError, MethodDescriptor, RegistryError, Service, ServiceBuilder, ServiceHandle, ValidationError, bind};
pub use dispatcher::{Dequeued, Dispatcher};
pub use error::{DispatchError, InvocationFailure};
pub use fault::PanicPayload;
pub use poll::PollOutcome;
pub use stats::StatsSnapshot;

/// Connects a dispatcher to the Redis server named by `config.broker_url`.
///
/// Connectivity is checked here; an unreachable broker is an error.
#[cfg(feature = "redis")]
pub async fn connect_redis(service: ServiceHandle, config: &WorkerConfig) -> Result<Dispatcher<RedisBroker>, DispatchError> {
	config.validate()?;
	let broker = RedisBroker::connect(&config.broker_url).await?;
	Dispatcher::connect(service, broker, config).await
}

#[cfg(test)]
mod panic_tests;
