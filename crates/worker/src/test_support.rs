use std::sync::{Arc, Mutex};
use std::time::Duration;

use crush_broker::MemoryBroker;
use crush_registry::{HandlerError, Service, ServiceBuilder, bind};

use crate::config::WorkerConfig;
use crate::dispatcher::Dispatcher;

/// Sample service whose handlers record their results.
#[derive(Default)]
pub(crate) struct MyService {
	log: Mutex<Vec<String>>,
}

impl MyService {
	pub(crate) fn log(&self) -> Vec<String> {
		self.log.lock().unwrap().clone()
	}

	fn record(&self, entry: String) {
		self.log.lock().unwrap().push(entry);
	}

	fn fibonacci(&self, n: i64) -> Result<(), String> {
		if n < 0 {
			return Err(format!("fibonacci of negative number {n}"));
		}
		let (mut a, mut b) = (0_u128, 1_u128);
		for _ in 0..n {
			let next = a.checked_add(b).ok_or_else(|| format!("fibonacci({n}) overflows"))?;
			a = b;
			b = next;
		}
		self.record(a.to_string());
		Ok(())
	}
}

fn explode(message: String) {
	panic!("{message}");
}

fn smuggle(message: String) {
	std::panic::panic_any(HandlerError::from(message));
}

fn refuse(reason: String) -> Result<(), String> {
	Err(reason)
}

fn stall(ms: i64) {
	std::thread::sleep(Duration::from_millis(ms.unsigned_abs()));
}

impl Service for MyService {
	fn name(&self) -> &str {
		"MyService"
	}

	fn register(self: Arc<Self>, methods: ServiceBuilder) -> ServiceBuilder {
		let multiply = Arc::clone(&self);
		let concat = Arc::clone(&self);
		methods
			.method("Multiply", move |a: f64, b: f64| multiply.record(format!("{}", a * b)))
			.method("Concat", move |a: String, b: String| concat.record(a + &b))
			.method("Fibonacci", move |n: i64| self.fibonacci(n))
			.method("Explode", explode)
			.method("Smuggle", smuggle)
			.method("Refuse", refuse)
			.method("Stall", stall)
	}
}

pub(crate) async fn dispatcher_with(config: &WorkerConfig) -> (Arc<MyService>, Dispatcher<MemoryBroker>) {
	let service = Arc::new(MyService::default());
	let handle = bind(Arc::clone(&service)).unwrap();
	let dispatcher = Dispatcher::connect(handle, MemoryBroker::new(), config).await.unwrap();
	(service, dispatcher)
}

pub(crate) async fn dispatcher() -> (Arc<MyService>, Dispatcher<MemoryBroker>) {
	dispatcher_with(&WorkerConfig::default()).await
}
