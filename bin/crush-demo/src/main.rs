//! Crush demo worker.
//!
//! Registers a small sample service, enqueues a batch of calls against it,
//! and then drains the pending queue until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crush_worker::{Broker, Dispatcher, MemoryBroker, Service, ServiceBuilder, WorkerConfig, args, bind};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Demo command line arguments.
#[derive(Parser, Debug)]
#[command(name = "crush-demo")]
#[command(about = "Enqueue sample calls and run a worker over them")]
struct Args {
	/// Worker configuration file (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Broker address, overriding the configuration
	#[arg(short, long, value_name = "URL")]
	broker: Option<String>,

	/// Use an in-process broker instead of Redis
	#[arg(long)]
	memory: bool,

	/// Skip enqueueing the sample calls
	#[arg(long)]
	no_seed: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

struct MyService;

impl MyService {
	fn execute(i: f64, j: f64) {
		println!("i*j is {:.2}", i * j);
	}

	fn fibonacci(n: i64) -> anyhow::Result<()> {
		let steps = u32::try_from(n).context("n must be a non-negative 32-bit integer")?;
		let (mut a, mut b) = (0_u128, 1_u128);
		for _ in 0..steps {
			let next = a.checked_add(b).with_context(|| format!("fibonacci({n}) does not fit in 128 bits"))?;
			a = b;
			b = next;
		}
		println!("Fn for n={n} is {a}");
		Ok(())
	}
}

impl Service for MyService {
	fn name(&self) -> &str {
		"MyService"
	}

	fn register(self: Arc<Self>, methods: ServiceBuilder) -> ServiceBuilder {
		methods
			.method("Execute", Self::execute)
			.method("Fibonacci", |n: i64| Self::fibonacci(n).map_err(|error| format!("{error:#}")))
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	let mut config = match &args.config {
		Some(path) => WorkerConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => {
			let mut config = WorkerConfig::default();
			config.apply_env(|key| std::env::var(key).ok());
			config
		}
	};
	if let Some(url) = args.broker.clone() {
		config.broker_url = url;
	}

	let service = bind(Arc::new(MyService))?;

	if args.memory {
		let dispatcher = Dispatcher::connect(service, MemoryBroker::new(), &config).await?;
		return drive(&dispatcher, args.no_seed).await;
	}
	connect_and_drive(service, &config, args.no_seed).await
}

#[cfg(feature = "redis")]
async fn connect_and_drive(service: crush_worker::ServiceHandle, config: &WorkerConfig, no_seed: bool) -> anyhow::Result<()> {
	let dispatcher = crush_worker::connect_redis(service, config)
		.await
		.with_context(|| format!("connecting to {}", config.broker_url))?;
	drive(&dispatcher, no_seed).await
}

#[cfg(not(feature = "redis"))]
async fn connect_and_drive(_service: crush_worker::ServiceHandle, _config: &WorkerConfig, _no_seed: bool) -> anyhow::Result<()> {
	anyhow::bail!("built without Redis support; pass --memory")
}

async fn drive<B: Broker>(dispatcher: &Dispatcher<B>, no_seed: bool) -> anyhow::Result<()> {
	if !no_seed {
		seed(dispatcher).await?;
	}

	let shutdown = CancellationToken::new();
	let on_signal = shutdown.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("interrupt received, stopping after the current call");
		}
		on_signal.cancel();
	});

	dispatcher.run_until_cancelled(&shutdown).await;
	let stats = dispatcher.stats();
	info!(finished = stats.finished, failed = stats.failed, "demo stopped");
	Ok(())
}

async fn seed<B: Broker>(dispatcher: &Dispatcher<B>) -> anyhow::Result<()> {
	dispatcher.enqueue("Execute", args![1.1, 2.3]).await?;
	dispatcher.enqueue("Fibonacci", args![10_i64]).await?;
	dispatcher.enqueue("Execute", args![1.1, 2.4]).await?;
	dispatcher.enqueue("Fibonacci", args![20_i64]).await?;
	dispatcher.enqueue("Execute", args![1.1, 2.5]).await?;
	dispatcher.enqueue("Fibonacci", args![30_i64]).await?;
	dispatcher.enqueue("Execute", args![1.1, 2.6]).await?;
	dispatcher.enqueue("Fibonacci", args![40_i64]).await?;
	info!(service = dispatcher.name(), queue = %dispatcher.keys().pending, "sample calls enqueued");
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("crush_worker=trace,crush_broker=debug,info")
		} else {
			EnvFilter::new("info")
		}
	});
	tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
