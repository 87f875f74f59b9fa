use std::{future::Future, path::Path, sync::Arc, time::Duration};

use missive_common::{Signal, internal, logging};
use missive_delivery::{DeliveryWorker, SummaryReporter, WorkerConfig, WorkerCounters};
use missive_directory::{DirectoryConfig, SenderDirectory};
use missive_queue::{JobQueue, QueueConfig};
use missive_tracing::traced;
use missive_transport::{GraphConfig, GraphTransport, MailTransport};
use serde::Deserialize;
use tokio::{sync::broadcast, task::JoinSet};

/// Top-level configuration of a worker process
///
/// ```ron
/// Missive (
///     queue: (type: "JetStream", url: "nats://127.0.0.1:4222"),
///     directory: (type: "Postgres", url: "postgres://missive@localhost/missive"),
///     transport: (tenant_id: "...", client_id: "..."),
///     worker: (concurrency: 2),
/// )
/// ```
#[derive(Debug, Deserialize)]
pub struct Missive {
    #[serde(default)]
    queue: QueueConfig,
    #[serde(default)]
    directory: DirectoryConfig,
    transport: GraphConfig,
    #[serde(default)]
    worker: WorkerConfig,
}

/// Resolves on the first SIGINT or SIGTERM
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()> + Send> {
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                internal!("CTRL+C entered, shutting down");
            }
            _ = terminate.recv() => {
                internal!("Terminate Signal received, shutting down");
            }
        };
    })
}

impl Missive {
    /// Read and parse a RON config file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config from {}: {e}", path.display())
        })?;

        Ok(ron::from_str(&content)?)
    }

    pub const fn queue(&self) -> &QueueConfig {
        &self.queue
    }

    pub const fn directory(&self) -> &DirectoryConfig {
        &self.directory
    }

    pub const fn transport(&self) -> &GraphConfig {
        &self.transport
    }

    pub const fn worker(&self) -> &WorkerConfig {
        &self.worker
    }

    /// Run the worker pool until SIGINT or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, queue or transport cannot be set
    /// up. Nothing after startup is fatal.
    #[traced(instrument(level = tracing::Level::TRACE, skip_all, err), timing(precision = "s"))]
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init();
        internal!("Controller running");

        let directory = self.directory.connect().await?;
        let queue = self.queue.connect().await?;
        let transport = Arc::new(GraphTransport::new(self.transport)?);

        let pipeline = Pipeline::new(self.worker, queue, directory, transport);
        pipeline.serve(shutdown_signal()?).await;

        internal!("Shutting down...");
        Ok(())
    }
}

/// The worker loops and the summary reporter of one process
#[derive(Debug)]
pub struct Pipeline {
    concurrency: usize,
    worker: DeliveryWorker,
    reporter: SummaryReporter,
}

impl Pipeline {
    pub fn new(
        config: WorkerConfig,
        queue: Arc<dyn JobQueue>,
        directory: Arc<dyn SenderDirectory>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let counters = Arc::new(WorkerCounters::new());
        let reporter = SummaryReporter::new(
            Arc::clone(&queue),
            Arc::clone(&counters),
            Duration::from_secs(config.summary_interval_secs),
        );

        Self {
            concurrency: config.concurrency.max(1),
            worker: DeliveryWorker::new(config, queue, directory, transport, counters),
            reporter,
        }
    }

    pub fn counters(&self) -> &Arc<WorkerCounters> {
        self.worker.counters()
    }

    /// Serve until `stop` completes, then let every loop wind down
    pub async fn serve(self, stop: impl Future<Output = ()> + Send) {
        let (shutdown, _) = broadcast::channel(16);
        let mut tasks = JoinSet::new();

        for id in 0..self.concurrency {
            let worker = self.worker.clone();
            let rx = shutdown.subscribe();
            tasks.spawn(async move { worker.serve(id, rx).await });
        }

        let reporter = self.reporter.clone();
        let rx = shutdown.subscribe();
        tasks.spawn(async move { reporter.serve(rx).await });

        internal!("Started {} delivery worker(s)", self.concurrency);

        stop.await;

        if let Err(e) = shutdown.send(Signal::Shutdown) {
            tracing::error!("Failed to broadcast shutdown: {e}");
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!("Worker task failed: {e}");
            }
        }

        internal!("All workers stopped: {}", self.counters().snapshot());
    }
}
