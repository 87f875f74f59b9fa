//! Command-line utility for operating Missive
//!
//! - Sender directory management (list, add, remove)
//! - Database migrations
//! - Enqueueing jobs by hand
//! - Queue statistics

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use missive_common::EmailJob;
use missive_directory::{PostgresConfig, PostgresDirectory, SenderDirectory};
use missive_queue::{JetStreamConfig, JetStreamQueue, JobQueue};

/// Command-line utility for operating Missive
#[derive(Parser, Debug)]
#[command(name = "missivectl")]
#[command(about = "Manage Missive senders and queues", long_about = None)]
#[command(version)]
struct Cli {
    /// Postgres connection string (for sender and migrate commands)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// NATS server URL (for queue commands)
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
    nats_url: String,

    /// JetStream stream name
    #[arg(long, default_value = "EMAILS")]
    stream: String,

    /// Subject jobs are published to
    #[arg(long, default_value = "EMAILS.send")]
    subject: String,

    /// Durable consumer name
    #[arg(long, default_value = "EMAIL_WORKER")]
    consumer: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sender directory management
    Senders {
        #[command(subcommand)]
        action: SenderAction,
    },
    /// Create the sender and job tables if they are missing
    Migrate,
    /// Validate a JSON job file and publish it
    Enqueue {
        /// Path to the job, as JSON
        file: PathBuf,
    },
    /// Show stream and consumer depth
    Stats,
}

#[derive(Subcommand, Debug)]
enum SenderAction {
    /// List all registered senders
    List,
    /// Register a sender for an application tag
    Add {
        /// Application tag jobs will carry
        app_tag: String,
        /// Mailbox mail is sent from
        email: String,
    },
    /// Remove the sender registered for an application tag
    Remove {
        /// Application tag to remove
        app_tag: String,
    },
}

impl Cli {
    async fn directory(&self) -> anyhow::Result<PostgresDirectory> {
        let Some(url) = self.database_url.clone() else {
            anyhow::bail!("--database-url (or DATABASE_URL) is required for this command");
        };

        Ok(PostgresDirectory::connect(&PostgresConfig {
            url,
            max_connections: 1,
            acquire_timeout_secs: 5,
        })
        .await?)
    }

    async fn queue(&self) -> anyhow::Result<JetStreamQueue> {
        let defaults = JetStreamConfig::default();
        let subjects = if self.stream == defaults.stream {
            defaults.subjects
        } else {
            vec![format!("{}.*", self.stream)]
        };

        Ok(JetStreamQueue::connect(&JetStreamConfig {
            url: self.nats_url.clone(),
            name: Some("missivectl".to_string()),
            stream: self.stream.clone(),
            subjects,
            subject: self.subject.clone(),
            consumer: self.consumer.clone(),
            ..defaults
        })
        .await?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Senders { action } => {
            let directory = cli.directory().await?;
            let result = cmd_senders(&directory, action).await;
            directory.close().await;
            result?;
        }
        Commands::Migrate => {
            let directory = cli.directory().await?;
            let result = directory.migrate().await;
            directory.close().await;
            result?;
            println!("Migrations applied");
        }
        Commands::Enqueue { file } => cmd_enqueue(&cli.queue().await?, file).await?,
        Commands::Stats => cmd_stats(&cli.queue().await?).await?,
    }

    Ok(())
}

async fn cmd_senders(directory: &dyn SenderDirectory, action: &SenderAction) -> anyhow::Result<()> {
    match action {
        SenderAction::List => {
            let senders = directory.list().await?;
            if senders.is_empty() {
                println!("No senders registered");
                return Ok(());
            }

            println!("{:<6} {:<24} {:<40}", "ID", "APP TAG", "EMAIL");
            println!("{}", "-".repeat(72));
            for sender in &senders {
                println!("{:<6} {:<24} {:<40}", sender.id, sender.app_tag, sender.email);
            }
            println!("\nTotal: {} sender(s)", senders.len());
        }
        SenderAction::Add { app_tag, email } => {
            let sender = directory.create(app_tag, email).await?;
            println!("Registered {} -> {} (id {})", sender.app_tag, sender.email, sender.id);
        }
        SenderAction::Remove { app_tag } => {
            if directory.delete(app_tag).await? {
                println!("Removed sender for {app_tag}");
            } else {
                anyhow::bail!("No sender registered for {app_tag}");
            }
        }
    }

    Ok(())
}

async fn cmd_enqueue(queue: &dyn JobQueue, file: &Path) -> anyhow::Result<()> {
    let content = tokio::fs::read(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", file.display()))?;
    let job = EmailJob::from_slice(&content)?;

    queue.publish(&job).await?;
    println!(
        "Enqueued job for {} recipient(s) under {}",
        job.all_recipients().len(),
        job.app_tag
    );

    Ok(())
}

async fn cmd_stats(queue: &dyn JobQueue) -> anyhow::Result<()> {
    let stats = queue.stats().await?;

    println!("=== Missive Queue Statistics ===");
    println!();
    println!("Stream messages:  {}", stats.stream_messages);
    println!("Consumer pending: {}", stats.consumer_pending);

    Ok(())
}
