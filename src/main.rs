//! Command-line entry point for debezium-apply.

use anyhow::{Context, Result};
use clap::Parser;
use debezium_apply::{kafka, postgres, ApplyOpts};
use tokio_postgres::NoTls;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "debezium-apply")]
#[command(about = "Applies Debezium CDC events from Kafka to a PostgreSQL database")]
struct Cli {
    /// Kafka consumer options
    #[command(flatten)]
    consumer: kafka::ConsumerConfig,

    /// Target database options
    #[command(flatten)]
    apply: ApplyOpts,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "debezium_apply=info,debezium_apply_kafka_source=info,debezium_apply_postgres_sink=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Without a database connection no message can be applied, so failing
    // here is fatal; everything after this point is per-message.
    info!("Connecting to PostgreSQL...");
    let (client, connection) = tokio_postgres::connect(&cli.apply.connection_string, NoTls)
        .await
        .context("failed to connect to PostgreSQL")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("PostgreSQL connection error: {e}");
        }
    });
    info!("Connected to PostgreSQL");

    let shutdown = setup_shutdown_handler();

    let consumer = kafka::Consumer::new(cli.consumer)?;
    let (messages, consumer_task) = consumer.spawn(shutdown.resubscribe());

    info!("Applying changes... (Press Ctrl+C to stop)");
    let stats = postgres::run_apply_loop(&client, messages, shutdown).await;

    if let Err(e) = consumer_task.await {
        error!("Consumer task error: {e}");
    }

    info!(
        "Done: {} changes applied, {} matched no rows, {} failed",
        stats.applied, stats.zero_rows, stats.failed
    );
    Ok(())
}

/// Sets up a shutdown signal handler.
fn setup_shutdown_handler() -> tokio::sync::broadcast::Receiver<()> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");

        info!("Received interrupt signal (Ctrl+C)");
        let _ = shutdown_tx.send(());
    });

    shutdown_rx
}
