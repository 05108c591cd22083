//! Jobs command - the account email queue.
//!
//! ```bash
//! estate-market jobs work    # process queued emails
//! estate-market jobs list    # counts per status
//! estate-market jobs clear   # drop failed jobs
//! ```

use apalis::prelude::*;
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::PgPoolOptions;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::jobs::{email_job_handler, EmailJob};

const QUEUE_POOL_SIZE: u32 = 5;

pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Open the email queue, creating apalis tables on first use.
pub async fn connect_email_queue(config: &Config) -> AppResult<PostgresStorage<EmailJob>> {
    let pool = PgPoolOptions::new()
        .max_connections(QUEUE_POOL_SIZE)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to job queue: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    Ok(PostgresStorage::new(pool))
}

async fn run_worker(config: &Config) -> AppResult<()> {
    let email_storage = connect_email_queue(config).await?;

    tracing::info!("Email worker started. Press Ctrl+C to stop.");

    let worker = WorkerBuilder::new("email-worker")
        .backend(email_storage)
        .build_fn(email_job_handler);

    let monitor = Monitor::new().register(worker);

    tokio::select! {
        result = monitor.run() => {
            if let Err(e) = result {
                tracing::error!("Worker error: {}", e);
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping worker...");
        }
    }

    tracing::info!("Email worker stopped.");
    Ok(())
}

/// Connection for the queue inspection commands, or `None` when the worker
/// has never created the apalis schema.
async fn queue_connection(config: &Config) -> AppResult<Option<DatabaseConnection>> {
    let db = Database::connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))?;

    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') AS exists",
        ))
        .await
        .map_err(|e| AppError::internal(format!("Query failed: {}", e)))?;

    let initialized = row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false);

    Ok(initialized.then_some(db))
}

async fn list_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Email queue not initialized. Run 'jobs work' or 'serve' first.");
        return Ok(());
    };

    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT status::text AS status, COUNT(*)::bigint AS count FROM apalis.jobs GROUP BY status",
        ))
        .await
        .map_err(|e| AppError::internal(format!("Query failed: {}", e)))?;

    println!("\n=== Email Queue ===");
    for status in ["Pending", "Running", "Failed", "Done"] {
        let count = rows
            .iter()
            .find(|row| row.try_get::<String>("", "status").ok().as_deref() == Some(status))
            .and_then(|row| row.try_get::<i64>("", "count").ok())
            .unwrap_or(0);
        println!("{:<9} {}", format!("{}:", status), count);
    }
    println!("===================\n");

    Ok(())
}

async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Email queue not initialized. Nothing to clear.");
        return Ok(());
    };

    let result = db
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "DELETE FROM apalis.jobs WHERE status = 'Failed'",
        ))
        .await
        .map_err(|e| AppError::internal(format!("Failed to clear jobs: {}", e)))?;

    println!("Cleared {} failed email job(s).", result.rows_affected());
    Ok(())
}
