use anyhow::{Context, Result};
use std::time::Duration;
use tokio_postgres::NoTls;
use tracing::info;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("./migrations");
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Applies the embedded schema (vectors table, match_vectors function,
/// usage_stats table) to the database at `database_url`.
pub async fn run_migrations(database_url: &str) -> Result<()> {
    info!("Running database migrations...");

    let connect_result = tokio::time::timeout(
        CONNECT_TIMEOUT,
        tokio_postgres::connect(database_url, NoTls),
    )
    .await
    .context("Database connection timed out")?;

    let (mut client, connection) = connect_result.context("Failed to connect to database")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    let report = embedded::migrations::runner()
        .run_async(&mut client)
        .await
        .context("Failed to run migrations")?;

    for migration in report.applied_migrations() {
        info!(
            "Applied migration V{}__{}",
            migration.version(),
            migration.name()
        );
    }

    Ok(())
}

/// Names of the embedded migrations, in the order they apply.
pub fn migration_names() -> Vec<String> {
    let runner = embedded::migrations::runner();
    let mut migrations: Vec<_> = runner
        .get_migrations()
        .iter()
        .map(|m| (m.version(), m.name().to_string()))
        .collect();
    migrations.sort_by_key(|(version, _)| *version);
    migrations.into_iter().map(|(_, name)| name).collect()
}
