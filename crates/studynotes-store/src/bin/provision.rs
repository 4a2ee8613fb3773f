//! Provision the storage backend: backing relations, bucket, logical
//! tables, and the mock search function. Run once before starting the
//! server against Postgres; safe to re-run.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use studynotes_store::{create_pool, provision};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?;

    let pool = create_pool(&database_url)
        .await
        .context("failed to connect to database")?;

    info!(subsystem = "store", component = "provision", "provisioning backend resources");
    let report = provision(&pool).await;

    info!(
        subsystem = "store",
        component = "provision",
        bucket_created = report.bucket_created,
        tables_created = report.tables_created.len(),
        function_registered = report.function_registered,
        "provisioning finished"
    );

    if !report.is_success() {
        for failure in &report.failures {
            warn!(subsystem = "store", component = "provision", "step failed: {failure}");
        }
        bail!("provisioning completed with {} failure(s)", report.failures.len());
    }

    Ok(())
}
