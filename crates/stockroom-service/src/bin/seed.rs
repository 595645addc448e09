//! # stockroom-seed
//!
//! Populates a local database with the sample catalog and sales history.
//!
//! ```text
//! stockroom-seed [--config <file>] [--db <path>] [--no-sales]
//! ```
//!
//! Collections that already hold data are left alone, so running it twice
//! is harmless.

use std::path::PathBuf;

use stockroom_service::{AppConfig, StorageBackend, Stockroom};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    no_sales: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().ok_or("--config needs a path")?.into()),
            "--db" => args.db = Some(iter.next().ok_or("--db needs a path")?.into()),
            "--no-sales" => args.no_sales = true,
            other => return Err(format!("Unknown argument: {other}")),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args()?;

    let mut config = AppConfig::load(args.config)?;
    if let Some(db) = args.db {
        config.storage.backend = StorageBackend::Local;
        config.storage.path = db;
    }
    // Seeding is done explicitly below
    config.app.seed_sample_data = false;
    info!(backend = %config.backend(), path = %config.storage.path.display(), "Seeding");

    let app = Stockroom::open(config).await?;

    let products = app.inventory().initialize_if_empty().await?;
    let sales = if args.no_sales {
        0
    } else {
        app.sales().initialize_if_empty().await?
    };
    if products == 0 && sales == 0 {
        warn!("Store already has data, nothing seeded");
    }

    let summary = app.analytics().summary().await;
    info!(
        products_seeded = products,
        sales_seeded = sales,
        total_stock = app.inventory().total_stock().await,
        revenue = %summary.revenue,
        "Seed complete"
    );

    app.shutdown().await;
    Ok(())
}
