//! Recomputes the daily metrics rollup for one date
//!
//! Meant for cron: the rollup is also refreshed whenever a payment or a
//! front-desk operation touches the day, but dates with no activity are only
//! computed here.
//!
//! ```bash
//! API_DATABASE_URL=postgres://... metrics-rollup --date 2024-03-10
//! ```

use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_billing::adapters::HttpPaymentGateway;
use infra_db::{create_pool_from_url, run_migrations, PgLedgerStore};
use interface_api::{config::ApiConfig, AppState};

#[derive(Debug, Parser)]
#[command(name = "metrics-rollup", about = "Recompute the daily metrics rollup")]
struct Args {
    /// Date to roll up (YYYY-MM-DD); defaults to today in UTC
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Overrides API_DATABASE_URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = ApiConfig::from_env().context("loading configuration")?;
    if let Some(url) = args.database_url {
        config.database_url = url;
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());

    let pool = create_pool_from_url(&config.database_url)
        .await
        .context("connecting to the database")?;
    run_migrations(&pool).await.context("running migrations")?;

    let store = Arc::new(PgLedgerStore::new(pool));
    let gateway = Arc::new(HttpPaymentGateway::new(config.gateway_config())?);
    let state = AppState::new(store, gateway, config).context("invalid configuration")?;

    let metrics = state
        .billing
        .refresh_metrics(date)
        .await
        .with_context(|| format!("refreshing metrics for {date}"))?;

    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
