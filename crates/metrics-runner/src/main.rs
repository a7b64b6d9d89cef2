//! metrics-runner: recompute derived metrics for symbols and inspect the
//! reconciled result.
//!
//! Usage:
//!   cargo run -p metrics-runner -- --symbols AAPL MSFT GOOGL
//!   cargo run -p metrics-runner -- --index sp500
//!   cargo run -p metrics-runner -- --show AAPL

use company_store::CompanyStore;
use fmp_client::FmpClient;
use metrics_core::IndexTable;
use metrics_orchestrator::{MetricsPipeline, PipelineConfig};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metrics_runner=info,metrics_orchestrator=info,fmp_client=warn".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let api_key = std::env::var("FMP_API_KEY").expect("FMP_API_KEY must be set");
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    let store = CompanyStore::new(pool);
    store.init_schema().await?;

    let pipeline = MetricsPipeline::with_config(
        FmpClient::new(api_key),
        store,
        PipelineConfig::from_env(),
    );

    if let Some(idx) = args.iter().position(|a| a == "--show") {
        let symbol = args
            .get(idx + 1)
            .ok_or_else(|| anyhow::anyhow!("--show requires a symbol"))?;
        match pipeline.merged_view(symbol).await? {
            Some(row) => println!("{}", serde_json::to_string_pretty(&row)?),
            None => println!("no row for {symbol}"),
        }
        return Ok(());
    }

    let symbols: Vec<String> = if let Some(idx) = args.iter().position(|a| a == "--index") {
        let name = args
            .get(idx + 1)
            .ok_or_else(|| anyhow::anyhow!("--index requires a table name"))?;
        let table = IndexTable::parse(name)
            .ok_or_else(|| anyhow::anyhow!("unknown index: {name}"))?;
        tracing::info!("Loading symbols from {}", table.table_name());
        pipeline.store().list_symbols(table).await?
    } else if let Some(idx) = args.iter().position(|a| a == "--symbols") {
        args[idx + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .map(|s| s.to_uppercase())
            .collect()
    } else {
        anyhow::bail!("usage: metrics-runner --symbols <SYM...> | --index <name> | --show <SYM>");
    };

    if symbols.is_empty() {
        anyhow::bail!("no symbols to process");
    }

    tracing::info!("Recomputing metrics for {} symbols", symbols.len());
    let outcomes = pipeline.recompute_batch(&symbols).await;

    let updated = outcomes.iter().filter(|o| o.updated).count();
    let failed = outcomes.len() - updated;
    for outcome in outcomes.iter().filter(|o| !o.updated) {
        tracing::warn!(
            "{}: {}",
            outcome.symbol,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    tracing::info!("Done: {} updated, {} failed", updated, failed);

    Ok(())
}
