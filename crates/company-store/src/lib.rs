//! Persistence adapter over the master `companies` table and the four
//! index-membership tables, all sharing one schema. Writes are per-row
//! upserts keyed by symbol; a failed write to one table never blocks the
//! remaining tables.

pub mod models;
pub mod schema;

pub use models::CompanyRow;

use metrics_core::{DerivedMetrics, IndexTable, MetricsError};
use sqlx::postgres::PgPool;
use sqlx::{Postgres, query::Query};

/// Metric columns written by [`CompanyStore::upsert_metrics`], in bind order.
const METRIC_COLUMNS: [&str; 52] = [
    "dcf_enterprise_value",
    "margin_of_safety",
    "dcf_implied_growth",
    "return_3y",
    "return_5y",
    "return_10y",
    "max_drawdown_3y",
    "max_drawdown_5y",
    "max_drawdown_10y",
    "ar_mdd_ratio_3y",
    "ar_mdd_ratio_5y",
    "ar_mdd_ratio_10y",
    "roic",
    "roic_10y_avg",
    "roic_10y_std",
    "roic_y1",
    "roic_y2",
    "roic_y3",
    "roic_y4",
    "roic_y5",
    "roic_y6",
    "roic_y7",
    "roic_y8",
    "roic_y9",
    "roic_y10",
    "revenue_y1",
    "revenue_y2",
    "revenue_y3",
    "revenue_y4",
    "revenue_y5",
    "revenue_y6",
    "revenue_y7",
    "revenue_y8",
    "revenue_y9",
    "revenue_y10",
    "fcf_y1",
    "fcf_y2",
    "fcf_y3",
    "fcf_y4",
    "fcf_y5",
    "fcf_y6",
    "fcf_y7",
    "fcf_y8",
    "fcf_y9",
    "fcf_y10",
    "fcf_margin_median_10y",
    "asset_turnover",
    "financial_leverage",
    "roe",
    "debt_to_equity",
    "interest_coverage",
    "cash_flow_to_debt",
];

/// Values matching [`METRIC_COLUMNS`] position-for-position.
fn metric_values(m: &DerivedMetrics) -> Vec<Option<f64>> {
    let mut values = vec![
        m.dcf_enterprise_value,
        m.margin_of_safety,
        m.dcf_implied_growth,
        m.return_3y,
        m.return_5y,
        m.return_10y,
        m.max_drawdown_3y,
        m.max_drawdown_5y,
        m.max_drawdown_10y,
        m.ar_mdd_ratio_3y,
        m.ar_mdd_ratio_5y,
        m.ar_mdd_ratio_10y,
        m.roic,
        m.roic_10y_avg,
        m.roic_10y_std,
    ];
    values.extend_from_slice(&m.roic_years);
    values.extend_from_slice(&m.revenue_years);
    values.extend_from_slice(&m.fcf_years);
    values.push(m.fcf_margin_median_10y);
    values.push(m.asset_turnover);
    values.push(m.financial_leverage);
    values.push(m.roe);
    values.push(m.debt_to_equity);
    values.push(m.interest_coverage);
    values.push(m.cash_flow_to_debt);
    values
}

fn upsert_metrics_sql(table: &str) -> String {
    let cols = METRIC_COLUMNS.join(", ");
    let placeholders: Vec<String> = (2..=METRIC_COLUMNS.len() + 1)
        .map(|i| format!("${i}"))
        .collect();
    let updates: Vec<String> = METRIC_COLUMNS
        .iter()
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();
    format!(
        "INSERT INTO {table} (symbol, {cols}, updated_at) VALUES ($1, {}, now()) \
         ON CONFLICT (symbol) DO UPDATE SET {}, updated_at = now()",
        placeholders.join(", "),
        updates.join(", ")
    )
}

pub struct CompanyStore {
    pool: PgPool,
}

impl CompanyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the master table and every index table when absent.
    pub async fn init_schema(&self) -> Result<(), MetricsError> {
        for table in IndexTable::ALL {
            sqlx::query(&schema::create_table_sql(table.table_name()))
                .execute(&self.pool)
                .await
                .map_err(|e| MetricsError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Upsert identity/display fields into each listed table. Returns how
    /// many table writes succeeded; failures are logged and skipped.
    pub async fn upsert_identity(
        &self,
        tables: &[IndexTable],
        symbol: &str,
        name: Option<&str>,
        price: Option<f64>,
        market_cap: Option<f64>,
        currency: Option<&str>,
    ) -> usize {
        let mut ok = 0;
        for table in tables {
            let sql = format!(
                "INSERT INTO {} (symbol, name, price, market_cap, currency, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, now()) \
                 ON CONFLICT (symbol) DO UPDATE SET \
                 name = COALESCE(EXCLUDED.name, {0}.name), price = EXCLUDED.price, \
                 market_cap = EXCLUDED.market_cap, \
                 currency = COALESCE(EXCLUDED.currency, {0}.currency), updated_at = now()",
                table.table_name()
            );
            let result = sqlx::query(&sql)
                .bind(symbol)
                .bind(name)
                .bind(price)
                .bind(market_cap)
                .bind(currency)
                .execute(&self.pool)
                .await;
            match result {
                Ok(_) => ok += 1,
                Err(e) => tracing::error!(
                    "identity upsert failed for {} in {}: {}",
                    symbol,
                    table.table_name(),
                    e
                ),
            }
        }
        ok
    }

    /// Upsert the full derived metric set into each listed table, explicit
    /// nulls included, so a discarded DCF overwrites any stale value. Returns
    /// how many table writes succeeded.
    pub async fn upsert_metrics(
        &self,
        tables: &[IndexTable],
        symbol: &str,
        metrics: &DerivedMetrics,
    ) -> usize {
        let values = metric_values(metrics);
        let mut ok = 0;
        for table in tables {
            let sql = upsert_metrics_sql(table.table_name());
            let mut query: Query<'_, Postgres, _> = sqlx::query(&sql).bind(symbol);
            for value in &values {
                query = query.bind(*value);
            }
            match query.execute(&self.pool).await {
                Ok(_) => ok += 1,
                Err(e) => tracing::error!(
                    "metrics upsert failed for {} in {}: {}",
                    symbol,
                    table.table_name(),
                    e
                ),
            }
        }
        ok
    }

    pub async fn fetch_row(
        &self,
        table: IndexTable,
        symbol: &str,
    ) -> Result<Option<CompanyRow>, MetricsError> {
        let sql = format!("SELECT * FROM {} WHERE symbol = $1", table.table_name());
        sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(symbol)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MetricsError::Database(e.to_string()))
    }

    pub async fn fetch_rows(
        &self,
        table: IndexTable,
        symbols: &[String],
    ) -> Result<Vec<CompanyRow>, MetricsError> {
        let sql = format!(
            "SELECT * FROM {} WHERE symbol = ANY($1)",
            table.table_name()
        );
        sqlx::query_as::<_, CompanyRow>(&sql)
            .bind(symbols)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MetricsError::Database(e.to_string()))
    }

    /// Every symbol currently present in a table, for bulk recompute runs.
    pub async fn list_symbols(&self, table: IndexTable) -> Result<Vec<String>, MetricsError> {
        let sql = format!("SELECT symbol FROM {} ORDER BY symbol", table.table_name());
        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MetricsError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    /// Which index tables (not the master) carry a row for this symbol,
    /// in reconciliation probe order.
    pub async fn member_tables(&self, symbol: &str) -> Result<Vec<IndexTable>, MetricsError> {
        let mut members = Vec::new();
        for table in IndexTable::INDEX_PRIORITY {
            let sql = format!(
                "SELECT 1 FROM {} WHERE symbol = $1 LIMIT 1",
                table.table_name()
            );
            let hit: Option<(i32,)> = sqlx::query_as(&sql)
                .bind(symbol)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| MetricsError::Database(e.to_string()))?;
            if hit.is_some() {
                members.push(table);
            }
        }
        Ok(members)
    }
}
