//! Drives the full recompute flow for a symbol (fetch, normalize, calculate,
//! fan-out write) and runs rate-limited sequential batches over many symbols.
//! Also serves the reconciled merged row for display callers.

use chrono::{Months, Utc};
use company_store::{CompanyRow, CompanyStore};
use fmp_client::FmpClient;
use metrics_core::{
    CompanyProfile, DerivedMetrics, IndexTable, MetricsError, SymbolOutcome, SystemClock, TtlCache,
};
use statement_series as series;
use std::sync::Arc;
use std::time::Duration;
use valuation_metrics as calc;

const PROFILE_CACHE_TTL_SECS: i64 = 86_400;
const FX_CACHE_TTL_SECS: i64 = 3_600;
const BASE_CURRENCY: &str = "USD";

/// Batch pacing knobs. The inter-symbol delay is a rate-limiting discipline
/// toward the data provider, not a performance setting.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub inter_symbol_delay_ms: u64,
    pub symbol_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inter_symbol_delay_ms: 150,
            symbol_timeout_secs: 30,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            inter_symbol_delay_ms: std::env::var("RECOMPUTE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.inter_symbol_delay_ms),
            symbol_timeout_secs: std::env::var("SYMBOL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.symbol_timeout_secs),
        }
    }
}

pub struct MetricsPipeline {
    gateway: FmpClient,
    store: CompanyStore,
    config: PipelineConfig,
    profile_cache: TtlCache<CompanyProfile>,
    fx_cache: TtlCache<f64>,
}

impl MetricsPipeline {
    pub fn new(gateway: FmpClient, store: CompanyStore) -> Self {
        Self::with_config(gateway, store, PipelineConfig::default())
    }

    pub fn with_config(gateway: FmpClient, store: CompanyStore, config: PipelineConfig) -> Self {
        let clock = Arc::new(SystemClock);
        Self {
            gateway,
            store,
            config,
            profile_cache: TtlCache::new(PROFILE_CACHE_TTL_SECS, clock.clone()),
            fx_cache: TtlCache::new(FX_CACHE_TTL_SECS, clock),
        }
    }

    /// Accessor for the persistence adapter (used by callers that enumerate
    /// symbols per table).
    pub fn store(&self) -> &CompanyStore {
        &self.store
    }

    /// Company profile with a 24h cache; a failed lookup is tolerated and
    /// reported as `None` (the IPO gate and currency conversion degrade
    /// gracefully without it).
    async fn profile(&self, symbol: &str) -> Option<CompanyProfile> {
        if let Some(profile) = self.profile_cache.get(symbol) {
            return Some(profile);
        }
        match self.gateway.profile(symbol).await {
            Ok(profile) => {
                self.profile_cache.set(symbol, profile.clone());
                Some(profile)
            }
            Err(e) => {
                tracing::warn!("profile lookup failed for {}: {}", symbol, e);
                None
            }
        }
    }

    /// Spot rate into the base currency, cached for an hour. Misses are not
    /// cached; a flaky FX endpoint should recover within a run.
    async fn usd_rate(&self, currency: &str) -> Option<f64> {
        if let Some(rate) = self.fx_cache.get(currency) {
            return Some(rate);
        }
        let rate = self.gateway.fx_rate(currency, BASE_CURRENCY).await?;
        self.fx_cache.set(currency, rate);
        Some(rate)
    }

    /// Recompute and persist every derived metric for one symbol.
    ///
    /// Fetches are strictly sequential and complete before any write; an
    /// infrastructure failure mid-fetch aborts the symbol without touching
    /// the store.
    pub async fn recompute_symbol(&self, symbol: &str) -> Result<(), MetricsError> {
        let symbol = symbol.to_uppercase();
        let today = Utc::now().date_naive();

        let quote = self.gateway.quote(&symbol).await?;
        let profile = self.profile(&symbol).await;
        let income = self.gateway.income_statements(&symbol).await?;
        let balance = self.gateway.balance_sheets(&symbol).await?;
        let cash_flow = self.gateway.cash_flow_statements(&symbol).await?;
        // Vendor extras degrade to empty rather than failing the symbol
        let key_metrics = match self.gateway.key_metrics(&symbol).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("key metrics unavailable for {}: {}", symbol, e);
                Vec::new()
            }
        };
        let vendor_ratios = match self.gateway.latest_ratios(&symbol).await {
            Ok(ratios) => ratios.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("ratios unavailable for {}: {}", symbol, e);
                Default::default()
            }
        };
        let price_from = today
            .checked_sub_months(Months::new(120))
            .unwrap_or(today);
        let prices = self.gateway.daily_prices(&symbol, price_from).await?;

        // Normalize
        let revenue = series::series_from_records(&income, &series::REVENUE);
        let ebit = series::series_from_records(&income, &series::EBIT);
        let income_before_tax = series::series_from_records(&income, &series::INCOME_BEFORE_TAX);
        let income_tax_expense = series::series_from_records(&income, &series::INCOME_TAX_EXPENSE);
        let net_income = series::series_from_records(&income, &series::NET_INCOME);
        let total_assets = series::series_from_records(&balance, &series::TOTAL_ASSETS);
        let total_equity = series::series_from_records(&balance, &series::TOTAL_EQUITY);
        let total_debt = series::series_from_records(&balance, &series::TOTAL_DEBT);
        let cash = series::series_from_records(&balance, &series::CASH_AND_EQUIVALENTS);
        let fcf = series::series_from_records(&cash_flow, &series::FREE_CASH_FLOW);
        let provider_roic = series::series_from_records(&key_metrics, &series::ROIC);

        // Calculate
        let mut metrics = DerivedMetrics::default();

        let market_cap = quote
            .market_cap
            .or_else(|| profile.as_ref().and_then(|p| p.market_cap));
        let revenue_cagr = calc::series_cagr(&revenue);

        if let Some(mut fcf_base) = calc::base_fcf(&fcf) {
            let currency = profile
                .as_ref()
                .and_then(|p| p.currency.clone())
                .unwrap_or_else(|| BASE_CURRENCY.to_string());
            if currency != BASE_CURRENCY {
                match self.usd_rate(&currency).await {
                    Some(rate) => fcf_base *= rate,
                    // best effort: no rate, value passes through unconverted
                    None => tracing::warn!("no {}->USD rate for {}", currency, symbol),
                }
            }
            let valuation = calc::dcf_valuation(fcf_base, market_cap, revenue_cagr);
            metrics.dcf_enterprise_value = valuation.enterprise_value;
            metrics.margin_of_safety = valuation.margin_of_safety;
            metrics.dcf_implied_growth = valuation.implied_growth;
        }

        let perf_3y = calc::window_performance(&prices, today, 3);
        let perf_5y = calc::window_performance(&prices, today, 5);
        let perf_10y = calc::window_performance(&prices, today, 10);
        metrics.return_3y = perf_3y.annualized_return_pct;
        metrics.return_5y = perf_5y.annualized_return_pct;
        metrics.return_10y = perf_10y.annualized_return_pct;
        metrics.max_drawdown_3y = perf_3y.max_drawdown_pct;
        metrics.max_drawdown_5y = perf_5y.max_drawdown_pct;
        metrics.max_drawdown_10y = perf_10y.max_drawdown_pct;
        metrics.ar_mdd_ratio_3y = perf_3y.ar_mdd_ratio;
        metrics.ar_mdd_ratio_5y = perf_5y.ar_mdd_ratio;
        metrics.ar_mdd_ratio_10y = perf_10y.ar_mdd_ratio;

        let roic_inputs = calc::RoicInputs {
            ebit: &ebit,
            income_before_tax: &income_before_tax,
            income_tax_expense: &income_tax_expense,
            total_debt: &total_debt,
            total_equity: &total_equity,
            cash: &cash,
        };
        metrics.roic_years = calc::select_roic_series(&provider_roic, &roic_inputs);
        metrics.roic = metrics.roic_years.iter().flatten().copied().next();
        metrics.roic_10y_avg = calc::roic_average(&metrics.roic_years);
        metrics.roic_10y_std = calc::roic_std(&metrics.roic_years);

        metrics.revenue_years = revenue;
        metrics.fcf_years = fcf;
        metrics.fcf_margin_median_10y = calc::fcf_margin_median(&fcf, &revenue);

        let dupont = calc::dupont(revenue[0], net_income[0], total_assets[0], total_equity[0]);
        metrics.asset_turnover = dupont.asset_turnover;
        metrics.financial_leverage = dupont.financial_leverage;
        metrics.roe = dupont.roe;

        let coverage = calc::coverage_ratios(&vendor_ratios);
        metrics.debt_to_equity = coverage.debt_to_equity;
        metrics.interest_coverage = coverage.interest_coverage;
        metrics.cash_flow_to_debt = coverage.cash_flow_to_debt;

        // Fan-out write: master plus whichever index tables carry the symbol
        let mut tables = vec![IndexTable::Master];
        tables.extend(self.store.member_tables(&symbol).await?);

        let name = profile.as_ref().and_then(|p| p.company_name.clone());
        let currency = profile.as_ref().and_then(|p| p.currency.clone());
        self.store
            .upsert_identity(
                &tables,
                &symbol,
                name.as_deref(),
                quote.price,
                market_cap,
                currency.as_deref(),
            )
            .await;

        let written = self.store.upsert_metrics(&tables, &symbol, &metrics).await;
        if written == 0 {
            return Err(MetricsError::Database(format!(
                "all metric writes failed for {symbol}"
            )));
        }
        tracing::info!(
            "recomputed {} across {}/{} tables",
            symbol,
            written,
            tables.len()
        );
        Ok(())
    }

    /// Sequential bulk recompute with a fixed inter-symbol delay and a
    /// per-symbol timeout. One symbol's failure never aborts the batch, and
    /// there is no in-run retry; the next scheduled run is the retry.
    pub async fn recompute_batch(&self, symbols: &[String]) -> Vec<SymbolOutcome> {
        let mut outcomes = Vec::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            let result = tokio::time::timeout(
                Duration::from_secs(self.config.symbol_timeout_secs),
                self.recompute_symbol(symbol),
            )
            .await;

            let outcome = match result {
                Ok(Ok(())) => SymbolOutcome {
                    symbol: symbol.clone(),
                    updated: true,
                    error: None,
                },
                Ok(Err(e)) => {
                    tracing::warn!("recompute failed for {}: {}", symbol, e);
                    SymbolOutcome {
                        symbol: symbol.clone(),
                        updated: false,
                        error: Some(e.to_string()),
                    }
                }
                Err(_) => {
                    let e = MetricsError::Timeout(format!(
                        "{} exceeded {}s",
                        symbol, self.config.symbol_timeout_secs
                    ));
                    tracing::warn!("{}", e);
                    SymbolOutcome {
                        symbol: symbol.clone(),
                        updated: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);

            if i + 1 < symbols.len() {
                tokio::time::sleep(Duration::from_millis(self.config.inter_symbol_delay_ms)).await;
            }
        }
        outcomes
    }

    /// The reconciled display row: master merged with index-table copies in
    /// probe order, then the IPO age gate.
    pub async fn merged_view(&self, symbol: &str) -> Result<Option<CompanyRow>, MetricsError> {
        let symbol = symbol.to_uppercase();
        let Some(master) = self.store.fetch_row(IndexTable::Master, &symbol).await? else {
            return Ok(None);
        };

        let mut fallbacks = Vec::new();
        for table in IndexTable::INDEX_PRIORITY {
            if let Some(row) = self.store.fetch_row(table, &symbol).await? {
                fallbacks.push(row);
            }
        }

        let mut merged = reconciliation::merge_rows(master, &fallbacks);
        let ipo_date = self.profile(&symbol).await.and_then(|p| p.ipo_date);
        reconciliation::apply_age_gate(&mut merged, ipo_date, Utc::now().date_naive());
        Ok(Some(merged))
    }
}
