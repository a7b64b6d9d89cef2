use chrono::NaiveDate;
use metrics_core::{CompanyProfile, MetricsError, PricePoint, Quote, RawRecord, VendorRatios};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://financialmodelingprep.com/stable";

/// Statement endpoints return up to 12 annual records, newest first; the
/// normalizer trims to the 10-slot window.
const STATEMENT_LIMIT: u32 = 12;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let wait_until = ts.front().unwrap().checked_add(self.window).unwrap();
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for FMP API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Async client for the Financial Modeling Prep API.
///
/// Covers the pieces the metrics pipeline depends on: quote, annual
/// statements, key metrics, vendor ratios, daily price history, company
/// profile, and FX spot rates.
#[derive(Clone)]
pub struct FmpClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl FmpClient {
    pub fn new(api_key: String) -> Self {
        // Default 300 req/min. Free tier users should set FMP_RATE_LIMIT=5.
        let rate_limit: usize = std::env::var("FMP_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.contains('?') {
            format!("{BASE_URL}/{endpoint}&apikey={}", self.api_key)
        } else {
            format!("{BASE_URL}/{endpoint}?apikey={}", self.api_key)
        }
    }

    /// GET an endpoint with rate limiting and automatic 429 retry, then parse
    /// the JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, MetricsError> {
        let url = self.url(endpoint);
        tracing::debug!("FMP request: {}", endpoint);

        let mut response = None;
        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| MetricsError::Api(e.to_string()))?;

            if resp.status().as_u16() != 429 {
                response = Some(resp);
                break;
            }

            let wait_secs = 15u64;
            tracing::warn!(
                "FMP 429 rate limited, waiting {}s before retry {}/3",
                wait_secs,
                attempt + 1
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        let response = response.ok_or_else(|| {
            MetricsError::RateLimited("rate limited by FMP after 3 retries".to_string())
        })?;

        if !response.status().is_success() {
            return Err(MetricsError::Api(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| MetricsError::Api(e.to_string()))?;

        // FMP reports some failures as 200 with an error body
        if text.contains("\"Error Message\"") {
            return Err(MetricsError::Api(text));
        }

        serde_json::from_str(&text).map_err(|e| MetricsError::Api(format!("parse: {e}")))
    }

    /// Get the real-time quote for a symbol
    pub async fn quote(&self, symbol: &str) -> Result<Quote, MetricsError> {
        let quotes: Vec<Quote> = self.get_json(&format!("quote?symbol={symbol}")).await?;
        quotes
            .into_iter()
            .next()
            .ok_or_else(|| MetricsError::InsufficientData(format!("no quote for {symbol}")))
    }

    /// Get the company profile (name, listing currency, IPO date)
    pub async fn profile(&self, symbol: &str) -> Result<CompanyProfile, MetricsError> {
        let profiles: Vec<FmpProfile> = self.get_json(&format!("profile?symbol={symbol}")).await?;
        let p = profiles
            .into_iter()
            .next()
            .ok_or_else(|| MetricsError::InsufficientData(format!("no profile for {symbol}")))?;

        Ok(CompanyProfile {
            symbol: p.symbol,
            company_name: p.company_name,
            currency: p.currency,
            ipo_date: p
                .ipo_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            market_cap: p.mkt_cap,
        })
    }

    async fn statements(&self, kind: &str, symbol: &str) -> Result<Vec<RawRecord>, MetricsError> {
        self.get_json(&format!(
            "{kind}?symbol={symbol}&period=annual&limit={STATEMENT_LIMIT}"
        ))
        .await
    }

    /// Annual income statements, newest first
    pub async fn income_statements(&self, symbol: &str) -> Result<Vec<RawRecord>, MetricsError> {
        self.statements("income-statement", symbol).await
    }

    /// Annual balance sheets, newest first
    pub async fn balance_sheets(&self, symbol: &str) -> Result<Vec<RawRecord>, MetricsError> {
        self.statements("balance-sheet-statement", symbol).await
    }

    /// Annual cash flow statements, newest first
    pub async fn cash_flow_statements(&self, symbol: &str) -> Result<Vec<RawRecord>, MetricsError> {
        self.statements("cash-flow-statement", symbol).await
    }

    /// Annual key metrics (carries the vendor ROIC series), newest first
    pub async fn key_metrics(&self, symbol: &str) -> Result<Vec<RawRecord>, MetricsError> {
        self.statements("key-metrics", symbol).await
    }

    /// Latest annual vendor-computed ratios
    pub async fn latest_ratios(&self, symbol: &str) -> Result<Option<VendorRatios>, MetricsError> {
        let ratios: Vec<VendorRatios> = self
            .get_json(&format!("ratios?symbol={symbol}&period=annual&limit=1"))
            .await?;
        Ok(ratios.into_iter().next())
    }

    /// Daily close history from `from` to today, as returned by the provider
    /// (no ordering guarantee; callers sort before windowing).
    pub async fn daily_prices(
        &self,
        symbol: &str,
        from: NaiveDate,
    ) -> Result<Vec<PricePoint>, MetricsError> {
        let response: PriceResponse = self
            .get_json(&format!(
                "historical-price-eod/full?symbol={symbol}&from={from}"
            ))
            .await?;

        let raw = match response {
            PriceResponse::Flat(points) => points,
            PriceResponse::Wrapped { historical } => historical,
        };

        Ok(raw
            .into_iter()
            .filter_map(|p| {
                let date = NaiveDate::parse_from_str(&p.date, "%Y-%m-%d").ok()?;
                Some(PricePoint {
                    date,
                    close: p.close,
                })
            })
            .collect())
    }

    /// Spot exchange rate for a currency pair, best-effort. A missing or
    /// failed lookup is logged and reported as `None`; callers pass values
    /// through unconverted.
    pub async fn fx_rate(&self, from: &str, to: &str) -> Option<f64> {
        let pair = format!("{}{}", from.to_uppercase(), to.to_uppercase());
        match self.get_json::<Vec<FxQuote>>(&format!("quote?symbol={pair}")).await {
            Ok(quotes) => quotes.into_iter().next().and_then(|q| q.price),
            Err(e) => {
                tracing::warn!("FX rate lookup failed for {}: {}", pair, e);
                None
            }
        }
    }
}

// FMP response structures

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpProfile {
    symbol: String,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    ipo_date: Option<String>,
    #[serde(default, alias = "marketCap")]
    mkt_cap: Option<f64>,
}

/// The price-history payload comes in two shapes depending on API version:
/// a bare array, or wrapped in `{ "historical": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceResponse {
    Flat(Vec<FmpHistoricalPrice>),
    Wrapped { historical: Vec<FmpHistoricalPrice> },
}

#[derive(Debug, Clone, Deserialize)]
struct FmpHistoricalPrice {
    date: String,
    close: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct FxQuote {
    #[serde(default)]
    price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = FmpClient::new("test_key".to_string());
        assert_eq!(
            client.url("quote?symbol=AAPL"),
            "https://financialmodelingprep.com/stable/quote?symbol=AAPL&apikey=test_key"
        );
        assert_eq!(
            client.url("profile"),
            "https://financialmodelingprep.com/stable/profile?apikey=test_key"
        );
    }

    #[test]
    fn test_price_payload_flat_shape() {
        let json = r#"[{"date": "2024-01-02", "close": 185.64}]"#;
        let parsed: PriceResponse = serde_json::from_str(json).unwrap();
        match parsed {
            PriceResponse::Flat(points) => {
                assert_eq!(points.len(), 1);
                assert_eq!(points[0].close, 185.64);
            }
            PriceResponse::Wrapped { .. } => panic!("expected flat shape"),
        }
    }

    #[test]
    fn test_price_payload_wrapped_shape() {
        let json = r#"{"symbol": "AAPL", "historical": [{"date": "2024-01-02", "close": 185.64}]}"#;
        let parsed: PriceResponse = serde_json::from_str(json).unwrap();
        match parsed {
            PriceResponse::Wrapped { historical } => assert_eq!(historical.len(), 1),
            PriceResponse::Flat(_) => panic!("expected wrapped shape"),
        }
    }

    #[test]
    fn test_profile_date_parsing() {
        let json = r#"[{"symbol": "AAPL", "companyName": "Apple Inc.", "currency": "USD",
                        "ipoDate": "1980-12-12", "mktCap": 3000000000000.0}]"#;
        let profiles: Vec<FmpProfile> = serde_json::from_str(json).unwrap();
        let date = profiles[0]
            .ipo_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        assert_eq!(date, Some(NaiveDate::from_ymd_opt(1980, 12, 12).unwrap()));
    }
}
