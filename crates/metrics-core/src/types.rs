use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw annual statement record as returned by the data provider.
///
/// Field naming varies across provider endpoints and plan tiers, so records
/// stay untyped here; the series normalizer resolves field aliases.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Real-time quote snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    #[serde(default, alias = "changePercentage")]
    pub changes_percentage: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Company profile (identity, listing currency, IPO date)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub company_name: Option<String>,
    pub currency: Option<String>,
    pub ipo_date: Option<NaiveDate>,
    pub market_cap: Option<f64>,
}

/// One end-of-day close
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Vendor-computed ratios taken as-is rather than re-derived; coverage ratio
/// conventions (EBIT vs EBITDA numerator) vary too much across vendors to
/// recompute consistently from raw statements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRatios {
    #[serde(default)]
    pub debt_equity_ratio: Option<f64>,
    #[serde(default)]
    pub interest_coverage: Option<f64>,
    #[serde(default)]
    pub cash_flow_to_debt_ratio: Option<f64>,
}

/// The full set of derived analytical fields computed for one symbol.
///
/// Every ratio field is either a finite number or `None`; NaN/Infinity are
/// never stored. Yearly series are newest-first, padded to exactly 10 slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub dcf_enterprise_value: Option<f64>,
    pub margin_of_safety: Option<f64>,
    pub dcf_implied_growth: Option<f64>,

    pub return_3y: Option<f64>,
    pub return_5y: Option<f64>,
    pub return_10y: Option<f64>,
    pub max_drawdown_3y: Option<f64>,
    pub max_drawdown_5y: Option<f64>,
    pub max_drawdown_10y: Option<f64>,
    pub ar_mdd_ratio_3y: Option<f64>,
    pub ar_mdd_ratio_5y: Option<f64>,
    pub ar_mdd_ratio_10y: Option<f64>,

    pub roic: Option<f64>,
    pub roic_10y_avg: Option<f64>,
    pub roic_10y_std: Option<f64>,
    pub roic_years: [Option<f64>; 10],

    pub revenue_years: [Option<f64>; 10],
    pub fcf_years: [Option<f64>; 10],
    pub fcf_margin_median_10y: Option<f64>,

    pub asset_turnover: Option<f64>,
    pub financial_leverage: Option<f64>,
    pub roe: Option<f64>,

    pub debt_to_equity: Option<f64>,
    pub interest_coverage: Option<f64>,
    pub cash_flow_to_debt: Option<f64>,
}

/// The master table plus the four index-membership tables. All five share one
/// column set; rows for the same symbol are eventually consistent and get
/// merged at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexTable {
    Master,
    Sp500,
    Nasdaq100,
    DowJones,
    Ftse100,
}

impl IndexTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            IndexTable::Master => "companies",
            IndexTable::Sp500 => "sp500_companies",
            IndexTable::Nasdaq100 => "nasdaq100_companies",
            IndexTable::DowJones => "dow_jones_companies",
            IndexTable::Ftse100 => "ftse100_companies",
        }
    }

    /// Fallback probe order used when the master row is missing a value.
    pub const INDEX_PRIORITY: [IndexTable; 4] = [
        IndexTable::Nasdaq100,
        IndexTable::Sp500,
        IndexTable::DowJones,
        IndexTable::Ftse100,
    ];

    pub const ALL: [IndexTable; 5] = [
        IndexTable::Master,
        IndexTable::Sp500,
        IndexTable::Nasdaq100,
        IndexTable::DowJones,
        IndexTable::Ftse100,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "master" | "companies" => Some(IndexTable::Master),
            "sp500" => Some(IndexTable::Sp500),
            "nasdaq100" => Some(IndexTable::Nasdaq100),
            "dowjones" | "dow_jones" => Some(IndexTable::DowJones),
            "ftse100" => Some(IndexTable::Ftse100),
            _ => None,
        }
    }
}

/// Per-symbol result of a bulk recompute run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_parse_roundtrip() {
        assert_eq!(IndexTable::parse("sp500"), Some(IndexTable::Sp500));
        assert_eq!(IndexTable::parse("DowJones"), Some(IndexTable::DowJones));
        assert_eq!(IndexTable::parse("russell2000"), None);
    }

    #[test]
    fn test_index_priority_excludes_master() {
        assert!(!IndexTable::INDEX_PRIORITY.contains(&IndexTable::Master));
        assert_eq!(IndexTable::INDEX_PRIORITY[0], IndexTable::Nasdaq100);
    }
}
