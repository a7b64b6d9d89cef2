//! Turns raw annual statement records into fixed-length, newest-first numeric
//! series. Missing years stay `None`, never zero, so downstream statistics
//! can distinguish "no data" from "reported zero".

use metrics_core::RawRecord;
use serde_json::Value;

/// Every yearly series is padded or truncated to exactly this many slots.
pub const SERIES_LEN: usize = 10;

/// Fixed-length yearly series, index 0 = most recent fiscal year.
pub type YearSeries = [Option<f64>; SERIES_LEN];

/// Ordered list of provider field names for one quantity, tried
/// first-to-last with early exit on the first usable value.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub candidates: &'static [&'static str],
}

pub const REVENUE: FieldSpec = FieldSpec {
    name: "revenue",
    candidates: &["revenue", "totalRevenue", "revenueTTM", "sales", "salesRevenueNet"],
};

pub const FREE_CASH_FLOW: FieldSpec = FieldSpec {
    name: "freeCashFlow",
    candidates: &["freeCashFlow", "freeCashFlowTTM"],
};

pub const EBIT: FieldSpec = FieldSpec {
    name: "ebit",
    candidates: &["ebit", "operatingIncome"],
};

pub const INCOME_BEFORE_TAX: FieldSpec = FieldSpec {
    name: "incomeBeforeTax",
    candidates: &["incomeBeforeTax", "pretaxIncome"],
};

pub const INCOME_TAX_EXPENSE: FieldSpec = FieldSpec {
    name: "incomeTaxExpense",
    candidates: &["incomeTaxExpense", "taxProvision"],
};

pub const NET_INCOME: FieldSpec = FieldSpec {
    name: "netIncome",
    candidates: &["netIncome", "netIncomeTTM"],
};

pub const TOTAL_ASSETS: FieldSpec = FieldSpec {
    name: "totalAssets",
    candidates: &["totalAssets"],
};

pub const TOTAL_EQUITY: FieldSpec = FieldSpec {
    name: "totalStockholdersEquity",
    candidates: &["totalStockholdersEquity", "totalEquity"],
};

pub const TOTAL_DEBT: FieldSpec = FieldSpec {
    name: "totalDebt",
    candidates: &["totalDebt"],
};

pub const CASH_AND_EQUIVALENTS: FieldSpec = FieldSpec {
    name: "cashAndShortTermInvestments",
    candidates: &["cashAndShortTermInvestments", "cashAndCashEquivalents"],
};

pub const ROIC: FieldSpec = FieldSpec {
    name: "roic",
    candidates: &["roic", "roicTTM", "returnOnInvestedCapital"],
};

/// Strict finite cast. Accepts JSON numbers and numeric strings; anything
/// else, including NaN/Infinity, is `None`.
pub fn coerce_finite(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Resolve one quantity from one record, trying candidates in order.
pub fn extract(record: &RawRecord, spec: &FieldSpec) -> Option<f64> {
    spec.candidates
        .iter()
        .find_map(|key| record.get(*key).and_then(coerce_finite))
}

/// Build the 10-slot series for one quantity from newest-first records.
/// Slot `i` is `None` when no record exists at that offset or the field is
/// absent or non-finite there.
pub fn series_from_records(records: &[RawRecord], spec: &FieldSpec) -> YearSeries {
    let mut series: YearSeries = [None; SERIES_LEN];
    for (slot, record) in records.iter().take(SERIES_LEN).enumerate() {
        series[slot] = extract(record, spec);
    }
    series
}

/// Clamp a derived per-year ratio to ±200% before it enters aggregate
/// statistics. Applied to ratios only, never to raw statement values.
pub fn clamp_ratio(x: f64) -> f64 {
    x.clamp(-2.0, 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_series_is_always_ten_slots() {
        let records: Vec<RawRecord> = (0..3)
            .map(|i| record(&[("revenue", json!(1000 - i))]))
            .collect();
        let series = series_from_records(&records, &REVENUE);
        assert_eq!(series.len(), SERIES_LEN);
        assert_eq!(series[0], Some(1000.0));
        assert_eq!(series[2], Some(998.0));
        assert!(series[3..].iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_series_truncates_beyond_ten() {
        let records: Vec<RawRecord> = (0..12)
            .map(|i| record(&[("revenue", json!(i))]))
            .collect();
        let series = series_from_records(&records, &REVENUE);
        assert_eq!(series[9], Some(9.0));
    }

    #[test]
    fn test_alias_priority_order() {
        // "revenue" wins even when a later candidate is also present
        let r = record(&[("totalRevenue", json!(2.0)), ("revenue", json!(1.0))]);
        assert_eq!(extract(&r, &REVENUE), Some(1.0));

        // falls through to the next candidate when the first is absent
        let r = record(&[("sales", json!(3.0))]);
        assert_eq!(extract(&r, &REVENUE), Some(3.0));
    }

    #[test]
    fn test_alias_skips_null_and_non_numeric() {
        let r = record(&[("revenue", Value::Null), ("totalRevenue", json!(5.0))]);
        assert_eq!(extract(&r, &REVENUE), Some(5.0));
    }

    #[test]
    fn test_coercion_is_strict() {
        assert_eq!(coerce_finite(&json!(1.5)), Some(1.5));
        assert_eq!(coerce_finite(&json!("123.4")), Some(123.4));
        assert_eq!(coerce_finite(&json!("n/a")), None);
        assert_eq!(coerce_finite(&Value::Null), None);
        assert_eq!(coerce_finite(&json!(true)), None);
        // missing or bad values never become zero
        assert_ne!(coerce_finite(&Value::Null), Some(0.0));
    }

    #[test]
    fn test_ratio_clamp_bounds() {
        assert_eq!(clamp_ratio(5.0), 2.0);
        assert_eq!(clamp_ratio(-3.0), -2.0);
        assert_eq!(clamp_ratio(0.35), 0.35);
    }
}
