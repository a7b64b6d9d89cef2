//! Read-time reconciliation of a company's rows across the master table and
//! the index-membership tables, plus the IPO-age gate applied to the merged
//! result.
//!
//! The five tables are eventually consistent by design; this layer merges
//! them into one display row using a deterministic precedence policy instead
//! of preventing the staleness at write time.

use chrono::NaiveDate;
use company_store::CompanyRow;
use valuation_metrics::{fcf_margin_median, roic_average, roic_std};

/// Symbols whose profile IPO date is known to be unreliable; their 10-year
/// performance fields are nulled unconditionally.
pub const RECENT_IPO_OVERRIDES: &[&str] = &["ABNB", "ARM", "COIN", "PLTR", "RIVN", "SNOW"];

/// Standard scalar precedence: keep the master value unless it is null or
/// zero, otherwise the first non-null non-zero fallback, otherwise whatever
/// the master had.
fn fill_scalar<F>(master: Option<f64>, fallbacks: &[CompanyRow], get: F) -> Option<f64>
where
    F: Fn(&CompanyRow) -> Option<f64>,
{
    match master {
        Some(v) if v != 0.0 => Some(v),
        _ => fallbacks
            .iter()
            .find_map(|r| get(r).filter(|v| *v != 0.0))
            .or(master),
    }
}

/// DCF-family precedence: the master row is the authoritative latest
/// computation, so its value wins whenever present; index-table copies are
/// only consulted when the master has none.
fn prefer_master<F>(master: Option<f64>, fallbacks: &[CompanyRow], get: F) -> Option<f64>
where
    F: Fn(&CompanyRow) -> Option<f64>,
{
    master.or_else(|| fallbacks.iter().find_map(&get))
}

fn fill_text<F>(master: Option<String>, fallbacks: &[CompanyRow], get: F) -> Option<String>
where
    F: Fn(&CompanyRow) -> Option<String>,
{
    match master {
        Some(s) if !s.is_empty() => Some(s),
        other => fallbacks
            .iter()
            .find_map(|r| get(r).filter(|s| !s.is_empty()))
            .or(other),
    }
}

fn fill_rank(master: Option<i32>, fallbacks: &[CompanyRow]) -> Option<i32> {
    match master {
        Some(v) if v != 0 => Some(v),
        _ => fallbacks
            .iter()
            .find_map(|r| r.rank.filter(|v| *v != 0))
            .or(master),
    }
}

/// Merge the master row with index-table rows, which must be supplied in the
/// fixed probe order (NASDAQ 100, S&P 500, Dow Jones, FTSE 100).
pub fn merge_rows(master: CompanyRow, fallbacks: &[CompanyRow]) -> CompanyRow {
    let mut out = CompanyRow {
        symbol: master.symbol.clone(),
        ..CompanyRow::default()
    };

    out.name = fill_text(master.name.clone(), fallbacks, |r| r.name.clone());
    out.currency = fill_text(master.currency.clone(), fallbacks, |r| r.currency.clone());
    out.rank = fill_rank(master.rank, fallbacks);
    out.price = fill_scalar(master.price, fallbacks, |r| r.price);
    out.market_cap = fill_scalar(master.market_cap, fallbacks, |r| r.market_cap);

    // Expensive recomputations: master is authoritative whenever present
    out.dcf_enterprise_value =
        prefer_master(master.dcf_enterprise_value, fallbacks, |r| r.dcf_enterprise_value);
    out.margin_of_safety = prefer_master(master.margin_of_safety, fallbacks, |r| r.margin_of_safety);
    out.dcf_implied_growth =
        prefer_master(master.dcf_implied_growth, fallbacks, |r| r.dcf_implied_growth);
    out.fcf_margin_median_10y =
        prefer_master(master.fcf_margin_median_10y, fallbacks, |r| r.fcf_margin_median_10y);

    out.return_3y = fill_scalar(master.return_3y, fallbacks, |r| r.return_3y);
    out.return_5y = fill_scalar(master.return_5y, fallbacks, |r| r.return_5y);
    out.return_10y = fill_scalar(master.return_10y, fallbacks, |r| r.return_10y);
    out.max_drawdown_3y = fill_scalar(master.max_drawdown_3y, fallbacks, |r| r.max_drawdown_3y);
    out.max_drawdown_5y = fill_scalar(master.max_drawdown_5y, fallbacks, |r| r.max_drawdown_5y);
    out.max_drawdown_10y = fill_scalar(master.max_drawdown_10y, fallbacks, |r| r.max_drawdown_10y);
    out.ar_mdd_ratio_3y = fill_scalar(master.ar_mdd_ratio_3y, fallbacks, |r| r.ar_mdd_ratio_3y);
    out.ar_mdd_ratio_5y = fill_scalar(master.ar_mdd_ratio_5y, fallbacks, |r| r.ar_mdd_ratio_5y);
    out.ar_mdd_ratio_10y = fill_scalar(master.ar_mdd_ratio_10y, fallbacks, |r| r.ar_mdd_ratio_10y);

    out.roic = fill_scalar(master.roic, fallbacks, |r| r.roic);
    out.roic_10y_avg = fill_scalar(master.roic_10y_avg, fallbacks, |r| r.roic_10y_avg);
    out.roic_10y_std = fill_scalar(master.roic_10y_std, fallbacks, |r| r.roic_10y_std);
    out.roic_y1 = fill_scalar(master.roic_y1, fallbacks, |r| r.roic_y1);
    out.roic_y2 = fill_scalar(master.roic_y2, fallbacks, |r| r.roic_y2);
    out.roic_y3 = fill_scalar(master.roic_y3, fallbacks, |r| r.roic_y3);
    out.roic_y4 = fill_scalar(master.roic_y4, fallbacks, |r| r.roic_y4);
    out.roic_y5 = fill_scalar(master.roic_y5, fallbacks, |r| r.roic_y5);
    out.roic_y6 = fill_scalar(master.roic_y6, fallbacks, |r| r.roic_y6);
    out.roic_y7 = fill_scalar(master.roic_y7, fallbacks, |r| r.roic_y7);
    out.roic_y8 = fill_scalar(master.roic_y8, fallbacks, |r| r.roic_y8);
    out.roic_y9 = fill_scalar(master.roic_y9, fallbacks, |r| r.roic_y9);
    out.roic_y10 = fill_scalar(master.roic_y10, fallbacks, |r| r.roic_y10);

    out.revenue_y1 = fill_scalar(master.revenue_y1, fallbacks, |r| r.revenue_y1);
    out.revenue_y2 = fill_scalar(master.revenue_y2, fallbacks, |r| r.revenue_y2);
    out.revenue_y3 = fill_scalar(master.revenue_y3, fallbacks, |r| r.revenue_y3);
    out.revenue_y4 = fill_scalar(master.revenue_y4, fallbacks, |r| r.revenue_y4);
    out.revenue_y5 = fill_scalar(master.revenue_y5, fallbacks, |r| r.revenue_y5);
    out.revenue_y6 = fill_scalar(master.revenue_y6, fallbacks, |r| r.revenue_y6);
    out.revenue_y7 = fill_scalar(master.revenue_y7, fallbacks, |r| r.revenue_y7);
    out.revenue_y8 = fill_scalar(master.revenue_y8, fallbacks, |r| r.revenue_y8);
    out.revenue_y9 = fill_scalar(master.revenue_y9, fallbacks, |r| r.revenue_y9);
    out.revenue_y10 = fill_scalar(master.revenue_y10, fallbacks, |r| r.revenue_y10);

    out.fcf_y1 = fill_scalar(master.fcf_y1, fallbacks, |r| r.fcf_y1);
    out.fcf_y2 = fill_scalar(master.fcf_y2, fallbacks, |r| r.fcf_y2);
    out.fcf_y3 = fill_scalar(master.fcf_y3, fallbacks, |r| r.fcf_y3);
    out.fcf_y4 = fill_scalar(master.fcf_y4, fallbacks, |r| r.fcf_y4);
    out.fcf_y5 = fill_scalar(master.fcf_y5, fallbacks, |r| r.fcf_y5);
    out.fcf_y6 = fill_scalar(master.fcf_y6, fallbacks, |r| r.fcf_y6);
    out.fcf_y7 = fill_scalar(master.fcf_y7, fallbacks, |r| r.fcf_y7);
    out.fcf_y8 = fill_scalar(master.fcf_y8, fallbacks, |r| r.fcf_y8);
    out.fcf_y9 = fill_scalar(master.fcf_y9, fallbacks, |r| r.fcf_y9);
    out.fcf_y10 = fill_scalar(master.fcf_y10, fallbacks, |r| r.fcf_y10);

    out.asset_turnover = fill_scalar(master.asset_turnover, fallbacks, |r| r.asset_turnover);
    out.financial_leverage =
        fill_scalar(master.financial_leverage, fallbacks, |r| r.financial_leverage);
    out.roe = fill_scalar(master.roe, fallbacks, |r| r.roe);

    out.debt_to_equity = fill_scalar(master.debt_to_equity, fallbacks, |r| r.debt_to_equity);
    out.interest_coverage =
        fill_scalar(master.interest_coverage, fallbacks, |r| r.interest_coverage);
    out.cash_flow_to_debt =
        fill_scalar(master.cash_flow_to_debt, fallbacks, |r| r.cash_flow_to_debt);

    out
}

fn null_window(row: &mut CompanyRow, years: u32) {
    match years {
        3 => {
            row.return_3y = None;
            row.max_drawdown_3y = None;
            row.ar_mdd_ratio_3y = None;
        }
        5 => {
            row.return_5y = None;
            row.max_drawdown_5y = None;
            row.ar_mdd_ratio_5y = None;
        }
        _ => {
            row.return_10y = None;
            row.max_drawdown_10y = None;
            row.ar_mdd_ratio_10y = None;
        }
    }
}

/// Null out performance windows longer than the company has been public.
///
/// Fields that shorter history can still support are recomputed from the
/// row's persisted yearly series instead of being nulled: the ROIC average
/// and dispersion and the FCF-margin median all tolerate partial series.
pub fn apply_age_gate(row: &mut CompanyRow, ipo_date: Option<NaiveDate>, today: NaiveDate) {
    let age_years = ipo_date.and_then(|ipo| today.years_since(ipo));

    if let Some(age) = age_years {
        let mut gated = false;
        for window in [3u32, 5, 10] {
            if age < window {
                null_window(row, window);
                gated = true;
            }
        }

        if gated {
            let roic_series = row.roic_series();
            if roic_series.iter().any(Option::is_some) {
                row.roic_10y_avg = roic_average(&roic_series);
                row.roic_10y_std = roic_std(&roic_series);
            }
            let fcf = row.fcf_series();
            let revenue = row.revenue_series();
            if let Some(median) = fcf_margin_median(&fcf, &revenue) {
                row.fcf_margin_median_10y = Some(median);
            }
        }
    }

    // Profile IPO dates are unreliable for a handful of recent listings;
    // their 10-year fields are nulled regardless of the computed age.
    if RECENT_IPO_OVERRIDES.contains(&row.symbol.as_str()) {
        null_window(row, 10);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(symbol: &str) -> CompanyRow {
        CompanyRow {
            symbol: symbol.to_string(),
            ..CompanyRow::default()
        }
    }

    #[test]
    fn test_zero_master_price_takes_fallback() {
        let mut master = row("AAPL");
        master.price = Some(0.0);
        let mut fallback = row("AAPL");
        fallback.price = Some(42.0);

        let merged = merge_rows(master, &[fallback]);
        assert_eq!(merged.price, Some(42.0));
    }

    #[test]
    fn test_fallback_probe_order() {
        let mut master = row("AAPL");
        master.roe = None;
        let mut first = row("AAPL");
        first.roe = Some(0.18);
        let mut second = row("AAPL");
        second.roe = Some(0.25);

        let merged = merge_rows(master, &[first, second]);
        assert_eq!(merged.roe, Some(0.18));
    }

    #[test]
    fn test_master_wins_for_dcf_even_when_fallback_differs() {
        let mut master = row("AAPL");
        master.dcf_enterprise_value = Some(1000.0);
        let mut fallback = row("AAPL");
        fallback.dcf_enterprise_value = Some(2000.0);

        let merged = merge_rows(master, &[fallback]);
        assert_eq!(merged.dcf_enterprise_value, Some(1000.0));
    }

    #[test]
    fn test_dcf_falls_back_only_when_master_empty() {
        let master = row("AAPL");
        let mut fallback = row("AAPL");
        fallback.margin_of_safety = Some(0.3);

        let merged = merge_rows(master, &[fallback]);
        assert_eq!(merged.margin_of_safety, Some(0.3));
    }

    #[test]
    fn test_zero_kept_when_no_fallback_has_value() {
        let mut master = row("AAPL");
        master.price = Some(0.0);
        let merged = merge_rows(master, &[row("AAPL")]);
        assert_eq!(merged.price, Some(0.0));
    }

    #[test]
    fn test_age_gate_two_year_old_company() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let ipo = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let mut r = row("NEWCO");
        r.return_3y = Some(10.0);
        r.return_5y = Some(11.0);
        r.return_10y = Some(12.0);
        r.ar_mdd_ratio_3y = Some(1.0);

        apply_age_gate(&mut r, Some(ipo), today);
        assert_eq!(r.return_3y, None);
        assert_eq!(r.return_5y, None);
        assert_eq!(r.return_10y, None);
        assert_eq!(r.ar_mdd_ratio_3y, None);
    }

    #[test]
    fn test_age_gate_four_year_old_company_keeps_three_year_window() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let ipo = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let mut r = row("NEWCO");
        r.return_3y = Some(10.0);
        r.return_5y = Some(11.0);
        r.return_10y = Some(12.0);

        apply_age_gate(&mut r, Some(ipo), today);
        assert_eq!(r.return_3y, Some(10.0));
        assert_eq!(r.return_5y, None);
        assert_eq!(r.return_10y, None);
    }

    #[test]
    fn test_age_gate_recomputes_partial_statistics() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let ipo = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let mut r = row("NEWCO");
        r.roic_y1 = Some(0.10);
        r.roic_y2 = Some(0.20);
        r.roic_10y_avg = Some(0.99); // stale
        r.fcf_y1 = Some(100.0);
        r.revenue_y1 = Some(1000.0);

        apply_age_gate(&mut r, Some(ipo), today);
        assert_relative_eq!(r.roic_10y_avg.unwrap(), 0.15);
        assert_relative_eq!(r.roic_10y_std.unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(r.fcf_margin_median_10y.unwrap(), 0.10);
    }

    #[test]
    fn test_override_list_nulls_ten_year_fields() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut r = row("COIN");
        r.return_10y = Some(30.0);
        r.ar_mdd_ratio_10y = Some(0.5);
        r.return_3y = Some(5.0);

        // no IPO date available at all; the override still applies
        apply_age_gate(&mut r, None, today);
        assert_eq!(r.return_10y, None);
        assert_eq!(r.ar_mdd_ratio_10y, None);
        assert_eq!(r.return_3y, Some(5.0));
    }
}
