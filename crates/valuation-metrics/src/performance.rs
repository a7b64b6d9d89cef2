//! Windowed price performance: annualized return, maximum drawdown, and the
//! return-to-drawdown ratio for the 3/5/10-year horizons.

use chrono::{Months, NaiveDate};
use metrics_core::PricePoint;

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowPerformance {
    pub annualized_return_pct: Option<f64>,
    pub max_drawdown_pct: Option<f64>,
    pub ar_mdd_ratio: Option<f64>,
}

/// Largest running-peak-to-trough decline, as a percentage of the peak.
/// A single point has no defined drawdown.
pub fn max_drawdown_pct(closes: &[f64]) -> Option<f64> {
    if closes.len() < 2 {
        return None;
    }
    let mut peak = closes[0];
    let mut max_dd = 0.0;
    for &price in closes {
        if price > peak {
            peak = price;
        }
        if peak > 0.0 {
            let dd = (peak - price) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    Some(max_dd * 100.0)
}

/// Return per unit of realized peak-to-trough loss. Defined only when both
/// legs exist and the drawdown is strictly positive.
pub fn ar_mdd_ratio(return_pct: Option<f64>, drawdown_pct: Option<f64>) -> Option<f64> {
    match (return_pct, drawdown_pct) {
        (Some(ret), Some(mdd)) if mdd > 0.0 => {
            let ratio = (ret / 100.0) / (mdd / 100.0);
            ratio.is_finite().then_some(ratio)
        }
        _ => None,
    }
}

/// Compute the performance triple for one window length.
///
/// The history is sorted chronologically before anything else. A window is
/// only computed when the earliest available price is on or before
/// `now - years`; younger histories yield all-`None` (insufficient history,
/// not zero). The start price is the close nearest to `now - years`.
pub fn window_performance(prices: &[PricePoint], now: NaiveDate, years: u32) -> WindowPerformance {
    let mut sorted: Vec<PricePoint> = prices.to_vec();
    sorted.sort_by_key(|p| p.date);

    let Some(window_start) = now.checked_sub_months(Months::new(12 * years)) else {
        return WindowPerformance::default();
    };

    let earliest = match sorted.first() {
        Some(p) => p.date,
        None => return WindowPerformance::default(),
    };
    if earliest > window_start {
        return WindowPerformance::default();
    }

    // Nearest close to the window start, ties toward the earlier point
    let start_idx = sorted
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| (p.date - window_start).num_days().abs())
        .map(|(i, _)| i)
        .unwrap();

    let window = &sorted[start_idx..];
    let start_price = window[0].close;
    let end_price = window[window.len() - 1].close;

    let annualized_return_pct = if start_price > 0.0 && end_price > 0.0 {
        let ret = ((end_price / start_price).powf(1.0 / years as f64) - 1.0) * 100.0;
        ret.is_finite().then_some(ret)
    } else {
        None
    };

    let closes: Vec<f64> = window.iter().map(|p| p.close).collect();
    let max_dd = max_drawdown_pct(&closes);

    WindowPerformance {
        annualized_return_pct,
        max_drawdown_pct: max_dd,
        ar_mdd_ratio: ar_mdd_ratio(annualized_return_pct, max_dd),
    }
}
