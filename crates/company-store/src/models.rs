use metrics_core::DerivedMetrics;
use serde::{Deserialize, Serialize};

/// One row of the shared company schema, as stored in the master table and
/// each index-membership table. All metric columns are nullable; series
/// slots live in `*_y1..*_y10` columns, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompanyRow {
    pub symbol: String,
    pub name: Option<String>,
    pub rank: Option<i32>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub currency: Option<String>,

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
    pub roic_y1: Option<f64>,
    pub roic_y2: Option<f64>,
    pub roic_y3: Option<f64>,
    pub roic_y4: Option<f64>,
    pub roic_y5: Option<f64>,
    pub roic_y6: Option<f64>,
    pub roic_y7: Option<f64>,
    pub roic_y8: Option<f64>,
    pub roic_y9: Option<f64>,
    pub roic_y10: Option<f64>,

    pub revenue_y1: Option<f64>,
    pub revenue_y2: Option<f64>,
    pub revenue_y3: Option<f64>,
    pub revenue_y4: Option<f64>,
    pub revenue_y5: Option<f64>,
    pub revenue_y6: Option<f64>,
    pub revenue_y7: Option<f64>,
    pub revenue_y8: Option<f64>,
    pub revenue_y9: Option<f64>,
    pub revenue_y10: Option<f64>,

    pub fcf_y1: Option<f64>,
    pub fcf_y2: Option<f64>,
    pub fcf_y3: Option<f64>,
    pub fcf_y4: Option<f64>,
    pub fcf_y5: Option<f64>,
    pub fcf_y6: Option<f64>,
    pub fcf_y7: Option<f64>,
    pub fcf_y8: Option<f64>,
    pub fcf_y9: Option<f64>,
    pub fcf_y10: Option<f64>,
    pub fcf_margin_median_10y: Option<f64>,

    pub asset_turnover: Option<f64>,
    pub financial_leverage: Option<f64>,
    pub roe: Option<f64>,

    pub debt_to_equity: Option<f64>,
    pub interest_coverage: Option<f64>,
    pub cash_flow_to_debt: Option<f64>,
}

impl CompanyRow {
    pub fn roic_series(&self) -> [Option<f64>; 10] {
        [
            self.roic_y1,
            self.roic_y2,
            self.roic_y3,
            self.roic_y4,
            self.roic_y5,
            self.roic_y6,
            self.roic_y7,
            self.roic_y8,
            self.roic_y9,
            self.roic_y10,
        ]
    }

    pub fn revenue_series(&self) -> [Option<f64>; 10] {
        [
            self.revenue_y1,
            self.revenue_y2,
            self.revenue_y3,
            self.revenue_y4,
            self.revenue_y5,
            self.revenue_y6,
            self.revenue_y7,
            self.revenue_y8,
            self.revenue_y9,
            self.revenue_y10,
        ]
    }

    pub fn fcf_series(&self) -> [Option<f64>; 10] {
        [
            self.fcf_y1,
            self.fcf_y2,
            self.fcf_y3,
            self.fcf_y4,
            self.fcf_y5,
            self.fcf_y6,
            self.fcf_y7,
            self.fcf_y8,
            self.fcf_y9,
            self.fcf_y10,
        ]
    }

    /// Copy every derived metric into the row, leaving identity fields alone.
    pub fn apply_metrics(&mut self, m: &DerivedMetrics) {
        self.dcf_enterprise_value = m.dcf_enterprise_value;
        self.margin_of_safety = m.margin_of_safety;
        self.dcf_implied_growth = m.dcf_implied_growth;

        self.return_3y = m.return_3y;
        self.return_5y = m.return_5y;
        self.return_10y = m.return_10y;
        self.max_drawdown_3y = m.max_drawdown_3y;
        self.max_drawdown_5y = m.max_drawdown_5y;
        self.max_drawdown_10y = m.max_drawdown_10y;
        self.ar_mdd_ratio_3y = m.ar_mdd_ratio_3y;
        self.ar_mdd_ratio_5y = m.ar_mdd_ratio_5y;
        self.ar_mdd_ratio_10y = m.ar_mdd_ratio_10y;

        self.roic = m.roic;
        self.roic_10y_avg = m.roic_10y_avg;
        self.roic_10y_std = m.roic_10y_std;
        [
            self.roic_y1,
            self.roic_y2,
            self.roic_y3,
            self.roic_y4,
            self.roic_y5,
            self.roic_y6,
            self.roic_y7,
            self.roic_y8,
            self.roic_y9,
            self.roic_y10,
        ] = m.roic_years;
        [
            self.revenue_y1,
            self.revenue_y2,
            self.revenue_y3,
            self.revenue_y4,
            self.revenue_y5,
            self.revenue_y6,
            self.revenue_y7,
            self.revenue_y8,
            self.revenue_y9,
            self.revenue_y10,
        ] = m.revenue_years;
        [
            self.fcf_y1,
            self.fcf_y2,
            self.fcf_y3,
            self.fcf_y4,
            self.fcf_y5,
            self.fcf_y6,
            self.fcf_y7,
            self.fcf_y8,
            self.fcf_y9,
            self.fcf_y10,
        ] = m.fcf_years;
        self.fcf_margin_median_10y = m.fcf_margin_median_10y;

        self.asset_turnover = m.asset_turnover;
        self.financial_leverage = m.financial_leverage;
        self.roe = m.roe;

        self.debt_to_equity = m.debt_to_equity;
        self.interest_coverage = m.interest_coverage;
        self.cash_flow_to_debt = m.cash_flow_to_debt;
    }
}
