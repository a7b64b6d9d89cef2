/// Shared column set applied to the master table and every index table.
/// The redundancy across tables is deliberate; reconciliation papers over
/// the resulting staleness at read time.
pub fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            symbol TEXT PRIMARY KEY,
            name TEXT,
            rank INTEGER,
            price DOUBLE PRECISION,
            market_cap DOUBLE PRECISION,
            currency TEXT,

            dcf_enterprise_value DOUBLE PRECISION,
            margin_of_safety DOUBLE PRECISION,
            dcf_implied_growth DOUBLE PRECISION,

            return_3y DOUBLE PRECISION,
            return_5y DOUBLE PRECISION,
            return_10y DOUBLE PRECISION,
            max_drawdown_3y DOUBLE PRECISION,
            max_drawdown_5y DOUBLE PRECISION,
            max_drawdown_10y DOUBLE PRECISION,
            ar_mdd_ratio_3y DOUBLE PRECISION,
            ar_mdd_ratio_5y DOUBLE PRECISION,
            ar_mdd_ratio_10y DOUBLE PRECISION,

            roic DOUBLE PRECISION,
            roic_10y_avg DOUBLE PRECISION,
            roic_10y_std DOUBLE PRECISION,
            roic_y1 DOUBLE PRECISION,
            roic_y2 DOUBLE PRECISION,
            roic_y3 DOUBLE PRECISION,
            roic_y4 DOUBLE PRECISION,
            roic_y5 DOUBLE PRECISION,
            roic_y6 DOUBLE PRECISION,
            roic_y7 DOUBLE PRECISION,
            roic_y8 DOUBLE PRECISION,
            roic_y9 DOUBLE PRECISION,
            roic_y10 DOUBLE PRECISION,

            revenue_y1 DOUBLE PRECISION,
            revenue_y2 DOUBLE PRECISION,
            revenue_y3 DOUBLE PRECISION,
            revenue_y4 DOUBLE PRECISION,
            revenue_y5 DOUBLE PRECISION,
            revenue_y6 DOUBLE PRECISION,
            revenue_y7 DOUBLE PRECISION,
            revenue_y8 DOUBLE PRECISION,
            revenue_y9 DOUBLE PRECISION,
            revenue_y10 DOUBLE PRECISION,

            fcf_y1 DOUBLE PRECISION,
            fcf_y2 DOUBLE PRECISION,
            fcf_y3 DOUBLE PRECISION,
            fcf_y4 DOUBLE PRECISION,
            fcf_y5 DOUBLE PRECISION,
            fcf_y6 DOUBLE PRECISION,
            fcf_y7 DOUBLE PRECISION,
            fcf_y8 DOUBLE PRECISION,
            fcf_y9 DOUBLE PRECISION,
            fcf_y10 DOUBLE PRECISION,
            fcf_margin_median_10y DOUBLE PRECISION,

            asset_turnover DOUBLE PRECISION,
            financial_leverage DOUBLE PRECISION,
            roe DOUBLE PRECISION,

            debt_to_equity DOUBLE PRECISION,
            interest_coverage DOUBLE PRECISION,
            cash_flow_to_debt DOUBLE PRECISION,

            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#
    )
}
