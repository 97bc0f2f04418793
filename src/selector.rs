use crate::data::ReferenceData;
use crate::models::{
    ALL, AmPerformance, ChurnAccount, ChurnWindow, DashboardViewModel, FilterOptions,
    FilterState, Kpis, PartnerRecord, Period, Variant,
};
use std::collections::HashSet;
use tracing::debug;

const TOP_AM_LIMIT: usize = 10;
const GROWTH_AM_LIMIT: usize = 5;
const CHURN_ACCOUNT_LIMIT: usize = 5;
const TOP_PARTNER_LIMIT: usize = 20;
const TRAILING_MONTHS: usize = 12;

/// Derives everything the dashboard renders for one filter snapshot.
///
/// Unknown filter values are not errors: they simply match no rows.
pub fn compute_view_model(data: &ReferenceData, filters: &FilterState) -> DashboardViewModel {
    let state_filtered: Vec<&AmPerformance> = data
        .am_performance
        .iter()
        .filter(|am| filters.state.matches(&am.state))
        .collect();
    let focused: Vec<&AmPerformance> = state_filtered
        .into_iter()
        .filter(|am| filters.account_manager.matches(&am.name))
        .collect();

    let filtered_churn: Vec<&ChurnAccount> = data
        .churn_accounts
        .iter()
        .filter(|account| filters.product.matches(&account.product))
        .filter(|account| filters.state.matches(&account.state))
        .collect();

    let view = DashboardViewModel {
        filters: filters.clone(),
        account_manager_options: account_manager_options(data),
        revenue_trend: data.revenue_trend.clone(),
        product_sales: data
            .product_sales
            .iter()
            .filter(|row| filters.product.matches(&row.product))
            .cloned()
            .collect(),
        state_sales: data
            .state_sales
            .iter()
            .filter(|row| filters.state.matches(&row.state))
            .cloned()
            .collect(),
        top_ams: ranked(&focused, TOP_AM_LIMIT, |a, b| b.revenue.cmp(&a.revenue)),
        growth_ams: ranked(&focused, GROWTH_AM_LIMIT, |a, b| b.growth_yoy.total_cmp(&a.growth_yoy)),
        state_champions: data.state_champions.clone(),
        product_champions: data.product_champions.clone(),
        churn_by_state: data.churn_by_state.clone(),
        churn_by_product: data.churn_by_product.clone(),
        churn_trend: data.churn_trend.clone(),
        churn_accounts_1m: churn_for_window(&filtered_churn, ChurnWindow::OneMonth),
        churn_accounts_3m: churn_for_window(&filtered_churn, ChurnWindow::ThreeMonths),
        churn_accounts_6m: churn_for_window(&filtered_churn, ChurnWindow::SixMonths),
        dormant_partners: data
            .partners
            .iter()
            .filter(|partner| partner.is_dormant())
            .cloned()
            .collect(),
        top_partners: top_partners(&data.partners),
        top_plans: data.plans.clone(),
        kpis: kpis(data, filters.period),
    };

    debug!(
        period = %filters.period,
        state = %filters.state,
        product = %filters.product,
        account_manager = %filters.account_manager,
        top_ams = view.top_ams.len(),
        churn_accounts = filtered_churn.len(),
        "computed dashboard view model"
    );

    view
}

/// Distinct account manager names in first-seen order, after `All`.
pub fn account_manager_options(data: &ReferenceData) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(ALL.to_string())
        .chain(
            data.am_performance
                .iter()
                .filter(|am| seen.insert(am.name.as_str()))
                .map(|am| am.name.clone()),
        )
        .collect()
}

pub fn filter_options(data: &ReferenceData) -> FilterOptions {
    let with_all = |values: &[String]| -> Vec<String> {
        std::iter::once(ALL.to_string())
            .chain(values.iter().cloned())
            .collect()
    };

    FilterOptions {
        periods: Period::VARIANTS.to_vec(),
        states: with_all(&data.states),
        products: with_all(&data.products),
        account_managers: account_manager_options(data),
    }
}

/// Trailing twelve months of actuals scaled by the period's multiplier.
pub fn period_revenue(data: &ReferenceData, period: Period) -> u64 {
    let skip = data.revenue_trend.len().saturating_sub(TRAILING_MONTHS);
    let trailing: u64 = data.revenue_trend[skip..].iter().map(|point| point.actual).sum();
    (trailing as f64 * period.multiplier()).round() as u64
}

fn kpis(data: &ReferenceData, period: Period) -> Kpis {
    Kpis {
        ytd_revenue: period_revenue(data, period),
        mtd_revenue: data.revenue_trend.last().map(|point| point.actual).unwrap_or(0),
        growth_vs_lm: data.kpis.growth_vs_lm,
        growth_yoy: data.kpis.growth_yoy,
        active_accounts: data.product_sales.iter().map(|row| row.users).sum(),
        churn_rate: data.kpis.churn_rate,
        avg_margin: data.kpis.avg_margin,
        new_partners: data.kpis.new_partners,
    }
}

fn ranked<F>(rows: &[&AmPerformance], limit: usize, order: F) -> Vec<AmPerformance>
where
    F: FnMut(&&AmPerformance, &&AmPerformance) -> std::cmp::Ordering,
{
    let mut rows = rows.to_vec();
    rows.sort_by(order);
    rows.into_iter().take(limit).cloned().collect()
}

fn churn_for_window(accounts: &[&ChurnAccount], window: ChurnWindow) -> Vec<ChurnAccount> {
    let mut matching: Vec<&ChurnAccount> = accounts
        .iter()
        .copied()
        .filter(|account| account.window == window)
        .collect();
    matching.sort_by(|a, b| b.churn_value.cmp(&a.churn_value));
    matching.into_iter().take(CHURN_ACCOUNT_LIMIT).cloned().collect()
}

fn top_partners(partners: &[PartnerRecord]) -> Vec<PartnerRecord> {
    let mut earning: Vec<&PartnerRecord> = partners.iter().filter(|partner| partner.revenue > 0).collect();
    earning.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    earning.into_iter().take(TOP_PARTNER_LIMIT).cloned().collect()
}
