//! Page-local derivations over a computed view model: tab selections,
//! re-sorting and the small summaries shown above each table.

use crate::models::{
    AmPerformance, AmProfile, ChurnAccount, ChurnTrendPoint, ChurnWindow, DashboardViewModel, ProductChurnSummary,
    StateChurnSummary, Variant, variant_text,
};
use serde::Serialize;

const GROWTH_LEADER_LIMIT: usize = 5;
const HIGH_RISK_CHURN_PCT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GrowthPeriod {
    #[serde(rename = "LM")]
    LastMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "YoY")]
    YearOnYear,
}

impl GrowthPeriod {
    pub fn value(self, am: &AmPerformance) -> f64 {
        match self {
            GrowthPeriod::LastMonth => am.growth_lm,
            GrowthPeriod::ThreeMonths => am.growth_3m,
            GrowthPeriod::SixMonths => am.growth_6m,
            GrowthPeriod::YearOnYear => am.growth_yoy,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GrowthPeriod::LastMonth => "vs Last Month",
            GrowthPeriod::ThreeMonths => "vs 3 Months",
            GrowthPeriod::SixMonths => "vs 6 Months",
            GrowthPeriod::YearOnYear => "Year over Year",
        }
    }
}

impl Variant for GrowthPeriod {
    const KIND: &'static str = "growth period";
    const VARIANTS: &'static [Self] = &[
        GrowthPeriod::LastMonth,
        GrowthPeriod::ThreeMonths,
        GrowthPeriod::SixMonths,
        GrowthPeriod::YearOnYear,
    ];

    fn label(self) -> &'static str {
        match self {
            GrowthPeriod::LastMonth => "LM",
            GrowthPeriod::ThreeMonths => "3M",
            GrowthPeriod::SixMonths => "6M",
            GrowthPeriod::YearOnYear => "YoY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Revenue,
    GrowthYoy,
    Margin,
}

impl Variant for SortField {
    const KIND: &'static str = "sort field";
    const VARIANTS: &'static [Self] = &[SortField::Revenue, SortField::GrowthYoy, SortField::Margin];

    fn label(self) -> &'static str {
        match self {
            SortField::Revenue => "revenue",
            SortField::GrowthYoy => "growth_yoy",
            SortField::Margin => "margin",
        }
    }
}

/// Panels of the account-manager card on the overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmTab {
    #[default]
    Top10,
    Growth,
    StateChampions,
    ProductChampions,
}

impl Variant for AmTab {
    const KIND: &'static str = "account manager tab";
    const VARIANTS: &'static [Self] = &[
        AmTab::Top10,
        AmTab::Growth,
        AmTab::StateChampions,
        AmTab::ProductChampions,
    ];

    fn label(self) -> &'static str {
        match self {
            AmTab::Top10 => "top10",
            AmTab::Growth => "growth",
            AmTab::StateChampions => "state_champions",
            AmTab::ProductChampions => "product_champions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartnerTab {
    #[default]
    Top20,
    Dormant,
}

impl Variant for PartnerTab {
    const KIND: &'static str = "partner tab";
    const VARIANTS: &'static [Self] = &[PartnerTab::Top20, PartnerTab::Dormant];

    fn label(self) -> &'static str {
        match self {
            PartnerTab::Top20 => "top20",
            PartnerTab::Dormant => "dormant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnBreakdown {
    #[default]
    State,
    Product,
}

impl Variant for ChurnBreakdown {
    const KIND: &'static str = "churn breakdown";
    const VARIANTS: &'static [Self] = &[ChurnBreakdown::State, ChurnBreakdown::Product];

    fn label(self) -> &'static str {
        match self {
            ChurnBreakdown::State => "state",
            ChurnBreakdown::Product => "product",
        }
    }
}

variant_text!(GrowthPeriod, SortField, AmTab, PartnerTab, ChurnBreakdown);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "breakdown", content = "rows", rename_all = "snake_case")]
pub enum ChurnBreakdownRows {
    State(Vec<StateChurnSummary>),
    Product(Vec<ProductChurnSummary>),
}

pub fn churn_breakdown(view: &DashboardViewModel, breakdown: ChurnBreakdown) -> ChurnBreakdownRows {
    match breakdown {
        ChurnBreakdown::State => ChurnBreakdownRows::State(view.churn_by_state.clone()),
        ChurnBreakdown::Product => ChurnBreakdownRows::Product(view.churn_by_product.clone()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnWindowSummary {
    pub window: ChurnWindow,
    pub accounts: Vec<ChurnAccount>,
    pub total_value: u64,
    pub high_risk: usize,
    pub average_pct: f64,
}

pub fn churn_window_summary(view: &DashboardViewModel, window: ChurnWindow) -> ChurnWindowSummary {
    let accounts = view.churn_accounts(window).to_vec();
    let total_value = accounts.iter().map(|account| account.churn_value).sum();
    let high_risk = accounts
        .iter()
        .filter(|account| account.churn_pct > HIGH_RISK_CHURN_PCT)
        .count();
    let average_pct = mean(accounts.iter().map(|account| account.churn_pct));

    ChurnWindowSummary {
        window,
        accounts,
        total_value,
        high_risk,
        average_pct,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnDetail {
    pub overall_churn_rate: f64,
    pub summary: ChurnWindowSummary,
    pub trend: Vec<ChurnTrendPoint>,
    pub breakdown: ChurnBreakdownRows,
}

pub fn churn_detail(
    view: &DashboardViewModel,
    window: ChurnWindow,
    breakdown: ChurnBreakdown,
) -> ChurnDetail {
    ChurnDetail {
        overall_churn_rate: view.kpis.churn_rate,
        summary: churn_window_summary(view, window),
        trend: view.churn_trend.clone(),
        breakdown: churn_breakdown(view, breakdown),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmPortfolioSummary {
    pub active: usize,
    pub total_revenue: u64,
    pub average_margin: f64,
    pub top_growth: f64,
    pub average_growth: f64,
}

pub fn am_portfolio(rows: &[AmPerformance]) -> AmPortfolioSummary {
    AmPortfolioSummary {
        active: rows.len(),
        total_revenue: rows.iter().map(|am| am.revenue).sum(),
        average_margin: mean(rows.iter().map(|am| am.margin)),
        top_growth: rows
            .iter()
            .map(|am| am.growth_yoy)
            .max_by(f64::total_cmp)
            .unwrap_or(0.0),
        average_growth: mean(rows.iter().map(|am| am.growth_yoy)),
    }
}

/// Stable descending sort by the chosen column.
pub fn sort_ams(rows: &[AmPerformance], field: SortField) -> Vec<AmPerformance> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| match field {
        SortField::Revenue => b.revenue.cmp(&a.revenue),
        SortField::GrowthYoy => b.growth_yoy.total_cmp(&a.growth_yoy),
        SortField::Margin => b.margin.total_cmp(&a.margin),
    });
    sorted
}

pub fn growth_leaders(rows: &[AmPerformance], period: GrowthPeriod) -> Vec<AmPerformance> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| period.value(b).total_cmp(&period.value(a)));
    sorted.truncate(GROWTH_LEADER_LIMIT);
    sorted
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmPerformanceDetail {
    pub growth_period: GrowthPeriod,
    /// Caption for the growth leaders list, e.g. "Year over Year".
    pub growth_caption: &'static str,
    pub sort: SortField,
    pub summary: AmPortfolioSummary,
    pub ranked: Vec<AmPerformance>,
    pub growth_leaders: Vec<AmPerformance>,
}

pub fn am_performance_detail(
    view: &DashboardViewModel,
    growth_period: GrowthPeriod,
    sort: SortField,
) -> AmPerformanceDetail {
    AmPerformanceDetail {
        growth_period,
        growth_caption: growth_period.description(),
        sort,
        summary: am_portfolio(&view.top_ams),
        ranked: sort_ams(&view.top_ams, sort),
        growth_leaders: growth_leaders(&view.top_ams, growth_period),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductShare {
    pub product: String,
    pub revenue: u64,
    /// Percentage of the manager's total revenue.
    pub share: f64,
    /// Bar width relative to the manager's largest product, 0 to 100.
    pub relative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmProfileDetail {
    #[serde(flatten)]
    pub profile: AmProfile,
    pub product_shares: Vec<ProductShare>,
}

impl AmProfile {
    pub fn product_shares(&self) -> Vec<ProductShare> {
        let largest = self.products.iter().map(|p| p.revenue).max().unwrap_or(0);
        self.products
            .iter()
            .map(|p| ProductShare {
                product: p.product.clone(),
                revenue: p.revenue,
                share: percent_of(p.revenue, self.revenue),
                relative: percent_of(p.revenue, largest),
            })
            .collect()
    }

    pub fn detail(&self) -> AmProfileDetail {
        AmProfileDetail {
            profile: self.clone(),
            product_shares: self.product_shares(),
        }
    }
}

fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReferenceData;
    use crate::models::{FilterState, Selection};
    use crate::selector::compute_view_model;

    fn default_view() -> DashboardViewModel {
        compute_view_model(ReferenceData::embedded(), &FilterState::default())
    }

    #[test]
    fn tab_labels_round_trip() {
        assert_eq!("growth".parse::<AmTab>().unwrap(), AmTab::Growth);
        assert_eq!("dormant".parse::<PartnerTab>().unwrap(), PartnerTab::Dormant);
        assert_eq!("yoy".parse::<GrowthPeriod>().unwrap(), GrowthPeriod::YearOnYear);
        assert_eq!(SortField::GrowthYoy.to_string(), "growth_yoy");
        assert!("weekly".parse::<ChurnBreakdown>().is_err());
    }

    #[test]
    fn churn_summary_counts_high_risk() {
        let view = default_view();
        let summary = churn_window_summary(&view, ChurnWindow::OneMonth);
        assert_eq!(summary.accounts.len(), 5);
        assert_eq!(summary.total_value, 18_420 + 14_980 + 12_300 + 10_890 + 9_750);
        assert_eq!(summary.high_risk, 2);
        let expected = (67.3 + 52.4 + 47.1 + 41.2 + 38.9) / 5.0;
        assert!((summary.average_pct - expected).abs() < 1e-9);
    }

    #[test]
    fn churn_summary_of_empty_window_is_zero() {
        let filters = FilterState {
            product: Selection::from("SMS"),
            ..FilterState::default()
        };
        let view = compute_view_model(ReferenceData::embedded(), &filters);
        let summary = churn_window_summary(&view, ChurnWindow::OneMonth);
        assert!(summary.accounts.is_empty());
        assert_eq!(summary.total_value, 0);
        assert_eq!(summary.high_risk, 0);
        assert_eq!(summary.average_pct, 0.0);
    }

    #[test]
    fn breakdown_selects_summary_series() {
        let view = default_view();
        match churn_breakdown(&view, ChurnBreakdown::Product) {
            ChurnBreakdownRows::Product(rows) => assert_eq!(rows.len(), 5),
            other => panic!("unexpected breakdown {other:?}"),
        }
    }

    #[test]
    fn churn_detail_combines_window_and_breakdown() {
        let view = default_view();
        let detail = churn_detail(&view, ChurnWindow::ThreeMonths, ChurnBreakdown::State);
        assert_eq!(detail.overall_churn_rate, 6.8);
        assert_eq!(detail.summary.window, ChurnWindow::ThreeMonths);
        assert_eq!(detail.summary.accounts.len(), 5);
        assert_eq!(detail.summary.high_risk, 1);
        assert_eq!(detail.trend.len(), 12);
        assert!(matches!(detail.breakdown, ChurnBreakdownRows::State(ref rows) if rows.len() == 5));
    }

    #[test]
    fn sort_by_margin_reorders_top_managers() {
        let view = default_view();
        let sorted = sort_ams(&view.top_ams, SortField::Margin);
        assert_eq!(sorted.len(), view.top_ams.len());
        assert_eq!(sorted[0].name, "Harish CK");
        assert!(sorted.windows(2).all(|w| w[0].margin >= w[1].margin));
    }

    #[test]
    fn growth_leaders_follow_selected_period() {
        let view = default_view();
        let leaders = growth_leaders(&view.top_ams, GrowthPeriod::SixMonths);
        assert_eq!(leaders.len(), 5);
        assert!(leaders.windows(2).all(|w| w[0].growth_6m >= w[1].growth_6m));
        assert_eq!(leaders[0].name, "Benson Yin");
    }

    #[test]
    fn performance_detail_captions_growth_period() {
        let view = default_view();
        let detail = am_performance_detail(&view, GrowthPeriod::LastMonth, SortField::Revenue);
        assert_eq!(detail.growth_caption, "vs Last Month");
        assert_eq!(detail.ranked, view.top_ams);
        assert_eq!(detail.growth_leaders[0].name, "Benson Yin");

        let detail = am_performance_detail(&view, GrowthPeriod::default(), SortField::Revenue);
        assert_eq!(detail.growth_caption, "Year over Year");
    }

    #[test]
    fn portfolio_summary_over_top_managers() {
        let view = default_view();
        let summary = am_portfolio(&view.top_ams);
        assert_eq!(summary.active, 10);
        assert_eq!(summary.total_revenue, view.top_ams.iter().map(|am| am.revenue).sum::<u64>());
        assert_eq!(summary.top_growth, 31.8);
    }

    #[test]
    fn portfolio_summary_of_nothing_is_zero() {
        let summary = am_portfolio(&[]);
        assert_eq!(summary.active, 0);
        assert_eq!(summary.total_revenue, 0);
        assert_eq!(summary.average_margin, 0.0);
        assert_eq!(summary.top_growth, 0.0);
        assert_eq!(summary.average_growth, 0.0);
    }

    #[test]
    fn profile_shares_relative_to_total_and_largest() {
        let profile = ReferenceData::embedded()
            .am_profile("Benson Yin")
            .expect("profile");
        let shares = profile.product_shares();
        assert_eq!(shares.len(), 3);
        assert_eq!(shares[0].product, "SIP");
        assert_eq!(shares[0].relative, 100.0);
        let total: f64 = shares.iter().map(|s| s.share).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn profile_with_no_revenue_has_zero_shares() {
        let mut profile = ReferenceData::embedded().am_profiles[0].clone();
        profile.revenue = 0;
        for product in &mut profile.products {
            product.revenue = 0;
        }
        assert!(profile.product_shares().iter().all(|s| s.share == 0.0 && s.relative == 0.0));
    }
}
