use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Sentinel filter value meaning "no filter".
pub const ALL: &str = "All";

/// A closed set of labelled choices, parsed from and rendered to their label.
pub trait Variant: Copy + PartialEq + 'static {
    const KIND: &'static str;
    const VARIANTS: &'static [Self];

    fn label(self) -> &'static str;
}

pub fn parse_variant<T: Variant>(value: &str) -> Result<T, ParseVariantError> {
    let value = value.trim();
    T::VARIANTS
        .iter()
        .copied()
        .find(|variant| variant.label().eq_ignore_ascii_case(value))
        .ok_or_else(|| ParseVariantError {
            kind: T::KIND,
            value: value.to_string(),
        })
}

/// Parses an optional query value, falling back to the variant's default.
pub fn parse_or_default<T: Variant + Default>(value: Option<&str>) -> Result<T, ParseVariantError> {
    match value {
        Some(value) if !value.trim().is_empty() => parse_variant(value),
        _ => Ok(T::default()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseVariantError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Period {
    #[serde(rename = "MTD")]
    Mtd,
    #[serde(rename = "QTD")]
    Qtd,
    #[default]
    #[serde(rename = "YTD")]
    Ytd,
    #[serde(rename = "12M")]
    TwelveMonths,
}

impl Period {
    /// Scale applied to the trailing twelve months of revenue. These are
    /// authored display factors, not calendar arithmetic.
    pub fn multiplier(self) -> f64 {
        match self {
            Period::Mtd => 0.22,
            Period::Qtd => 0.68,
            Period::Ytd => 1.0,
            Period::TwelveMonths => 1.12,
        }
    }
}

impl Variant for Period {
    const KIND: &'static str = "period";
    const VARIANTS: &'static [Self] = &[
        Period::Mtd,
        Period::Qtd,
        Period::Ytd,
        Period::TwelveMonths,
    ];

    fn label(self) -> &'static str {
        match self {
            Period::Mtd => "MTD",
            Period::Qtd => "QTD",
            Period::Ytd => "YTD",
            Period::TwelveMonths => "12M",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChurnWindow {
    #[default]
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
}

impl Variant for ChurnWindow {
    const KIND: &'static str = "churn window";
    const VARIANTS: &'static [Self] = &[
        ChurnWindow::OneMonth,
        ChurnWindow::ThreeMonths,
        ChurnWindow::SixMonths,
    ];

    fn label(self) -> &'static str {
        match self {
            ChurnWindow::OneMonth => "1M",
            ChurnWindow::ThreeMonths => "3M",
            ChurnWindow::SixMonths => "6M",
        }
    }
}

macro_rules! variant_text {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ::std::str::FromStr for $ty {
                type Err = $crate::models::ParseVariantError;

                fn from_str(value: &str) -> Result<Self, Self::Err> {
                    $crate::models::parse_variant(value)
                }
            }

            impl ::std::fmt::Display for $ty {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(<$ty as $crate::models::Variant>::label(*self))
                }
            }
        )+
    };
}

pub(crate) use variant_text;

variant_text!(Period, ChurnWindow);

/// A string filter: either the `All` sentinel or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => ALL,
            Selection::Only(value) => value,
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value)
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::from(value.to_string())
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => ALL.to_string(),
            Selection::Only(value) => value,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub period: Period,
    pub state: Selection,
    pub product: Selection,
    pub account_manager: Selection,
}

/// Partial filter change; absent fields keep the base snapshot's value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterUpdate {
    pub period: Option<String>,
    pub state: Option<String>,
    pub product: Option<String>,
    pub account_manager: Option<String>,
}

impl FilterUpdate {
    pub fn is_empty(&self) -> bool {
        self.period.is_none()
            && self.state.is_none()
            && self.product.is_none()
            && self.account_manager.is_none()
    }

    /// Builds a complete snapshot from `base` and this update.
    pub fn apply(&self, base: &FilterState) -> Result<FilterState, ParseVariantError> {
        let period = match self.period.as_deref() {
            Some(value) => value.parse()?,
            None => base.period,
        };
        let pick = |update: &Option<String>, current: &Selection| {
            update
                .as_ref()
                .map(|value| Selection::from(value.trim()))
                .unwrap_or_else(|| current.clone())
        };

        Ok(FilterState {
            period,
            state: pick(&self.state, &base.state),
            product: pick(&self.product, &base.product),
            account_manager: pick(&self.account_manager, &base.account_manager),
        })
    }
}

pub(crate) fn serialize_month<S: Serializer>(month: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&month.format("%b %y"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePoint {
    #[serde(serialize_with = "serialize_month")]
    pub month: NaiveDate,
    pub actual: u64,
    pub forecast: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product: String,
    pub revenue: u64,
    pub users: u64,
    pub growth_lm: f64,
    pub growth_yoy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSales {
    pub state: String,
    pub revenue: u64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmPerformance {
    pub name: String,
    pub state: String,
    pub revenue: u64,
    pub growth_lm: f64,
    pub growth_3m: f64,
    pub growth_6m: f64,
    pub growth_yoy: f64,
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnAccount {
    pub account: String,
    pub partner: String,
    pub state: String,
    pub product: String,
    pub churn_value: u64,
    pub churn_pct: f64,
    pub window: ChurnWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerRecord {
    pub partner: String,
    pub signed_contract: bool,
    pub revenue: u64,
    pub growth_yoy: f64,
}

impl PartnerRecord {
    pub fn is_dormant(&self) -> bool {
        self.signed_contract && self.revenue == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRecord {
    pub plan: String,
    pub product: String,
    pub users: u64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRevenue {
    pub product: String,
    pub revenue: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmProfile {
    pub name: String,
    pub state: String,
    pub revenue: u64,
    pub growth_yoy: f64,
    pub margin: f64,
    pub products: Vec<ProductRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChampion {
    pub state: String,
    pub am: String,
    pub revenue: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductChampion {
    pub product: String,
    pub am: String,
    pub revenue: u64,
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChurnSummary {
    pub state: String,
    pub churn_rate: f64,
    pub at_risk: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductChurnSummary {
    pub product: String,
    pub churn_rate: f64,
    pub accounts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnTrendPoint {
    #[serde(serialize_with = "serialize_month")]
    pub month: NaiveDate,
    pub rate: f64,
}

/// Headline figures that are authored rather than derived.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AuthoredKpis {
    pub growth_vs_lm: f64,
    pub growth_yoy: f64,
    pub churn_rate: f64,
    pub avg_margin: f64,
    pub new_partners: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub ytd_revenue: u64,
    pub mtd_revenue: u64,
    pub growth_vs_lm: f64,
    pub growth_yoy: f64,
    pub active_accounts: u64,
    pub churn_rate: f64,
    pub avg_margin: f64,
    pub new_partners: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViewModel {
    pub filters: FilterState,
    pub account_manager_options: Vec<String>,
    pub revenue_trend: Vec<RevenuePoint>,
    pub product_sales: Vec<ProductSales>,
    pub state_sales: Vec<StateSales>,
    pub top_ams: Vec<AmPerformance>,
    pub growth_ams: Vec<AmPerformance>,
    pub state_champions: Vec<StateChampion>,
    pub product_champions: Vec<ProductChampion>,
    pub churn_by_state: Vec<StateChurnSummary>,
    pub churn_by_product: Vec<ProductChurnSummary>,
    pub churn_trend: Vec<ChurnTrendPoint>,
    pub churn_accounts_1m: Vec<ChurnAccount>,
    pub churn_accounts_3m: Vec<ChurnAccount>,
    pub churn_accounts_6m: Vec<ChurnAccount>,
    pub dormant_partners: Vec<PartnerRecord>,
    pub top_partners: Vec<PartnerRecord>,
    pub top_plans: Vec<PlanRecord>,
    pub kpis: Kpis,
}

impl DashboardViewModel {
    pub fn churn_accounts(&self, window: ChurnWindow) -> &[ChurnAccount] {
        match window {
            ChurnWindow::OneMonth => &self.churn_accounts_1m,
            ChurnWindow::ThreeMonths => &self.churn_accounts_3m,
            ChurnWindow::SixMonths => &self.churn_accounts_6m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub periods: Vec<Period>,
    pub states: Vec<String>,
    pub products: Vec<String>,
    pub account_managers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FiltersResponse {
    pub filters: FilterState,
    pub options: FilterOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_parses_labels_case_insensitively() {
        assert_eq!("12m".parse::<Period>().unwrap(), Period::TwelveMonths);
        assert_eq!(" QTD ".parse::<Period>().unwrap(), Period::Qtd);
        let err = "FY".parse::<Period>().unwrap_err();
        assert_eq!(err.to_string(), "unknown period 'FY'");
    }

    #[test]
    fn missing_or_blank_values_use_default() {
        assert_eq!(parse_or_default::<Period>(None).unwrap(), Period::Ytd);
        assert_eq!(parse_or_default::<Period>(Some("  ")).unwrap(), Period::Ytd);
        assert_eq!(parse_or_default::<ChurnWindow>(Some("6m")).unwrap(), ChurnWindow::SixMonths);
        assert!(parse_or_default::<Period>(Some("week")).is_err());
    }

    #[test]
    fn period_multiplier_table() {
        assert_eq!(Period::Mtd.multiplier(), 0.22);
        assert_eq!(Period::Qtd.multiplier(), 0.68);
        assert_eq!(Period::Ytd.multiplier(), 1.0);
        assert_eq!(Period::TwelveMonths.multiplier(), 1.12);
    }

    #[test]
    fn selection_treats_all_as_sentinel() {
        assert_eq!(Selection::from("All"), Selection::All);
        assert!(Selection::All.matches("anything"));
        let nsw = Selection::from("NSW");
        assert!(nsw.matches("NSW"));
        assert!(!nsw.matches("VIC"));
        assert_eq!(String::from(nsw), "NSW");
    }

    #[test]
    fn filter_state_serializes_with_labels() {
        let filters = FilterState {
            period: Period::TwelveMonths,
            state: Selection::from("NSW"),
            ..FilterState::default()
        };
        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "period": "12M",
                "state": "NSW",
                "product": "All",
                "account_manager": "All"
            })
        );
        let back: FilterState = serde_json::from_value(value).unwrap();
        assert_eq!(back, filters);
    }

    #[test]
    fn filter_update_keeps_unset_fields() {
        let base = FilterState {
            period: Period::Mtd,
            product: Selection::from("SMS"),
            ..FilterState::default()
        };
        let update = FilterUpdate {
            state: Some("VIC".to_string()),
            ..FilterUpdate::default()
        };
        let next = update.apply(&base).unwrap();
        assert_eq!(next.period, Period::Mtd);
        assert_eq!(next.state, Selection::from("VIC"));
        assert_eq!(next.product, Selection::from("SMS"));
        assert_eq!(next.account_manager, Selection::All);
    }

    #[test]
    fn filter_update_rejects_unknown_period() {
        let update = FilterUpdate {
            period: Some("fortnight".to_string()),
            ..FilterUpdate::default()
        };
        assert!(update.apply(&FilterState::default()).is_err());
    }

    #[test]
    fn month_serializes_as_short_label() {
        let point = RevenuePoint {
            month: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            actual: 1,
            forecast: 2,
        };
        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(value["month"], "Sep 24");
    }
}
