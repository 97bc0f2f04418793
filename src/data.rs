use crate::models::{
    AmPerformance, AmProfile, AuthoredKpis, ChurnAccount, ChurnTrendPoint, ChurnWindow,
    PartnerRecord, PlanRecord, ProductChampion, ProductChurnSummary, ProductRevenue,
    ProductSales, RevenuePoint, StateChampion, StateChurnSummary, StateSales,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;

/// Every table the dashboard reads. Built once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub states: Vec<String>,
    pub products: Vec<String>,
    pub revenue_trend: Vec<RevenuePoint>,
    pub product_sales: Vec<ProductSales>,
    pub state_sales: Vec<StateSales>,
    pub am_performance: Vec<AmPerformance>,
    pub am_profiles: Vec<AmProfile>,
    pub churn_accounts: Vec<ChurnAccount>,
    pub churn_by_state: Vec<StateChurnSummary>,
    pub churn_by_product: Vec<ProductChurnSummary>,
    pub churn_trend: Vec<ChurnTrendPoint>,
    pub partners: Vec<PartnerRecord>,
    pub plans: Vec<PlanRecord>,
    pub state_champions: Vec<StateChampion>,
    pub product_champions: Vec<ProductChampion>,
    pub kpis: AuthoredKpis,
}

static EMBEDDED: Lazy<ReferenceData> = Lazy::new(ReferenceData::build_embedded);

impl ReferenceData {
    /// The process-wide embedded dataset.
    pub fn embedded() -> &'static ReferenceData {
        &EMBEDDED
    }

    pub fn am_profile(&self, name: &str) -> Option<&AmProfile> {
        self.am_profiles.iter().find(|profile| profile.name == name)
    }

    fn build_embedded() -> Self {
        Self {
            states: strings(&["NSW", "VIC", "QLD", "WA", "SA"]),
            products: strings(&["SIP", "NBN", "Fibre", "SMS", "Teams"]),
            revenue_trend: revenue_trend(),
            product_sales: product_sales(),
            state_sales: state_sales(),
            am_performance: am_performance(),
            am_profiles: am_profiles(),
            churn_accounts: churn_accounts(),
            churn_by_state: churn_by_state(),
            churn_by_product: churn_by_product(),
            churn_trend: churn_trend(),
            partners: partners(),
            plans: plans(),
            state_champions: state_champions(),
            product_champions: product_champions(),
            kpis: AuthoredKpis {
                growth_vs_lm: 5.8,
                growth_yoy: 17.2,
                churn_rate: 6.8,
                avg_margin: 21.3,
                new_partners: 4,
            },
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
}

fn revenue_trend() -> Vec<RevenuePoint> {
    [
        (2024, 9, 298_000, 295_000),
        (2024, 10, 312_000, 308_000),
        (2024, 11, 327_000, 320_000),
        (2024, 12, 318_000, 330_000),
        (2025, 1, 341_000, 340_000),
        (2025, 2, 352_000, 348_000),
        (2025, 3, 366_000, 362_000),
        (2025, 4, 377_000, 372_000),
        (2025, 5, 390_000, 386_000),
        (2025, 6, 401_000, 396_000),
        (2025, 7, 418_000, 411_000),
        (2025, 8, 430_000, 424_000),
        (2025, 9, 446_000, 438_000),
        (2025, 10, 457_000, 450_000),
        (2025, 11, 469_000, 461_000),
        (2025, 12, 481_000, 476_000),
        (2026, 1, 493_000, 488_000),
        (2026, 2, 508_000, 499_000),
    ]
    .into_iter()
    .map(|(year, m, actual, forecast)| RevenuePoint {
        month: month(year, m),
        actual,
        forecast,
    })
    .collect()
}

fn product_sales() -> Vec<ProductSales> {
    [
        ("SIP", 1_520_000, 11_840, 6.4, 18.1),
        ("NBN", 1_040_000, 7_340, 4.7, 15.6),
        ("Fibre", 860_000, 3_110, 5.1, 13.9),
        ("Teams", 635_000, 4_590, 5.9, 16.7),
        ("SMS", 418_000, 2_920, 3.8, 11.3),
    ]
    .into_iter()
    .map(|(product, revenue, users, growth_lm, growth_yoy)| ProductSales {
        product: product.to_string(),
        revenue,
        users,
        growth_lm,
        growth_yoy,
    })
    .collect()
}

fn state_sales() -> Vec<StateSales> {
    [
        ("NSW", 1_520_000, 34.8),
        ("VIC", 1_210_000, 27.7),
        ("QLD", 842_000, 19.3),
        ("WA", 502_000, 11.5),
        ("SA", 288_000, 6.6),
    ]
    .into_iter()
    .map(|(state, revenue, share)| StateSales {
        state: state.to_string(),
        revenue,
        share,
    })
    .collect()
}

fn am_performance() -> Vec<AmPerformance> {
    [
        ("Benson Yin", "NSW", 420_000, 9.2, 15.1, 23.4, 31.8, 24.2),
        ("Mia Zhang", "VIC", 401_000, 8.7, 14.2, 20.1, 29.6, 22.9),
        ("Harish CK", "QLD", 364_000, 7.4, 12.8, 19.4, 24.1, 25.1),
        ("Mark Marikkar", "WA", 301_000, 6.1, 10.6, 14.9, 19.4, 21.8),
        ("Raymond Wong", "NSW", 286_000, 5.8, 11.2, 16.6, 21.2, 23.4),
        ("David Sloss", "VIC", 272_000, 4.3, 9.1, 12.2, 17.3, 20.6),
        ("Andoni Tsokos", "QLD", 246_000, 3.9, 8.4, 11.1, 14.9, 19.8),
        ("Scott Shariffdeen", "SA", 219_000, 3.1, 7.9, 10.3, 13.7, 18.9),
        ("Andy Kris", "WA", 204_000, 2.7, 6.8, 9.2, 11.5, 17.7),
        ("Grant Abbott", "NSW", 192_000, 2.5, 6.2, 8.4, 10.8, 17.1),
        ("Chris Eustace", "QLD", 186_000, 2.3, 5.4, 7.6, 9.9, 16.4),
        ("Victor Huang", "VIC", 174_000, 2.1, 5.0, 7.1, 9.2, 16.0),
        ("Andy Nguyen", "NSW", 168_000, 1.9, 4.7, 6.4, 7.8, 15.9),
        ("Nathan Puri", "WA", 152_000, 1.7, 4.2, 5.8, 7.1, 15.6),
        ("Kevin Zhang", "SA", 141_000, 1.6, 3.9, 5.1, 6.2, 15.4),
    ]
    .into_iter()
    .map(
        |(name, state, revenue, growth_lm, growth_3m, growth_6m, growth_yoy, margin)| AmPerformance {
            name: name.to_string(),
            state: state.to_string(),
            revenue,
            growth_lm,
            growth_3m,
            growth_6m,
            growth_yoy,
            margin,
        },
    )
    .collect()
}

/// Product mix per account manager. Headline figures mirror the AM
/// performance table so the hover/detail views agree with the rankings.
fn am_profiles() -> Vec<AmProfile> {
    let mixes: [(&str, &[(&str, u64)]); 15] = [
        ("Benson Yin", &[("SIP", 298_000), ("NBN", 72_000), ("Teams", 50_000)]),
        ("Mia Zhang", &[("NBN", 254_000), ("SIP", 98_000), ("Fibre", 49_000)]),
        ("Harish CK", &[("Teams", 201_000), ("SIP", 112_000), ("NBN", 51_000)]),
        ("Mark Marikkar", &[("Fibre", 190_000), ("NBN", 68_000), ("SIP", 43_000)]),
        ("Raymond Wong", &[("SMS", 124_000), ("SIP", 102_000), ("Teams", 60_000)]),
        ("David Sloss", &[("SIP", 118_000), ("Fibre", 86_000), ("SMS", 68_000)]),
        ("Andoni Tsokos", &[("NBN", 104_000), ("SIP", 92_000), ("Teams", 50_000)]),
        ("Scott Shariffdeen", &[("SIP", 96_000), ("NBN", 71_000), ("Fibre", 52_000)]),
        ("Andy Kris", &[("NBN", 88_000), ("Teams", 64_000), ("SMS", 52_000)]),
        ("Grant Abbott", &[("Fibre", 84_000), ("SIP", 70_000), ("SMS", 38_000)]),
        ("Chris Eustace", &[("SIP", 81_000), ("Fibre", 63_000), ("NBN", 42_000)]),
        ("Victor Huang", &[("Teams", 79_000), ("NBN", 58_000), ("SMS", 37_000)]),
        ("Andy Nguyen", &[("SIP", 74_000), ("NBN", 56_000), ("Fibre", 38_000)]),
        ("Nathan Puri", &[("NBN", 67_000), ("SIP", 51_000), ("Teams", 34_000)]),
        ("Kevin Zhang", &[("SIP", 62_000), ("SMS", 45_000), ("NBN", 34_000)]),
    ];
    let performance = am_performance();

    mixes
        .into_iter()
        .filter_map(|(name, mix)| {
            let am = performance.iter().find(|am| am.name == name)?;
            Some(AmProfile {
                name: am.name.clone(),
                state: am.state.clone(),
                revenue: am.revenue,
                growth_yoy: am.growth_yoy,
                margin: am.margin,
                products: mix
                    .iter()
                    .map(|(product, revenue)| ProductRevenue {
                        product: product.to_string(),
                        revenue: *revenue,
                    })
                    .collect(),
            })
        })
        .collect()
}

fn churn_accounts() -> Vec<ChurnAccount> {
    use ChurnWindow::{OneMonth, SixMonths, ThreeMonths};

    [
        ("Harbor Dental Group", "Connective One", "NSW", "SIP", 18_420, 67.3, OneMonth),
        ("Arden Legal", "Connective One", "QLD", "Teams", 14_980, 52.4, OneMonth),
        ("Clarity Optics", "Voxel Comms", "VIC", "Fibre", 12_300, 47.1, OneMonth),
        ("BlueStone HVAC", "Edge Telecoms", "SA", "NBN", 10_890, 41.2, OneMonth),
        ("Westfield Motors", "Skyline Partner", "WA", "SIP", 9_750, 38.9, OneMonth),
        ("TechVault IT", "BizzTel", "NSW", "Teams", 8_400, 33.6, OneMonth),
        ("Southline Transport", "BizzTel", "VIC", "NBN", 16_210, 59.8, ThreeMonths),
        ("Northlake Schools", "Voxel Comms", "WA", "SIP", 12_710, 45.7, ThreeMonths),
        ("FleetEase Group", "Skyline Partner", "QLD", "NBN", 9_800, 34.2, ThreeMonths),
        ("GreenLeaf Farms", "Nova Carrier", "QLD", "SMS", 8_100, 30.4, ThreeMonths),
        ("Summit Engineers", "Helix Connect", "SA", "Fibre", 7_350, 28.1, ThreeMonths),
        ("Metro Health Co", "Unified Reach", "NSW", "Fibre", 13_230, 48.1, SixMonths),
        ("Prime Interior", "BizzTel", "VIC", "SMS", 10_200, 37.6, SixMonths),
        ("Coastal Dining", "MetroWire", "QLD", "SIP", 9_100, 32.8, SixMonths),
        ("Atlas Mining", "Kite Reach", "WA", "NBN", 7_900, 27.4, SixMonths),
        ("Redpoint Legal", "SolidTel", "SA", "Teams", 6_400, 23.8, SixMonths),
    ]
    .into_iter()
    .map(
        |(account, partner, state, product, churn_value, churn_pct, window)| ChurnAccount {
            account: account.to_string(),
            partner: partner.to_string(),
            state: state.to_string(),
            product: product.to_string(),
            churn_value,
            churn_pct,
            window,
        },
    )
    .collect()
}

fn churn_by_state() -> Vec<StateChurnSummary> {
    [("NSW", 8.4, 14), ("VIC", 7.2, 11), ("QLD", 6.9, 9), ("WA", 5.8, 7), ("SA", 5.1, 4)]
        .into_iter()
        .map(|(state, churn_rate, at_risk)| StateChurnSummary {
            state: state.to_string(),
            churn_rate,
            at_risk,
        })
        .collect()
}

fn churn_by_product() -> Vec<ProductChurnSummary> {
    [("SIP", 7.6, 18), ("NBN", 6.9, 14), ("Fibre", 5.4, 8), ("Teams", 5.1, 7), ("SMS", 4.3, 5)]
        .into_iter()
        .map(|(product, churn_rate, accounts)| ProductChurnSummary {
            product: product.to_string(),
            churn_rate,
            accounts,
        })
        .collect()
}

fn churn_trend() -> Vec<ChurnTrendPoint> {
    [
        (2025, 3, 7.8),
        (2025, 4, 7.5),
        (2025, 5, 7.1),
        (2025, 6, 7.3),
        (2025, 7, 6.9),
        (2025, 8, 6.6),
        (2025, 9, 6.4),
        (2025, 10, 7.0),
        (2025, 11, 6.7),
        (2025, 12, 6.5),
        (2026, 1, 6.9),
        (2026, 2, 6.8),
    ]
    .into_iter()
    .map(|(year, m, rate)| ChurnTrendPoint {
        month: month(year, m),
        rate,
    })
    .collect()
}

fn partners() -> Vec<PartnerRecord> {
    [
        ("Connective One", 720_000, 24.2),
        ("BizzTel", 654_000, 17.6),
        ("Unified Reach", 590_000, 12.3),
        ("Skyline Partner", 534_000, 10.5),
        ("Voxel Comms", 482_000, 8.9),
        ("Edge Telecoms", 431_000, 7.4),
        ("Helix Connect", 389_000, 6.8),
        ("Nova Carrier", 372_000, 5.2),
        ("MetroWire", 351_000, 4.6),
        ("Kite Reach", 340_000, 3.8),
        ("SolidTel", 322_000, 3.1),
        ("Harbor Link", 309_000, 2.7),
        ("Zenline", 286_000, 1.9),
        ("Nexus Group", 280_000, 1.2),
        ("Blue Transit", 275_000, -0.9),
        ("Core Relay", 264_000, -1.6),
        ("Astra Networks", 249_000, -2.4),
        ("Zen Carrier", 236_000, -3.1),
        ("Pulse Tele", 230_000, -4.2),
        ("Orbit Wholesale", 226_000, -5.1),
        ("Origin Relay", 210_000, -5.9),
        ("Arrow Comms", 198_000, -6.7),
        ("Dormant Prime", 0, -100.0),
        ("Dormant Harbor", 0, -100.0),
        ("Dormant Bell", 0, -100.0),
    ]
    .into_iter()
    .map(|(partner, revenue, growth_yoy)| PartnerRecord {
        partner: partner.to_string(),
        signed_contract: true,
        revenue,
        growth_yoy,
    })
    .collect()
}

fn plans() -> Vec<PlanRecord> {
    [
        ("SIP Unlimited Business 10", "SIP", 1_840, 15.4),
        ("NBN Enterprise 250/100", "NBN", 1_490, 13.7),
        ("Teams DR Pro 20", "Teams", 1_280, 11.1),
        ("Fibre Premium 500/500", "Fibre", 910, 9.8),
        ("SMS Connect Bulk 5K", "SMS", 760, 7.4),
    ]
    .into_iter()
    .map(|(plan, product, users, contribution)| PlanRecord {
        plan: plan.to_string(),
        product: product.to_string(),
        users,
        contribution,
    })
    .collect()
}

fn state_champions() -> Vec<StateChampion> {
    [
        ("NSW", "Benson Yin", 420_000),
        ("VIC", "Mia Zhang", 401_000),
        ("QLD", "Harish CK", 364_000),
        ("WA", "Mark Marikkar", 301_000),
        ("SA", "Scott Shariffdeen", 219_000),
    ]
    .into_iter()
    .map(|(state, am, revenue)| StateChampion {
        state: state.to_string(),
        am: am.to_string(),
        revenue,
    })
    .collect()
}

fn product_champions() -> Vec<ProductChampion> {
    [
        ("SIP", "Benson Yin", 298_000, 25.7),
        ("NBN", "Mia Zhang", 254_000, 24.4),
        ("Fibre", "Mark Marikkar", 190_000, 22.1),
        ("Teams", "Harish CK", 201_000, 23.8),
        ("SMS", "Raymond Wong", 124_000, 20.9),
    ]
    .into_iter()
    .map(|(product, am, revenue, margin)| ProductChampion {
        product: product.to_string(),
        am: am.to_string(),
        revenue,
        margin,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_is_built_once() {
        assert!(std::ptr::eq(ReferenceData::embedded(), ReferenceData::embedded()));
    }

    #[test]
    fn revenue_trend_is_chronological() {
        let data = ReferenceData::embedded();
        assert_eq!(data.revenue_trend.len(), 18);
        assert!(data.revenue_trend.windows(2).all(|pair| pair[0].month < pair[1].month));
        assert!(data.churn_trend.windows(2).all(|pair| pair[0].month < pair[1].month));
    }

    #[test]
    fn state_shares_are_roughly_complete() {
        let total: f64 = ReferenceData::embedded().state_sales.iter().map(|row| row.share).sum();
        assert!((total - 100.0).abs() < 0.5, "shares sum to {total}");
    }

    #[test]
    fn every_profile_joins_performance_and_balances() {
        let data = ReferenceData::embedded();
        assert_eq!(data.am_profiles.len(), data.am_performance.len());
        for profile in &data.am_profiles {
            let am = data
                .am_performance
                .iter()
                .find(|am| am.name == profile.name)
                .expect("profile without performance row");
            assert_eq!(am.state, profile.state);
            let mix: u64 = profile.products.iter().map(|p| p.revenue).sum();
            assert_eq!(mix, profile.revenue, "{} product mix", profile.name);
        }
    }

    #[test]
    fn product_champions_lead_their_product() {
        let data = ReferenceData::embedded();
        for champion in &data.product_champions {
            let best = data
                .am_profiles
                .iter()
                .filter_map(|profile| {
                    profile
                        .products
                        .iter()
                        .find(|p| p.product == champion.product)
                        .map(|p| (profile.name.as_str(), p.revenue))
                })
                .max_by_key(|(_, revenue)| *revenue)
                .expect("no profile sells product");
            assert_eq!(best, (champion.am.as_str(), champion.revenue));
        }
    }

    #[test]
    fn partner_table_has_three_dormant() {
        let data = ReferenceData::embedded();
        assert_eq!(data.partners.len(), 25);
        assert_eq!(data.partners.iter().filter(|p| p.is_dormant()).count(), 3);
    }

    #[test]
    fn profile_lookup_by_name() {
        let data = ReferenceData::embedded();
        assert_eq!(data.am_profile("Mia Zhang").map(|p| p.revenue), Some(401_000));
        assert!(data.am_profile("Nobody").is_none());
    }
}
