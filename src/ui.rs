use crate::format::{format_currency, format_number, format_percent};
use crate::models::{ChurnWindow, DashboardViewModel, FilterOptions, Variant};
use crate::views::{AmTab, PartnerTab, churn_window_summary};
use std::fmt::Write;

/// View-local selections for the overview page. These never touch the
/// shared filter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverviewTabs {
    pub am_tab: AmTab,
    pub window: ChurnWindow,
    pub partner_tab: PartnerTab,
}

impl OverviewTabs {
    /// Query string selecting these tabs, already escaped for an attribute.
    fn href(self) -> String {
        format!(
            "/?am_tab={}&amp;window={}&amp;partner_tab={}",
            self.am_tab.label(),
            self.window.label(),
            self.partner_tab.label()
        )
    }
}

pub fn render_index(view: &DashboardViewModel, options: &FilterOptions, tabs: OverviewTabs) -> String {
    let section = |name: &str| -> Option<String> {
        let html = match name {
            "FILTERS" => render_filter_form(view, options),
            "KPIS" => render_kpis(view),
            "TREND" => render_trend(view),
            "STATES" => render_states(view),
            "PRODUCTS" => render_products(view),
            "AM_PANEL" => render_am_panel(view, tabs),
            "CHURN_PANEL" => render_churn_panel(view, tabs),
            "PARTNER_PANEL" => render_partner_panel(view, tabs),
            "PLANS" => render_plans(view),
            _ => return None,
        };
        Some(html)
    };

    // Single pass over the template so rendered sections are never rescanned.
    let mut html = String::with_capacity(INDEX_HTML.len() * 4);
    let mut rest = INDEX_HTML;
    while let Some(start) = rest.find("{{") {
        html.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };
        match section(&after[..end]) {
            Some(rendered) => html.push_str(&rendered),
            None => html.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }
    html.push_str(rest);
    html
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn trend_class(value: f64) -> &'static str {
    if value < 0.0 { "trend-down" } else { "trend-up" }
}

fn select(name: &str, label: &str, values: &[String], selected: &str) -> String {
    let mut html = format!(r#"<label>{label}<select name="{name}">"#);
    let mut found = false;
    for value in values {
        let is_selected = value == selected;
        found |= is_selected;
        let _ = write!(
            html,
            r#"<option value="{v}"{s}>{v}</option>"#,
            v = escape(value),
            s = if is_selected { " selected" } else { "" }
        );
    }
    if !found {
        // Keep an unrecognised value visible so the empty panels make sense.
        let _ = write!(html, r#"<option value="{v}" selected>{v}</option>"#, v = escape(selected));
    }
    html.push_str("</select></label>");
    html
}

fn render_filter_form(view: &DashboardViewModel, options: &FilterOptions) -> String {
    let periods: Vec<String> = options.periods.iter().map(|p| p.label().to_string()).collect();
    let filters = &view.filters;
    [
        select("period", "Period", &periods, filters.period.label()),
        select("state", "State", &options.states, filters.state.as_str()),
        select("product", "Product", &options.products, filters.product.as_str()),
        select(
            "account_manager",
            "Account manager",
            &options.account_managers,
            filters.account_manager.as_str(),
        ),
    ]
    .concat()
}

fn kpi(label: &str, value: &str, meta: &str, class: &str) -> String {
    format!(
        r#"<article class="stat"><span class="label">{label}</span><span class="value">{value}</span><span class="meta {class}">{meta}</span></article>"#
    )
}

fn render_kpis(view: &DashboardViewModel) -> String {
    let kpis = &view.kpis;
    [
        kpi(
            &format!("Total revenue {}", view.filters.period),
            &format_currency(kpis.ytd_revenue as i64),
            "trailing twelve months",
            "trend-up",
        ),
        kpi(
            "Revenue MTD",
            &format_currency(kpis.mtd_revenue as i64),
            &format!("{} vs LM", format_percent(kpis.growth_vs_lm)),
            trend_class(kpis.growth_vs_lm),
        ),
        kpi(
            "Growth YoY",
            &format_percent(kpis.growth_yoy),
            "year over year",
            trend_class(kpis.growth_yoy),
        ),
        kpi(
            "Active accounts",
            &format_number(kpis.active_accounts),
            &format!("{} new partners", kpis.new_partners),
            "trend-up",
        ),
        kpi(
            "Churn rate",
            &format!("{:.1}%", kpis.churn_rate),
            &format!("avg margin {:.1}%", kpis.avg_margin),
            "trend-down",
        ),
    ]
    .concat()
}

fn bar(width: f64) -> String {
    format!(
        r#"<div class="bar"><div class="fill" style="width: {:.1}%"></div></div>"#,
        width.clamp(0.0, 100.0)
    )
}

fn render_trend(view: &DashboardViewModel) -> String {
    let peak = view
        .revenue_trend
        .iter()
        .map(|point| point.actual.max(point.forecast))
        .max()
        .unwrap_or(0);
    let mut rows = String::new();
    for point in &view.revenue_trend {
        let width = if peak == 0 { 0.0 } else { point.actual as f64 / peak as f64 * 100.0 };
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num muted\">{}</td></tr>",
            point.month.format("%b %y"),
            bar(width),
            format_currency(point.actual as i64),
            format_currency(point.forecast as i64),
        );
    }
    table(&["Month", "", "Actual", "Forecast"], &rows)
}

fn table(headers: &[&str], rows: &str) -> String {
    if rows.is_empty() {
        return r#"<p class="empty">No data for the current filters.</p>"#.to_string();
    }
    let head: String = headers.iter().map(|h| format!("<th>{h}</th>")).collect();
    format!("<table><thead><tr>{head}</tr></thead><tbody>{rows}</tbody></table>")
}

fn render_states(view: &DashboardViewModel) -> String {
    let mut rows = String::new();
    for row in &view.state_sales {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td class=\"num\">{:.1}%</td><td class=\"num\">{}</td></tr>",
            escape(&row.state),
            bar(row.share),
            row.share,
            format_currency(row.revenue as i64),
        );
    }
    table(&["State", "Share", "", "Revenue"], &rows)
}

fn render_products(view: &DashboardViewModel) -> String {
    let mut rows = String::new();
    for row in &view.product_sales {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num {}\">{}</td><td class=\"num {}\">{}</td></tr>",
            escape(&row.product),
            format_currency(row.revenue as i64),
            format_number(row.users),
            trend_class(row.growth_lm),
            format_percent(row.growth_lm),
            trend_class(row.growth_yoy),
            format_percent(row.growth_yoy),
        );
    }
    table(&["Product", "Revenue", "Users", "vs LM", "YoY"], &rows)
}

fn tab_links<T: Variant>(
    active: T,
    select: impl Fn(T) -> OverviewTabs,
    caption: impl Fn(T) -> &'static str,
) -> String {
    let links: String = T::VARIANTS
        .iter()
        .map(|variant| {
            format!(
                r#"<a class="tab{}" href="{}">{}</a>"#,
                if *variant == active { " active" } else { "" },
                select(*variant).href(),
                caption(*variant),
            )
        })
        .collect();
    format!(r#"<nav class="tabs">{links}</nav>"#)
}

fn rank_class(index: usize) -> &'static str {
    match index {
        0 => "gold",
        1 => "silver",
        2 => "bronze",
        _ => "",
    }
}

fn render_am_panel(view: &DashboardViewModel, tabs: OverviewTabs) -> String {
    let nav = tab_links(
        tabs.am_tab,
        |am_tab| OverviewTabs { am_tab, ..tabs },
        |tab| match tab {
            AmTab::Top10 => "Top 10",
            AmTab::Growth => "Growth",
            AmTab::StateChampions => "State champions",
            AmTab::ProductChampions => "Product champions",
        },
    );

    let mut rows = String::new();
    let body = match tabs.am_tab {
        AmTab::Top10 | AmTab::Growth => {
            let ams = if tabs.am_tab == AmTab::Top10 { &view.top_ams } else { &view.growth_ams };
            for (index, am) in ams.iter().enumerate() {
                let _ = write!(
                    rows,
                    "<tr><td><span class=\"rank {}\">{}</span></td><td><a href=\"/api/am-profiles/{}\">{}</a></td><td>{}</td><td class=\"num\">{}</td><td class=\"num {}\">{}</td><td class=\"num\">{:.1}%</td></tr>",
                    rank_class(index),
                    index + 1,
                    escape(&am.name),
                    escape(&am.name),
                    escape(&am.state),
                    format_currency(am.revenue as i64),
                    trend_class(am.growth_yoy),
                    format_percent(am.growth_yoy),
                    am.margin,
                );
            }
            table(&["#", "Account manager", "State", "Revenue", "YoY", "Margin"], &rows)
        }
        AmTab::StateChampions => {
            for champion in &view.state_champions {
                let _ = write!(
                    rows,
                    "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td></tr>",
                    escape(&champion.state),
                    escape(&champion.am),
                    format_currency(champion.revenue as i64),
                );
            }
            table(&["State", "Champion", "Revenue"], &rows)
        }
        AmTab::ProductChampions => {
            for champion in &view.product_champions {
                let _ = write!(
                    rows,
                    "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{:.1}%</td></tr>",
                    escape(&champion.product),
                    escape(&champion.am),
                    format_currency(champion.revenue as i64),
                    champion.margin,
                );
            }
            table(&["Product", "Champion", "Revenue", "Margin"], &rows)
        }
    };

    format!("{nav}{body}")
}

fn render_churn_panel(view: &DashboardViewModel, tabs: OverviewTabs) -> String {
    let nav = tab_links(
        tabs.window,
        |window| OverviewTabs { window, ..tabs },
        |window| window.label(),
    );
    let summary = churn_window_summary(view, tabs.window);

    let mut rows = String::new();
    for account in &summary.accounts {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num trend-down\">{:.1}%</td></tr>",
            escape(&account.account),
            escape(&account.partner),
            escape(&account.state),
            escape(&account.product),
            format_currency(account.churn_value as i64),
            account.churn_pct,
        );
    }

    format!(
        r#"{nav}<p class="subtitle">Revenue at risk ({window}): <strong>{total}</strong> across {count} accounts, {high} above 50% decline.</p>{table}"#,
        window = tabs.window,
        total = format_currency(summary.total_value as i64),
        count = summary.accounts.len(),
        high = summary.high_risk,
        table = table(&["Account", "Partner", "State", "Product", "Value", "Decline"], &rows),
    )
}

fn render_partner_panel(view: &DashboardViewModel, tabs: OverviewTabs) -> String {
    let nav = tab_links(
        tabs.partner_tab,
        |partner_tab| OverviewTabs { partner_tab, ..tabs },
        |tab| match tab {
            PartnerTab::Top20 => "Top 20",
            PartnerTab::Dormant => "Dormant",
        },
    );
    let partners = match tabs.partner_tab {
        PartnerTab::Top20 => &view.top_partners,
        PartnerTab::Dormant => &view.dormant_partners,
    };

    let mut rows = String::new();
    for (index, partner) in partners.iter().enumerate() {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num {}\">{}</td></tr>",
            index + 1,
            escape(&partner.partner),
            format_currency(partner.revenue as i64),
            trend_class(partner.growth_yoy),
            format_percent(partner.growth_yoy),
        );
    }
    format!("{nav}{}", table(&["#", "Partner", "Revenue", "YoY"], &rows))
}

fn render_plans(view: &DashboardViewModel) -> String {
    let mut rows = String::new();
    for plan in &view.top_plans {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{:.1}%</td></tr>",
            escape(&plan.plan),
            escape(&plan.product),
            format_number(plan.users),
            plan.contribution,
        );
    }
    table(&["Plan", "Product", "Users", "Contribution"], &rows)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Sales Dashboard</title>
  <style>
    :root {
      --bg: #f4f6fb;
      --ink: #1f2933;
      --muted: #7b8794;
      --primary: #0469f8;
      --up: #2d7a4b;
      --down: #c63b2b;
      --card: #ffffff;
      --shadow: 0 12px 32px rgba(31, 41, 51, 0.08);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
      font-size: 14px;
    }

    main {
      width: min(1280px, 100%);
      margin: 0 auto;
      padding: 24px;
      display: grid;
      gap: 20px;
    }

    h1 {
      margin: 0;
      font-size: 1.6rem;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.05rem;
    }

    form.filters {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: end;
    }

    form.filters label {
      display: grid;
      gap: 4px;
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: var(--muted);
    }

    select, button {
      font: inherit;
      padding: 6px 10px;
      border-radius: 8px;
      border: 1px solid #d9e2ec;
      background: white;
    }

    button {
      background: var(--primary);
      color: white;
      border: none;
      cursor: pointer;
    }

    .kpis {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    .stat, .panel {
      background: var(--card);
      border-radius: 14px;
      box-shadow: var(--shadow);
      padding: 16px;
    }

    .stat {
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.6rem;
      font-weight: 600;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(420px, 1fr));
      gap: 16px;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      padding: 6px 8px;
      border-bottom: 1px solid #eef2f7;
      text-align: left;
    }

    th {
      font-size: 0.75rem;
      color: var(--muted);
      text-transform: uppercase;
    }

    .num {
      text-align: right;
    }

    .muted, .subtitle {
      color: var(--muted);
    }

    .trend-up {
      color: var(--up);
    }

    .trend-down {
      color: var(--down);
    }

    .bar {
      height: 8px;
      min-width: 80px;
      background: #eef2f7;
      border-radius: 999px;
      overflow: hidden;
    }

    .bar .fill {
      height: 100%;
      background: var(--primary);
    }

    .tabs {
      display: flex;
      gap: 6px;
      margin-bottom: 10px;
    }

    .tab {
      padding: 4px 12px;
      border-radius: 999px;
      color: var(--muted);
      text-decoration: none;
      background: #eef2f7;
    }

    .tab.active {
      background: var(--primary);
      color: white;
    }

    .rank {
      display: inline-block;
      width: 22px;
      text-align: center;
      border-radius: 999px;
    }

    .rank.gold { background: #fde68a; }
    .rank.silver { background: #e5e7eb; }
    .rank.bronze { background: #fcd9b6; }

    .empty {
      color: var(--muted);
      font-style: italic;
    }
  </style>
</head>
<body>
  <main>
    <header>
      <h1>Sales Dashboard</h1>
      <p class="subtitle">Sales, churn and account-manager performance.</p>
    </header>

    <form class="filters" method="post" action="/filters">
      {{FILTERS}}
      <button type="submit">Apply</button>
    </form>

    <section class="kpis">{{KPIS}}</section>

    <section class="grid">
      <div class="panel"><h2>Growth &amp; forecast</h2>{{TREND}}</div>
      <div class="panel">
        <h2>Sales by state</h2>{{STATES}}
        <h2>Sales by product</h2>{{PRODUCTS}}
      </div>
    </section>

    <section class="grid">
      <div class="panel"><h2>Account managers</h2>{{AM_PANEL}}</div>
      <div class="panel"><h2>Churn watch</h2>{{CHURN_PANEL}}</div>
    </section>

    <section class="grid">
      <div class="panel"><h2>Partners</h2>{{PARTNER_PANEL}}</div>
      <div class="panel"><h2>Top plans</h2>{{PLANS}}</div>
    </section>
  </main>
</body>
</html>
"#;
