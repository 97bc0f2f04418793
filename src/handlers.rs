use crate::errors::AppError;
use crate::models::{DashboardViewModel, FilterState, FilterUpdate, FiltersResponse, parse_or_default};
use crate::selector::{compute_view_model, filter_options};
use crate::state::AppState;
use crate::ui::{OverviewTabs, render_index};
use crate::views::{AmPerformanceDetail, AmProfileDetail, ChurnDetail, am_performance_detail, churn_detail};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    pub am_tab: Option<String>,
    pub window: Option<String>,
    pub partner_tab: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChurnQuery {
    pub window: Option<String>,
    pub breakdown: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AmPerformanceQuery {
    pub growth_period: Option<String>,
    pub sort: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<OverviewQuery>,
) -> Result<Html<String>, AppError> {
    let tabs = OverviewTabs {
        am_tab: parse_or_default(query.am_tab.as_deref())?,
        window: parse_or_default(query.window.as_deref())?,
        partner_tab: parse_or_default(query.partner_tab.as_deref())?,
    };
    let filters = state.snapshot().await;
    let view = compute_view_model(state.data, &filters);
    let options = filter_options(state.data);

    Ok(Html(render_index(&view, &options, tabs)))
}

pub async fn submit_filters(
    State(state): State<AppState>,
    Form(update): Form<FilterUpdate>,
) -> Result<Redirect, AppError> {
    apply_update(&state, &update).await?;
    Ok(Redirect::to("/"))
}

pub async fn get_filters(State(state): State<AppState>) -> Json<FiltersResponse> {
    Json(FiltersResponse {
        filters: state.snapshot().await,
        options: filter_options(state.data),
    })
}

pub async fn post_filters(
    State(state): State<AppState>,
    Json(update): Json<FilterUpdate>,
) -> Result<Json<DashboardViewModel>, AppError> {
    let filters = apply_update(&state, &update).await?;
    Ok(Json(compute_view_model(state.data, &filters)))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(update): Query<FilterUpdate>,
) -> Result<Json<DashboardViewModel>, AppError> {
    let filters = overlay(&state, &update).await?;
    Ok(Json(compute_view_model(state.data, &filters)))
}

pub async fn get_churn(
    State(state): State<AppState>,
    Query(update): Query<FilterUpdate>,
    Query(query): Query<ChurnQuery>,
) -> Result<Json<ChurnDetail>, AppError> {
    let window = parse_or_default(query.window.as_deref())?;
    let breakdown = parse_or_default(query.breakdown.as_deref())?;
    let filters = overlay(&state, &update).await?;
    let view = compute_view_model(state.data, &filters);

    Ok(Json(churn_detail(&view, window, breakdown)))
}

pub async fn get_am_performance(
    State(state): State<AppState>,
    Query(update): Query<FilterUpdate>,
    Query(query): Query<AmPerformanceQuery>,
) -> Result<Json<AmPerformanceDetail>, AppError> {
    let growth_period = parse_or_default(query.growth_period.as_deref())?;
    let sort = parse_or_default(query.sort.as_deref())?;
    let filters = overlay(&state, &update).await?;
    let view = compute_view_model(state.data, &filters);

    Ok(Json(am_performance_detail(&view, growth_period, sort)))
}

pub async fn get_am_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AmProfileDetail>, AppError> {
    state
        .data
        .am_profile(&name)
        .map(|profile| Json(profile.detail()))
        .ok_or_else(|| AppError::not_found(format!("no account manager named '{name}'")))
}

/// Stores the updated snapshot.
async fn apply_update(state: &AppState, update: &FilterUpdate) -> Result<FilterState, AppError> {
    let (previous, next) = state.apply(update).await?;
    if previous != next {
        info!(from = ?previous, to = ?next, "filters replaced");
    }
    Ok(next)
}

/// The current snapshot with `update` laid over it, without storing it.
async fn overlay(state: &AppState, update: &FilterUpdate) -> Result<FilterState, AppError> {
    let current = state.snapshot().await;
    if update.is_empty() {
        return Ok(current);
    }
    Ok(update.apply(&current)?)
}
