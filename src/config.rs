use crate::models::{FilterState, Period};
use std::{env, net::SocketAddr};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub initial_filters: FilterState,
}

impl Config {
    pub fn from_env() -> Self {
        let port = resolve_port(env::var("PORT").ok().as_deref());
        let period = resolve_period(env::var("DASHBOARD_PERIOD").ok().as_deref());

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            initial_filters: FilterState {
                period,
                ..FilterState::default()
            },
        }
    }
}

fn resolve_port(value: Option<&str>) -> u16 {
    value
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn resolve_period(value: Option<&str>) -> Period {
    match value.map(str::parse::<Period>) {
        Some(Ok(period)) => period,
        Some(Err(err)) => {
            warn!("ignoring DASHBOARD_PERIOD: {err}");
            Period::default()
        }
        None => Period::default(),
    }
}
