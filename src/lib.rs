pub mod app;
pub mod config;
pub mod data;
pub mod errors;
pub mod format;
pub mod handlers;
pub mod models;
pub mod selector;
pub mod state;
pub mod ui;
pub mod views;

pub use app::router;
pub use config::Config;
pub use data::ReferenceData;
pub use selector::compute_view_model;
pub use state::AppState;
