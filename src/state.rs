use crate::data::ReferenceData;
use crate::models::{FilterState, FilterUpdate, ParseVariantError};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data: &'static ReferenceData,
    pub filters: Arc<Mutex<FilterState>>,
}

impl AppState {
    pub fn new(data: &'static ReferenceData, filters: FilterState) -> Self {
        Self {
            data,
            filters: Arc::new(Mutex::new(filters)),
        }
    }

    pub async fn snapshot(&self) -> FilterState {
        self.filters.lock().await.clone()
    }

    /// Builds the next snapshot from the current one and swaps it in whole.
    /// Returns the previous and the new snapshot.
    pub async fn apply(&self, update: &FilterUpdate) -> Result<(FilterState, FilterState), ParseVariantError> {
        let mut current = self.filters.lock().await;
        let next = update.apply(&current)?;
        let previous = std::mem::replace(&mut *current, next.clone());
        Ok((previous, next))
    }
}
