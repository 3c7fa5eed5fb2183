//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{pagination::PaginationConfig, sales::SalesService, store::SalesStore};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Runs sales queries against the store chosen at start up.
    pub sales: SalesService,
}

impl AppState {
    /// Create a new [AppState] that serves sales from `store`.
    ///
    /// The store is chosen once per deployment, see [crate::InMemorySalesStore]
    /// and [crate::SQLiteSalesStore].
    pub fn new(store: Arc<dyn SalesStore>, pagination_config: PaginationConfig) -> Self {
        Self {
            sales: SalesService::new(store, pagination_config),
        }
    }
}

impl FromRef<AppState> for SalesService {
    fn from_ref(state: &AppState) -> Self {
        state.sales.clone()
    }
}
