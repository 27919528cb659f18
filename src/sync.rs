use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::ShipmentApi;
use crate::error::ApiError;
use crate::view::ListView;

/// Keeps the list container in step with the server's shipment collection.
pub struct ListSynchronizer {
    api: Arc<dyn ShipmentApi>,
    list: Arc<dyn ListView>,
}

impl ListSynchronizer {
    pub fn new(api: Arc<dyn ShipmentApi>, list: Arc<dyn ListView>) -> Self {
        Self { api, list }
    }

    /// Fetches the full collection and replaces the list with it. Any failure
    /// replaces the list with an inline error card instead.
    pub async fn refresh(&self) -> Result<usize, ApiError> {
        match self.api.list_shipments().await {
            Ok(shipments) => {
                info!(count = shipments.len(), "shipments loaded");
                self.list.render_list(&shipments);
                Ok(shipments.len())
            }
            Err(e) => {
                error!(error = %e, "fetch error");
                self.list.show_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Starts a refresh without waiting for it.
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let synchronizer = self.clone();
        tokio::spawn(async move {
            // failures are already rendered in place
            let _ = synchronizer.refresh().await;
        })
    }
}
