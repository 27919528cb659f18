use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::ShipmentApi;
use crate::error::SubmitError;
use crate::models::Shipment;
use crate::notify::{Notifier, Severity};
use crate::sync::ListSynchronizer;
use crate::view::FormView;

pub const SUBMITTING_LABEL: &str = "Creating...";
pub const VALIDATION_MESSAGE: &str = "Please fill in all required fields";
pub const CREATE_FAILED_MESSAGE: &str = "Error creating shipment. Please try again.";

/// A created shipment plus the list refresh it started.
pub struct Submitted {
    pub shipment: Shipment,
    pub refresh: JoinHandle<()>,
}

/// Holds the submit control disabled and restores its label and enabled
/// state on drop, whatever the outcome.
struct SubmitGuard {
    form: Arc<dyn FormView>,
    original_label: String,
}

impl SubmitGuard {
    /// Claims the control, or `None` if another submission holds it.
    fn engage(form: Arc<dyn FormView>) -> Option<Self> {
        let original_label = form.try_begin_submit(SUBMITTING_LABEL)?;
        Some(Self {
            form,
            original_label,
        })
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.form.set_submit_label(&self.original_label);
        self.form.set_submit_enabled(true);
    }
}

pub struct FormController {
    api: Arc<dyn ShipmentApi>,
    form: Arc<dyn FormView>,
    notifier: Notifier,
    list: Arc<ListSynchronizer>,
}

impl FormController {
    pub fn new(
        api: Arc<dyn ShipmentApi>,
        form: Arc<dyn FormView>,
        notifier: Notifier,
        list: Arc<ListSynchronizer>,
    ) -> Self {
        Self {
            api,
            form,
            notifier,
            list,
        }
    }

    /// Validates the form and creates one shipment from it.
    ///
    /// On success the form is cleared, a success notification is shown and a
    /// list refresh is started but not awaited. Every failure ends in an
    /// error notification and no refresh. A call made while another
    /// submission holds the control returns `InFlight` and has no effect.
    pub async fn submit(&self) -> Result<Submitted, SubmitError> {
        let Some(guard) = SubmitGuard::engage(self.form.clone()) else {
            debug!("submit control already claimed");
            return Err(SubmitError::InFlight);
        };

        let request = match self.form.read_form().into_request() {
            Ok(request) => request,
            Err(e) => {
                drop(guard);
                warn!(error = %e, "submission rejected");
                self.notifier.notify(VALIDATION_MESSAGE, Severity::Error);
                return Err(e);
            }
        };

        if !request.weight.is_finite() {
            // forwarded as-is; the API receives null
            warn!(weight = %request.weight, "weight is not a number");
        }

        match self.api.create_shipment(&request).await {
            Ok(shipment) => {
                info!(
                    recipient = shipment.recipient.as_deref().unwrap_or_default(),
                    tracking = %shipment.tracking_display(),
                    "shipment created"
                );
                self.form.reset_form();
                self.notifier.notify_created(&shipment);
                drop(guard);

                let refresh = self.list.spawn_refresh();
                Ok(Submitted { shipment, refresh })
            }
            Err(e) => {
                error!(error = %e, "create shipment failed");
                self.notifier.notify(CREATE_FAILED_MESSAGE, Severity::Error);
                Err(e.into())
            }
        }
    }
}
