use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::{HttpShipmentApi, ShipmentApi};
use crate::config::Config;
use crate::error::{ApiError, SubmitError};
use crate::form::{FormController, Submitted};
use crate::notify::Notifier;
use crate::sync::ListSynchronizer;
use crate::view::HtmlPage;

/// Opens a URL in a new browsing context.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

pub struct SystemBrowser;

impl LinkOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        open::that_detached(url).with_context(|| format!("Failed to open {}", url))
    }
}

/// The assembled page: one HTML surface shared by the form controller, the
/// list synchronizer and the notifier.
pub struct Page {
    html: Arc<HtmlPage>,
    list: Arc<ListSynchronizer>,
    form: FormController,
    merge_url: String,
    opener: Arc<dyn LinkOpener>,
}

impl Page {
    pub fn new(config: &Config, api: Arc<dyn ShipmentApi>, opener: Arc<dyn LinkOpener>) -> Self {
        Self::with_html(config, Arc::new(HtmlPage::new()), api, opener)
    }

    /// Builds the page over an existing surface.
    pub fn with_html(
        config: &Config,
        html: Arc<HtmlPage>,
        api: Arc<dyn ShipmentApi>,
        opener: Arc<dyn LinkOpener>,
    ) -> Self {
        let notifier = Notifier::new(html.clone(), config.notification_dwell);
        let list = Arc::new(ListSynchronizer::new(api.clone(), html.clone()));
        let form = FormController::new(api, html.clone(), notifier, list.clone());

        Self {
            html,
            list,
            form,
            merge_url: config.merge_url(),
            opener,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api = HttpShipmentApi::new(config)?;
        Ok(Self::new(config, Arc::new(api), Arc::new(SystemBrowser)))
    }

    pub fn html(&self) -> &HtmlPage {
        &self.html
    }

    /// Initial list fetch.
    pub async fn load(&self) -> Result<usize, ApiError> {
        info!("loading shipments");
        self.list.refresh().await
    }

    pub async fn refresh(&self) -> Result<usize, ApiError> {
        self.list.refresh().await
    }

    /// A click on the submit control. Returns `None` when the control is
    /// disabled and the click never reached the form controller.
    pub async fn click_submit(&self) -> Option<Result<Submitted, SubmitError>> {
        match self.form.submit().await {
            Err(SubmitError::InFlight) => {
                debug!("submit control disabled, click ignored");
                None
            }
            outcome => Some(outcome),
        }
    }

    /// Opens the merged-labels download and returns its URL.
    pub fn click_merge(&self) -> &str {
        info!(url = %self.merge_url, "opening merged labels");
        if let Err(e) = self.opener.open(&self.merge_url) {
            warn!(error = %e, "could not open merged labels");
        }
        &self.merge_url
    }

    pub fn render(&self) -> String {
        self.html.render_document(&self.merge_url)
    }
}
