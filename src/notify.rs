use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::models::{FieldValue, Shipment};
use crate::render::{escape_html, format_weight};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    #[default]
    Info,
}

impl Severity {
    pub fn background(&self) -> &'static str {
        match self {
            Severity::Success => "#28a745",
            Severity::Error => "#dc3545",
            Severity::Info => "#351E0A",
        }
    }

    pub fn foreground(&self) -> &'static str {
        match self {
            Severity::Success | Severity::Error => "#fff",
            Severity::Info => "#FFB500",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        };
        f.write_str(name)
    }
}

/// What the notification surface shows.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationContent {
    Message(String),
    ShipmentCreated {
        recipient: Option<String>,
        service: Option<String>,
        weight: Option<FieldValue>,
    },
}

impl NotificationContent {
    pub fn to_markup(&self) -> String {
        match self {
            NotificationContent::Message(text) => escape_html(Some(text.as_str())),
            NotificationContent::ShipmentCreated {
                recipient,
                service,
                weight,
            } => format!(
                "✅ Shipment created successfully!<br>\n\
                 <strong>Recipient:</strong> {}<br>\n\
                 <strong>Service:</strong> {}<br>\n\
                 <strong>Weight:</strong> {} lbs",
                escape_html(recipient.as_deref()),
                escape_html(service.as_deref()),
                format_weight(weight.as_ref()),
            ),
        }
    }

    pub fn to_plain_text(&self) -> String {
        match self {
            NotificationContent::Message(text) => text.clone(),
            NotificationContent::ShipmentCreated {
                recipient,
                service,
                weight,
            } => format!(
                "Shipment created successfully! Recipient: {}, Service: {}, Weight: {} lbs",
                recipient.as_deref().unwrap_or_default(),
                service.as_deref().unwrap_or_default(),
                weight
                    .as_ref()
                    .map_or_else(|| "N/A".to_string(), |w| w.to_string()),
            ),
        }
    }
}

/// The single shared notification region.
pub trait NotificationSurface: Send + Sync {
    fn show(&self, content: &NotificationContent, severity: Severity);
    fn hide(&self);
}

/// Shows transient notifications and hides them after the dwell time.
///
/// Clones share the surface and the dismissal timer, so a later call on any
/// clone overwrites the current message and restarts its timer.
#[derive(Clone)]
pub struct Notifier {
    surface: Arc<dyn NotificationSurface>,
    dwell: Duration,
    generation: Arc<AtomicU64>,
}

impl Notifier {
    pub fn new(surface: Arc<dyn NotificationSurface>, dwell: Duration) -> Self {
        Self {
            surface,
            dwell,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn notify(&self, message: impl Into<String>, severity: Severity) {
        self.present(NotificationContent::Message(message.into()), severity);
    }

    pub fn notify_created(&self, shipment: &Shipment) {
        self.present(
            NotificationContent::ShipmentCreated {
                recipient: shipment.recipient.clone(),
                service: shipment.service.clone(),
                weight: shipment.weight.clone(),
            },
            Severity::Success,
        );
    }

    fn present(&self, content: NotificationContent, severity: Severity) {
        debug!(%severity, text = %content.to_plain_text(), "notification");
        self.surface.show(&content, severity);

        let shown = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, notification will not auto-dismiss");
            return;
        };

        let surface = self.surface.clone();
        let generation = self.generation.clone();
        let dwell = self.dwell;
        handle.spawn(async move {
            tokio::time::sleep(dwell).await;
            // a newer notification owns the surface now
            if generation.load(Ordering::SeqCst) == shown {
                surface.hide();
            }
        });
    }
}
