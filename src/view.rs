use std::sync::{Mutex, MutexGuard};

use crate::models::{Shipment, ShipmentDraft};
use crate::notify::{NotificationContent, NotificationSurface, Severity};
use crate::render::{escape_html, render_cards, render_error_card};

pub const SUBMIT_LABEL: &str = "Create Shipment";

/// Form fields and the submit control, written only by the form controller.
pub trait FormView: Send + Sync {
    fn read_form(&self) -> ShipmentDraft;
    fn reset_form(&self);
    fn submit_label(&self) -> String;
    fn set_submit_label(&self, label: &str);
    fn set_submit_enabled(&self, enabled: bool);
    fn is_submit_enabled(&self) -> bool;

    /// Disables the submit control and shows `busy_label` in one step.
    /// Returns the label it replaced, or `None` if the control was already
    /// disabled.
    fn try_begin_submit(&self, busy_label: &str) -> Option<String>;
}

/// The list container, written only by the list synchronizer.
pub trait ListView: Send + Sync {
    fn render_list(&self, shipments: &[Shipment]);
    fn show_error(&self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Recipient,
    Address,
    Weight,
    Service,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Recipient,
        FormField::Address,
        FormField::Weight,
        FormField::Service,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FormField::Recipient => "recipient",
            FormField::Address => "address",
            FormField::Weight => "weight",
            FormField::Service => "service",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct VisibleNotification {
    content: NotificationContent,
    severity: Severity,
}

#[derive(Debug)]
struct PageState {
    fields: ShipmentDraft,
    submit_label: String,
    submit_enabled: bool,
    list_html: String,
    notification: Option<VisibleNotification>,
}

/// In-memory HTML rendition of the page regions: form, list container and
/// notification surface.
#[derive(Debug)]
pub struct HtmlPage {
    state: Mutex<PageState>,
}

impl Default for HtmlPage {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlPage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PageState {
                fields: ShipmentDraft::default(),
                submit_label: SUBMIT_LABEL.to_string(),
                submit_enabled: true,
                list_html: String::new(),
                notification: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Types `value` into a form field.
    pub fn set_field(&self, field: FormField, value: impl Into<String>) {
        let value = Some(value.into());
        let mut state = self.state();
        match field {
            FormField::Recipient => state.fields.recipient = value,
            FormField::Address => state.fields.address = value,
            FormField::Weight => state.fields.weight = value,
            FormField::Service => state.fields.service = value,
        }
    }

    pub fn fill(&self, draft: ShipmentDraft) {
        self.state().fields = draft;
    }

    pub fn list_html(&self) -> String {
        self.state().list_html.clone()
    }

    pub fn notification(&self) -> Option<(NotificationContent, Severity)> {
        self.state()
            .notification
            .as_ref()
            .map(|n| (n.content.clone(), n.severity))
    }

    pub fn notification_text(&self) -> Option<String> {
        self.state()
            .notification
            .as_ref()
            .map(|n| n.content.to_plain_text())
    }

    /// The whole page as an HTML document.
    pub fn render_document(&self, merge_url: &str) -> String {
        let state = self.state();

        let inputs: String = FormField::ALL
            .iter()
            .map(|field| {
                let value = match field {
                    FormField::Recipient => state.fields.recipient.as_deref(),
                    FormField::Address => state.fields.address.as_deref(),
                    FormField::Weight => state.fields.weight.as_deref(),
                    FormField::Service => state.fields.service.as_deref(),
                };
                format!(
                    "      <div class=\"form-control\"><label for=\"{name}\">{name}</label>\
                     <input id=\"{name}\" name=\"{name}\" value=\"{value}\" required></div>\n",
                    name = field.name(),
                    value = escape_html(value),
                )
            })
            .collect();

        let notification = match &state.notification {
            Some(visible) => format!(
                "<div id=\"notification\" style=\"display: block; background-color: {}; color: {};\">{}</div>",
                visible.severity.background(),
                visible.severity.foreground(),
                visible.content.to_markup(),
            ),
            None => "<div id=\"notification\" style=\"display: none;\"></div>".to_string(),
        };

        format!(
            r#"<!DOCTYPE html>
<html>
  <head><meta charset="utf-8"><title>Shipping Manager</title></head>
  <body>
    {notification}
    <form id="shipForm">
{inputs}      <button type="button" id="createShipmentBtn"{disabled}>{label}</button>
      <a id="mergeBtn" href="{merge_url}" target="_blank">Download last 5 labels</a>
    </form>
    <div id="list">
{list}    </div>
  </body>
</html>
"#,
            disabled = if state.submit_enabled { "" } else { " disabled" },
            label = escape_html(Some(state.submit_label.as_str())),
            list = state.list_html,
        )
    }
}

impl FormView for HtmlPage {
    fn read_form(&self) -> ShipmentDraft {
        self.state().fields.clone()
    }

    fn reset_form(&self) {
        self.state().fields = ShipmentDraft::default();
    }

    fn submit_label(&self) -> String {
        self.state().submit_label.clone()
    }

    fn set_submit_label(&self, label: &str) {
        self.state().submit_label = label.to_string();
    }

    fn set_submit_enabled(&self, enabled: bool) {
        self.state().submit_enabled = enabled;
    }

    fn is_submit_enabled(&self) -> bool {
        self.state().submit_enabled
    }

    fn try_begin_submit(&self, busy_label: &str) -> Option<String> {
        let mut state = self.state();
        if !state.submit_enabled {
            return None;
        }
        state.submit_enabled = false;
        Some(std::mem::replace(
            &mut state.submit_label,
            busy_label.to_string(),
        ))
    }
}

impl ListView for HtmlPage {
    fn render_list(&self, shipments: &[Shipment]) {
        self.state().list_html = render_cards(shipments);
    }

    fn show_error(&self, text: &str) {
        self.state().list_html = render_error_card(text);
    }
}

impl NotificationSurface for HtmlPage {
    fn show(&self, content: &NotificationContent, severity: Severity) {
        self.state().notification = Some(VisibleNotification {
            content: content.clone(),
            severity,
        });
    }

    fn hide(&self) {
        self.state().notification = None;
    }
}
