//! Markup for shipment cards, the inline error card and notifications.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::models::{FieldValue, Shipment};

/// Escapes text for insertion into markup. Absent or empty input is empty.
pub fn escape_html(unsafe_text: Option<&str>) -> String {
    let Some(text) = unsafe_text else {
        return String::new();
    };

    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Prints a number the way a JS template literal would.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// Weight as displayed on a card. Text weights are escaped; absent is `N/A`.
pub fn format_weight(weight: Option<&FieldValue>) -> String {
    match weight {
        Some(FieldValue::Text(text)) => escape_html(Some(text.as_str())),
        Some(value) => value.to_string(),
        None => "N/A".to_string(),
    }
}

/// Formats `created_at` in the local time zone, e.g. `1/1/2024, 12:00:00 AM`.
pub fn format_timestamp(created_at: Option<&FieldValue>) -> String {
    format_timestamp_in(created_at, &Local)
}

/// Accepts RFC 3339, epoch milliseconds, naive date-times (read in `tz`) and
/// bare dates (read as UTC midnight).
pub fn format_timestamp_in<Tz>(created_at: Option<&FieldValue>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let instant = match created_at {
        Some(FieldValue::Number(millis)) if millis.is_finite() => {
            Utc.timestamp_millis_opt(*millis as i64).single()
        }
        Some(FieldValue::Text(raw)) => parse_date_text(raw.trim(), tz),
        _ => None,
    };

    instant
        .map(|utc| {
            utc.with_timezone(tz)
                .format("%-m/%-d/%Y, %-I:%M:%S %p")
                .to_string()
        })
        .unwrap_or_else(|| "Invalid Date".to_string())
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_date_text<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc));
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

pub fn render_card(shipment: &Shipment) -> String {
    let label = match &shipment.label_path {
        Some(path) if path.is_truthy() => format!(
            r#"<a href="{}" target="_blank" class="download-link">Download label</a>"#,
            path
        ),
        _ => r#"<span class="label-pending">Label not ready</span>"#.to_string(),
    };

    format!(
        r#"<div class="card">
  <strong>{recipient}</strong> — {service} — {weight} lb
  <div>{address}</div>
  <div>
    {label}
    Tracking: {tracking}
  </div>
  <small>{created}</small>
</div>
"#,
        recipient = escape_html(shipment.recipient.as_deref()),
        service = escape_html(shipment.service.as_deref()),
        weight = format_weight(shipment.weight.as_ref()),
        address = escape_html(shipment.address.as_deref()),
        tracking = shipment.tracking_display(),
        created = format_timestamp(shipment.created_at.as_ref()),
    )
}

/// One card per shipment, in the given order.
pub fn render_cards(shipments: &[Shipment]) -> String {
    shipments.iter().map(render_card).collect()
}

pub fn render_error_card(reason: &str) -> String {
    format!(
        "<div class=\"card\">Error loading shipments: {}</div>\n",
        escape_html(Some(reason))
    )
}
