
use crate::delivery::{CarrierField, Delivery, DeliveryEvent, Location, Place, StatusValue};
use crate::models::Carrier;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;

pub const NOT_AVAILABLE: &str = "Not available";
pub const UNKNOWN: &str = "Unknown";

const UNKNOWN_CLASS: &str = "status-unknown";

const STATUS_TABLE: [(&str, &str); 9] = [
    ("Completed", "status-completed"),
    ("Frozen", "status-frozen"),
    ("In transit", "status-in-transit"),
    ("Ready for pickup", "status-pickup"),
    ("Out for delivery", "status-out-for-delivery"),
    ("Not found", "status-not-found"),
    ("Delivery attempt failed", "status-failed-attempt"),
    ("Exception", "status-exception"),
    ("Info received", "status-info-received"),
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMeta {
    pub label: String,
    pub class_name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct CarrierDirectory {
    names: HashMap<String, String>,
}

impl CarrierDirectory {
    pub fn new(carriers: &[Carrier]) -> Self {
        let names = carriers
            .iter()
            .map(|carrier| (normalize_code(&carrier.code), carrier.name.clone()))
            .collect();
        Self { names }
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }
}

pub fn normalize_code(value: &str) -> String {
    value.trim().to_lowercase()
}

/// `in_transit` / `in-transit` / `in   transit` all read as `in transit`.
pub fn normalize_status_text(value: &str) -> String {
    value
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn resolve_carrier_code(delivery: &Delivery) -> String {
    let (object_code, literal) = match &delivery.carrier {
        Some(CarrierField::Named(carrier)) => (carrier.code.as_deref(), None),
        Some(CarrierField::Code(code)) => (None, Some(code.as_str())),
        None => (None, None),
    };

    first_non_empty([
        object_code,
        literal,
        delivery.carrier_code.as_deref(),
        delivery.carrier_slug.as_deref(),
        delivery.carrier_id.as_deref(),
        delivery.provider.as_deref(),
        delivery.shipper.as_deref(),
    ])
    .map(normalize_code)
    .unwrap_or_default()
}

pub fn resolve_carrier_name(delivery: &Delivery, directory: &CarrierDirectory) -> String {
    if let Some(CarrierField::Named(carrier)) = &delivery.carrier {
        if let Some(name) = first_non_empty([carrier.name.as_deref()]) {
            return name.to_string();
        }
    }

    let code = resolve_carrier_code(delivery);
    if code.is_empty() {
        return UNKNOWN.to_string();
    }

    match directory.name(&code) {
        Some(name) => name.to_string(),
        None => code.to_uppercase(),
    }
}

pub fn resolve_delivery_title(delivery: &Delivery) -> String {
    let title = first_non_empty([
        delivery.title.as_deref(),
        delivery.name.as_deref(),
        delivery.description.as_deref(),
        delivery.display_name.as_deref(),
        delivery.item_name.as_deref(),
        delivery.merchant.as_deref(),
    ]);
    if let Some(title) = title {
        return title.to_string();
    }

    match first_non_empty([delivery.tracking_number.as_deref()]) {
        Some(tracking_number) => format!("Package {tracking_number}"),
        None => "Package".to_string(),
    }
}

/// A recognised numeric code always wins over free text.
pub fn status_meta(status: Option<&str>, status_code: Option<&StatusValue>) -> StatusMeta {
    let known = status_code
        .and_then(numeric_status)
        .and_then(|code| Some((code, STATUS_TABLE.get(usize::try_from(code).ok()?)?)));
    if let Some((code, (label, class_name))) = known {
        return StatusMeta {
            label: label.to_string(),
            class_name: class_name.to_string(),
            value: code.to_string(),
        };
    }

    if let Some(status) = status.filter(|status| !status.trim().is_empty()) {
        return unknown_status(normalize_status_text(status));
    }

    let code_text = status_code.map(|code| match code {
        StatusValue::Code(code) => code.to_string(),
        StatusValue::Text(text) => text.clone(),
    });
    if let Some(code_text) = code_text.filter(|text| !text.trim().is_empty()) {
        return unknown_status(normalize_status_text(&code_text));
    }

    StatusMeta {
        label: UNKNOWN.to_string(),
        class_name: UNKNOWN_CLASS.to_string(),
        value: "unknown".to_string(),
    }
}

pub fn delivery_status(delivery: &Delivery) -> StatusMeta {
    status_meta(delivery.status.as_deref(), delivery.status_code.as_ref())
}

fn numeric_status(code: &StatusValue) -> Option<i64> {
    match code {
        StatusValue::Code(code) => Some(*code),
        StatusValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
                return None;
            }
            text.parse().ok()
        }
    }
}

fn unknown_status(label: String) -> StatusMeta {
    StatusMeta {
        value: label.to_lowercase(),
        label,
        class_name: UNKNOWN_CLASS.to_string(),
    }
}

pub fn event_location(event: &DeliveryEvent) -> Option<String> {
    match &event.location {
        Some(Location::Text(text)) if !text.trim().is_empty() => return Some(text.trim().to_string()),
        Some(Location::Place(place)) => {
            if let Some(label) = place_label(place) {
                return Some(label);
            }
        }
        _ => {}
    }

    join_parts([
        event.city.as_deref(),
        event.state.as_deref(),
        event.country.as_deref(),
    ])
}

/// Latest known location: newest event with a resolvable location, then the
/// delivery's own location text.
pub fn current_location(delivery: &Delivery) -> Option<String> {
    delivery
        .events
        .iter()
        .rev()
        .find_map(event_location)
        .or_else(|| match &delivery.location {
            Some(Location::Text(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        })
}

pub fn expected_arrival(delivery: &Delivery) -> Option<&str> {
    delivery
        .date_expected
        .as_deref()
        .or_else(|| delivery.estimate.as_ref()?.arrival.as_deref())
}

pub fn delivery_key(delivery: &Delivery, index: usize) -> String {
    match first_non_empty([delivery.tracking_number.as_deref()]) {
        Some(tracking_number) => tracking_number.to_string(),
        None => format!("#{index}"),
    }
}

pub fn map_embed_url(location: &str) -> String {
    format!(
        "https://www.google.com/maps?q={}&output=embed",
        urlencoding::encode(location)
    )
}

pub fn format_date(value: Option<&str>) -> String {
    format_date_in(value, &Local)
}

pub fn format_date_in<Tz>(value: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(raw) = value.filter(|value| !value.is_empty()) else {
        return NOT_AVAILABLE.to_string();
    };

    match parse_timestamp(raw.trim(), tz) {
        Some(timestamp) => timestamp.format("%b %-d, %Y, %-I:%M %p").to_string(),
        None => raw.to_string(),
    }
}

fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(tz));
    }
    if let Ok(timestamp) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(timestamp.with_timezone(tz));
    }

    // Without an offset the wall-clock time is taken as local.
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }

    // A bare date means midnight UTC.
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).with_timezone(tz))
}

fn place_label(place: &Place) -> Option<String> {
    first_non_empty([place.name.as_deref(), place.display_name.as_deref()])
        .map(str::to_string)
        .or_else(|| {
            join_parts([
                place.city.as_deref(),
                place.state.as_deref(),
                place.country.as_deref(),
            ])
        })
}

fn join_parts(parts: [Option<&str>; 3]) -> Option<String> {
    let parts: Vec<&str> = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() { None } else { Some(parts.join(", ")) }
}

fn first_non_empty<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
}
