//! Typed view of the loosely shaped delivery records returned by the Parcel API.
//!
//! Carriers disagree on field names and types, so every field is optional and
//! read leniently: a value of an unexpected JSON type is treated as absent.

use crate::models::lenient;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Delivery {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub item_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub merchant: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "status_value")]
    pub status_code: Option<StatusValue>,
    #[serde(default, deserialize_with = "carrier_field")]
    pub carrier: Option<CarrierField>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub carrier_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub carrier_slug: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub carrier_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub provider: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub shipper: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub estimate: Option<Estimate>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date_expected: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub events: Vec<DeliveryEvent>,
    #[serde(default, deserialize_with = "location")]
    pub location: Option<Location>,
}

/// One tracking update. Events arrive oldest first.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeliveryEvent {
    #[serde(default, deserialize_with = "lenient::text")]
    pub event: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "location")]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Estimate {
    #[serde(default, deserialize_with = "lenient::text")]
    pub arrival: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Text(String),
    Place(Place),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Place {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CarrierField {
    Code(String),
    Named(CarrierRef),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CarrierRef {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub code: Option<String>,
}

/// `status_code` is documented as an integer but some carriers send text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusValue {
    Code(i64),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveriesResponse {
    #[serde(default, deserialize_with = "lenient::list")]
    pub deliveries: Vec<Delivery>,
}

fn status_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<StatusValue>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => Some(match integral(&number) {
            Some(code) => StatusValue::Code(code),
            None => StatusValue::Text(number.to_string()),
        }),
        Value::String(text) => Some(StatusValue::Text(text)),
        _ => None,
    })
}

/// `2` and `2.0` are the same code.
fn integral(number: &serde_json::Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        let value = number.as_f64()?;
        (value.fract() == 0.0 && value.abs() <= i64::MAX as f64).then_some(value as i64)
    })
}

fn carrier_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<CarrierField>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(code) => Some(CarrierField::Code(code)),
        value @ Value::Object(_) => serde_json::from_value(value).ok().map(CarrierField::Named),
        _ => None,
    })
}

fn location<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Location>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(Location::Text(text)),
        value @ Value::Object(_) => serde_json::from_value(value).ok().map(Location::Place),
        _ => None,
    })
}
