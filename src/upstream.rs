use crate::config::Config;
use crate::errors::{AppError, Route};
use crate::models::{Carrier, FilterMode, NewDelivery};
use axum::body::Bytes;
use reqwest::StatusCode;
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, error, warn};

const API_KEY_HEADER: &str = "api-key";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream returned status {0}")]
    Status(StatusCode),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream body could not be read: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn into_app_error(self, route: Route) -> AppError {
        match self {
            UpstreamError::Status(status) => {
                warn!(route = route.name(), %status, "upstream rejected request");
                AppError::upstream(route, status)
            }
            UpstreamError::Transport(err) => {
                error!(route = route.name(), error = %err, "upstream unreachable");
                AppError::unreachable(route)
            }
            UpstreamError::Decode(reason) => {
                error!(route = route.name(), %reason, "upstream body unreadable");
                AppError::unreachable(route)
            }
        }
    }
}

/// Stateless client for the Parcel external API.
#[derive(Clone)]
pub struct ParcelApi {
    base_url: String,
    http: reqwest::Client,
}

impl ParcelApi {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!("falling back to default http client: {err}");
                reqwest::Client::new()
            });

        Self {
            base_url: config.upstream_url.clone(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn deliveries(&self, api_key: &str, mode: FilterMode) -> Result<Value, UpstreamError> {
        let url = format!("{}/deliveries/?filter_mode={}", self.base_url, mode.as_str());
        debug!(%url, "fetching deliveries");
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;
        read_passthrough(response).await
    }

    pub async fn add_delivery(&self, api_key: &str, delivery: &NewDelivery) -> Result<Value, UpstreamError> {
        let url = format!("{}/add-delivery/", self.base_url);
        debug!(%url, tracking_number = %delivery.tracking_number, "adding delivery");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(delivery)
            .send()
            .await?;
        read_passthrough(response).await
    }

    pub async fn supported_carriers(&self) -> Result<Vec<Carrier>, UpstreamError> {
        let url = format!("{}/supported_carriers.json", self.base_url);
        debug!(%url, "fetching supported carriers");
        let response = self.http.get(&url).send().await?;
        let payload = read_json(response).await?;
        normalize_carriers(payload)
    }
}

async fn read_bytes(response: reqwest::Response) -> Result<Bytes, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status(status));
    }
    Ok(response.bytes().await?)
}

async fn read_json(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let bytes = read_bytes(response).await?;
    serde_json::from_slice(&bytes).map_err(|err| UpstreamError::Decode(err.to_string()))
}

/// A success whose body is empty or not JSON is relayed as `null`.
async fn read_passthrough(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let bytes = read_bytes(response).await?;
    Ok(serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        warn!(error = %err, "upstream success body is not JSON, relaying null");
        Value::Null
    }))
}

/// Accepts either `[{code, name}]` or `{code: name}`; codes are trimmed and
/// lower-cased, incomplete entries dropped, and the result sorted by name.
pub fn normalize_carriers(payload: Value) -> Result<Vec<Carrier>, UpstreamError> {
    let mut carriers: Vec<Carrier> = match payload {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                carrier_entry(
                    item.get("code").and_then(Value::as_str).unwrap_or_default(),
                    item.get("name").and_then(Value::as_str).unwrap_or_default(),
                )
            })
            .collect(),
        Value::Object(entries) => entries
            .iter()
            .filter_map(|(code, name)| {
                let name = match name {
                    Value::String(name) => name.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                carrier_entry(code, &name)
            })
            .collect(),
        _ => return Err(UpstreamError::Decode("carrier list is neither an array nor an object".into())),
    };

    carriers.sort_by(|a, b| compare_names(&a.name, &b.name));
    Ok(carriers)
}

fn carrier_entry(code: &str, name: &str) -> Option<Carrier> {
    let code = code.trim().to_lowercase();
    let name = name.trim().to_string();
    if code.is_empty() || name.is_empty() {
        return None;
    }
    Some(Carrier { code, name })
}

/// Case-insensitive first, then exact, so the order is total and stable.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_payload_becomes_sorted_list() {
        let carriers = normalize_carriers(json!({ "ups": "UPS", "fedex": "FedEx" })).unwrap();
        assert_eq!(
            carriers,
            vec![
                Carrier { code: "fedex".into(), name: "FedEx".into() },
                Carrier { code: "ups".into(), name: "UPS".into() },
            ]
        );
    }

    #[test]
    fn list_payload_is_cleaned() {
        let carriers = normalize_carriers(json!([
            { "code": "  DHL ", "name": " DHL Express " },
            { "code": "", "name": "Nameless" },
            { "code": "usps" },
            { "code": "amzl", "name": "Amazon Logistics" },
            "junk"
        ]))
        .unwrap();

        assert_eq!(
            carriers,
            vec![
                Carrier { code: "amzl".into(), name: "Amazon Logistics".into() },
                Carrier { code: "dhl".into(), name: "DHL Express".into() },
            ]
        );
    }

    #[test]
    fn scalar_payload_is_rejected() {
        assert!(matches!(normalize_carriers(json!("nope")), Err(UpstreamError::Decode(_))));
        assert!(matches!(normalize_carriers(Value::Null), Err(UpstreamError::Decode(_))));
    }

    #[test]
    fn status_errors_map_through_route_table() {
        let err = UpstreamError::Status(StatusCode::TOO_MANY_REQUESTS).into_app_error(Route::AddDelivery);
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);

        let err = UpstreamError::Decode("bad".into()).into_app_error(Route::Deliveries);
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, "Failed to fetch deliveries from Parcel API");
    }
}
