use serde::{Deserialize, Serialize};

/// Upstream partition of deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Active,
    Recent,
}

impl FilterMode {
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some("recent") => FilterMode::Recent,
            _ => FilterMode::Active,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::Active => "active",
            FilterMode::Recent => "recent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    None,
    Carrier,
    Status,
}

impl GroupBy {
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some("carrier") => GroupBy::Carrier,
            Some("status") => GroupBy::Status,
            _ => GroupBy::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupBy::None => "none",
            GroupBy::Carrier => "carrier",
            GroupBy::Status => "status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarriersResponse {
    #[serde(default)]
    pub carriers: Vec<Carrier>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveriesQuery {
    pub filter_mode: Option<String>,
}

/// Body of `POST /api/add-delivery`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDeliveryRequest {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub carrier_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl AddDeliveryRequest {
    /// Trims every field; `None` when no tracking number is left.
    pub fn into_new_delivery(self) -> Option<NewDelivery> {
        let tracking_number = non_empty(self.tracking_number)?;
        Some(NewDelivery {
            tracking_number,
            carrier_code: non_empty(self.carrier_code),
            title: non_empty(self.title),
        })
    }
}

/// Payload sent to the upstream add-delivery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDelivery {
    pub tracking_number: String,
    pub carrier_code: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionRequest {
    #[serde(
        rename = "apiKey",
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Field deserializers that read a value of the wrong JSON type as absent
/// instead of failing the whole record.
pub(crate) mod lenient {
    use serde::{de::DeserializeOwned, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(value) => Some(value),
            _ => None,
        })
    }

    pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            value @ Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        })
    }

    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        })
    }
}
