//! Same-origin client for the proxy routes, and the runner that executes
//! dashboard effects against it.

use crate::dashboard::{Dashboard, Effect, Msg, Navigation};
use crate::delivery::{DeliveriesResponse, Delivery};
use crate::models::{AddDeliveryRequest, Carrier, CarriersResponse, ErrorBody, FilterMode, SessionRequest};
use crate::session;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderMap;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("{0}")]
    Failed(String),
}

pub struct DashboardClient {
    base_url: String,
    origin: Url,
    http: reqwest::Client,
    jar: Arc<Jar>,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let origin = Url::parse(&base_url).map_err(|err| ClientError::Failed(format!("invalid base url: {err}")))?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|err| ClientError::Failed(err.to_string()))?;

        Ok(Self {
            base_url,
            origin,
            http,
            jar,
        })
    }

    /// Whether the jar holds a usable session cookie for the origin.
    pub fn is_signed_in(&self) -> bool {
        let Some(cookies) = self.jar.cookies(&self.origin) else {
            return false;
        };
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, cookies);
        session::decode(&headers).is_some()
    }

    pub async fn sign_in(&mut self, api_key: &str) -> Result<(), ClientError> {
        let body = SessionRequest {
            api_key: Some(api_key.to_string()),
        };
        let response = self
            .request(Method::POST, "/api/session")
            .json(&body)
            .send()
            .await
            .map_err(|err| transport("Unable to sign in", err))?;

        if !response.status().is_success() {
            return Err(failure(response, "Unable to sign in").await);
        }

        if !self.is_signed_in() {
            return Err(ClientError::Failed("Unable to sign in".to_string()));
        }
        Ok(())
    }

    /// The local session is dropped whatever the server answers.
    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        let result = self.request(Method::DELETE, "/api/session").send().await;
        self.jar.add_cookie_str(&session::clear(false), &self.origin);

        let response = result.map_err(|err| transport("Unable to sign out", err))?;
        if !response.status().is_success() {
            return Err(failure(response, "Unable to sign out").await);
        }
        Ok(())
    }

    pub async fn fetch_deliveries(&self, mode: FilterMode) -> Result<Vec<Delivery>, ClientError> {
        const FALLBACK: &str = "Failed to load deliveries";

        let path = format!("/api/deliveries?filter_mode={}", mode.as_str());
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|err| transport(FALLBACK, err))?;

        if !response.status().is_success() {
            return Err(failure(response, FALLBACK).await);
        }

        let body: Value = response.json().await.map_err(|err| transport(FALLBACK, err))?;
        let body: DeliveriesResponse = serde_json::from_value(body).unwrap_or_default();
        Ok(body.deliveries)
    }

    /// The carrier directory is optional; any failure yields an empty list.
    pub async fn fetch_carriers(&self) -> Vec<Carrier> {
        let response = match self.request(Method::GET, "/api/carriers").send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "carrier list unavailable");
                return Vec::new();
            }
            Err(err) => {
                debug!(error = %err, "carrier list unavailable");
                return Vec::new();
            }
        };

        response
            .json::<CarriersResponse>()
            .await
            .map(|body| body.carriers)
            .unwrap_or_default()
    }

    pub async fn add_delivery(&self, request: &AddDeliveryRequest) -> Result<(), ClientError> {
        const FALLBACK: &str = "Failed to add delivery";

        let response = self
            .request(Method::POST, "/api/add-delivery")
            .json(request)
            .send()
            .await
            .map_err(|err| transport(FALLBACK, err))?;

        if !response.status().is_success() {
            return Err(failure(response, FALLBACK).await);
        }
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{path}", self.base_url))
    }
}

/// Feeds `msg` to the dashboard and keeps running the resulting effects until
/// none are left. Returns the navigations requested along the way.
pub async fn run(dashboard: &mut Dashboard, client: &mut DashboardClient, msg: Msg) -> Vec<Navigation> {
    let mut queue = VecDeque::from([msg]);
    let mut navigations = Vec::new();

    while let Some(msg) = queue.pop_front() {
        for effect in dashboard.update(msg) {
            let next = match effect {
                Effect::Navigate(navigation) => {
                    navigations.push(navigation);
                    continue;
                }
                Effect::FetchDeliveries(mode) => Msg::DeliveriesFetched(client.fetch_deliveries(mode).await),
                Effect::FetchCarriers => Msg::CarriersFetched(client.fetch_carriers().await),
                Effect::SubmitDelivery(request) => Msg::DeliveryAdded(client.add_delivery(&request).await),
                Effect::EndSession => {
                    if let Err(err) = client.sign_out().await {
                        warn!(error = %err, "sign out request failed");
                    }
                    Msg::SessionEnded
                }
            };
            queue.push_back(next);
        }
    }

    navigations
}

async fn failure(response: Response, fallback: &str) -> ClientError {
    if response.status() == StatusCode::UNAUTHORIZED {
        return ClientError::Unauthorized;
    }

    match response.json::<ErrorBody>().await {
        Ok(body) if !body.error.is_empty() => ClientError::Failed(body.error),
        _ => ClientError::Failed(fallback.to_string()),
    }
}

fn transport(fallback: &str, err: reqwest::Error) -> ClientError {
    warn!(error = %err, "{fallback}");
    ClientError::Failed(fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_lives_in_the_cookie_jar() {
        let client = DashboardClient::new("http://127.0.0.1:8080/").unwrap();
        assert!(!client.is_signed_in());

        client.jar.add_cookie_str(&session::encode("key;1", false), &client.origin);
        assert!(client.is_signed_in());

        client.jar.add_cookie_str(&session::clear(false), &client.origin);
        assert!(!client.is_signed_in());
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(DashboardClient::new("not a url").is_err());
    }
}
