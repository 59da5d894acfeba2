use crate::delivery::DeliveriesResponse;
use crate::errors::{AppError, Route};
use crate::models::{Ack, AddDeliveryRequest, CarriersResponse, DeliveriesQuery, FilterMode, SessionRequest};
use crate::search::{RawSearch, SearchState};
use crate::session;
use crate::state::AppState;
use crate::view::{build_view, DashboardView};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

const CARRIERS_CACHE_CONTROL: &str = "public, max-age=86400";

pub async fn list_deliveries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DeliveriesQuery>,
) -> Result<Json<Value>, AppError> {
    let api_key = require_api_key(&headers)?;
    let mode = FilterMode::parse(query.filter_mode.as_deref());

    let payload = state
        .api
        .deliveries(&api_key, mode)
        .await
        .map_err(|err| err.into_app_error(Route::Deliveries))?;

    Ok(Json(payload))
}

pub async fn add_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let api_key = require_api_key(&headers)?;

    let request: AddDeliveryRequest = serde_json::from_slice(&body).unwrap_or_default();
    let delivery = request
        .into_new_delivery()
        .ok_or_else(|| AppError::bad_request("trackingNumber is required"))?;

    let payload = state
        .api
        .add_delivery(&api_key, &delivery)
        .await
        .map_err(|err| err.into_app_error(Route::AddDelivery))?;

    info!(tracking_number = %delivery.tracking_number, "delivery added");
    Ok(Json(payload))
}

pub async fn list_carriers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let carriers = state
        .api
        .supported_carriers()
        .await
        .map_err(|err| err.into_app_error(Route::Carriers))?;

    Ok((
        [(header::CACHE_CONTROL, CARRIERS_CACHE_CONTROL)],
        Json(CarriersResponse { carriers }),
    ))
}

pub async fn create_session(uri: Uri, headers: HeaderMap, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let request: SessionRequest = serde_json::from_slice(&body).unwrap_or_default();
    let api_key = request
        .api_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| AppError::bad_request("API key is required"))?;

    let cookie = session::encode(&api_key, session::is_secure(&uri, &headers));
    info!("session created");
    Ok(([(header::SET_COOKIE, cookie)], Json(Ack { ok: true })))
}

pub async fn destroy_session(uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    let cookie = session::clear(session::is_secure(&uri, &headers));
    info!("session cleared");
    ([(header::SET_COOKIE, cookie)], Json(Ack { ok: true }))
}

/// Deliveries for the requested mode, reshaped into the dashboard view model.
pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(raw): Query<RawSearch>,
) -> Result<Json<DashboardView>, AppError> {
    let api_key = require_api_key(&headers)?;
    let search = SearchState::from(raw);

    let (deliveries, carriers) = tokio::join!(
        state.api.deliveries(&api_key, search.mode),
        state.api.supported_carriers(),
    );

    let deliveries = deliveries.map_err(|err| err.into_app_error(Route::Deliveries))?;
    let deliveries: DeliveriesResponse = serde_json::from_value(deliveries).unwrap_or_default();
    let carriers = carriers.unwrap_or_else(|err| {
        warn!(error = %err, "carrier directory unavailable, continuing without it");
        Vec::new()
    });

    Ok(Json(build_view(&deliveries.deliveries, &carriers, &search)))
}

fn require_api_key(headers: &HeaderMap) -> Result<String, AppError> {
    session::decode(headers).ok_or_else(AppError::unauthenticated)
}
