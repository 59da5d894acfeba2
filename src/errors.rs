use crate::models::ErrorBody;
use axum::{http::StatusCode, Json};

/// Which proxy route an upstream failure came from; picks the fallback wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Deliveries,
    AddDelivery,
    Carriers,
}

impl Route {
    pub fn name(self) -> &'static str {
        match self {
            Route::Deliveries => "deliveries",
            Route::AddDelivery => "add-delivery",
            Route::Carriers => "carriers",
        }
    }

    fn fallback_message(self) -> &'static str {
        match self {
            Route::Deliveries => "Failed to fetch deliveries from Parcel API",
            Route::AddDelivery => "Failed to add delivery",
            Route::Carriers => "Failed to load carriers",
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn unauthenticated() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Not authenticated".to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Upstream answered with a non-success status. The upstream body is
    /// dropped; only a fixed message derived from the status is returned.
    pub fn upstream(route: Route, status: StatusCode) -> Self {
        let status = match status {
            StatusCode::FORBIDDEN => StatusCode::UNAUTHORIZED,
            other => other,
        };
        Self {
            status,
            message: upstream_message(route, status).to_string(),
        }
    }

    /// Upstream could not be reached or its body could not be read.
    pub fn unreachable(route: Route) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: route.fallback_message().to_string(),
        }
    }
}

pub fn upstream_message(route: Route, status: StatusCode) -> &'static str {
    match status.as_u16() {
        401 | 403 => "Your Parcel API key was rejected. Please sign in again.",
        429 => "Too many requests to the Parcel API. Please wait a moment and try again.",
        400 => "The Parcel API rejected the request. Check the tracking number and carrier.",
        404 if route == Route::AddDelivery => "Tracking number not found for the selected carrier.",
        500..=599 => "The Parcel API is unavailable right now. Please try again later.",
        _ => route.fallback_message(),
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
