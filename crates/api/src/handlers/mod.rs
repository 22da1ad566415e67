pub mod carriers;
pub mod metrics;
pub mod tracking;

pub use carriers::carriers_handler;
pub use metrics::metrics_handler;
pub use tracking::{
    fedex_route_handler, track_by_path_handler, track_handler, ups_route_handler,
};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use shiptrack_domain::{CarrierError, ProxyEnvelope};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("trackingNumber is required")]
    MissingTrackingNumber,
    #[error("{}", .error.message)]
    Carrier {
        status: StatusCode,
        error: CarrierError,
    },
}

impl ApiError {
    fn carrier_error(&self) -> CarrierError {
        match self {
            ApiError::MissingTrackingNumber => {
                CarrierError::new(CarrierError::INVALID_TRACKING_NUMBER, self.to_string())
            }
            ApiError::Carrier { error, .. } => error.clone(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingTrackingNumber => StatusCode::BAD_REQUEST,
            ApiError::Carrier { status, .. } => *status,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ProxyEnvelope::failure(self.carrier_error()))
    }
}
