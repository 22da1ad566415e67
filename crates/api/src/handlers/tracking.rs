use actix_web::{http::StatusCode, web, HttpResponse};
use metrics::counter;
use shiptrack_carriers::AdapterError;
use shiptrack_domain::{
    normalize_tracking_number, CarrierError, CarrierId, ProxyEnvelope, TrackRequest,
};
use tracing::warn;

use crate::state::AppState;

use super::ApiError;

/// `POST /api/tracking/fedex`: raw FedEx payload; 500 on any failure.
pub async fn fedex_route_handler(
    state: web::Data<AppState>,
    payload: web::Json<TrackRequest>,
) -> Result<HttpResponse, ApiError> {
    vendor_route(&state, CarrierId::Fedex, payload.into_inner()).await
}

/// `POST /api/tracking/ups`: raw UPS payload; vendor status codes propagate.
pub async fn ups_route_handler(
    state: web::Data<AppState>,
    payload: web::Json<TrackRequest>,
) -> Result<HttpResponse, ApiError> {
    vendor_route(&state, CarrierId::Ups, payload.into_inner()).await
}

async fn vendor_route(
    state: &AppState,
    carrier: CarrierId,
    request: TrackRequest,
) -> Result<HttpResponse, ApiError> {
    let route = carrier.as_str();
    let Some(number) = request
        .tracking_number
        .as_deref()
        .and_then(normalize_tracking_number)
    else {
        counter!("api_tracking_requests_total", "route" => route, "status" => "invalid").increment(1);
        return Err(ApiError::MissingTrackingNumber);
    };

    let Some(adapter) = state.aggregator().adapter(carrier) else {
        counter!("api_tracking_requests_total", "route" => route, "status" => "unconfigured").increment(1);
        return Err(ApiError::Carrier {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: CarrierError::new(
                format!("{}_CONFIG_ERROR", carrier.code_prefix()),
                format!("{}: carrier is not registered", carrier.display_name()),
            ),
        });
    };

    match adapter.fetch_payload(&number).await {
        Ok(payload) => {
            counter!("api_tracking_requests_total", "route" => route, "status" => "ok").increment(1);
            Ok(HttpResponse::Ok().json(ProxyEnvelope::success(payload)))
        }
        Err(err) => {
            let status = route_status(carrier, &err);
            let error = err.into_carrier_error(carrier);
            warn!(%carrier, code = %error.code, status = status.as_u16(), "tracking route failed");
            counter!("api_tracking_requests_total", "route" => route, "status" => "error").increment(1);
            Err(ApiError::Carrier { status, error })
        }
    }
}

/// UPS mirrors the vendor's HTTP status; everything else is a 500.
fn route_status(carrier: CarrierId, err: &AdapterError) -> StatusCode {
    let vendor_status = err
        .http_status()
        .and_then(|status| StatusCode::from_u16(status).ok())
        .filter(|status| status.is_client_error() || status.is_server_error());
    match (carrier, vendor_status) {
        (CarrierId::Ups, Some(status)) => status,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `POST /api/tracking`: aggregated lookup across every carrier.
pub async fn track_handler(
    state: web::Data<AppState>,
    payload: web::Json<TrackRequest>,
) -> HttpResponse {
    let raw = payload.into_inner().tracking_number.unwrap_or_default();
    aggregate(&state, &raw).await
}

/// `GET /api/tracking/{trackingNumber}`.
pub async fn track_by_path_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    aggregate(&state, &path.into_inner()).await
}

async fn aggregate(state: &AppState, raw: &str) -> HttpResponse {
    let response = state.aggregator().get_tracking_info(raw).await;
    let (status, tag) = match response.error_code() {
        None => (StatusCode::OK, "ok"),
        Some(CarrierError::NO_CARRIER_FOUND) => (StatusCode::NOT_FOUND, "not_found"),
        Some(CarrierError::INVALID_TRACKING_NUMBER) => (StatusCode::BAD_REQUEST, "invalid"),
        Some(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error"),
    };
    counter!("api_tracking_requests_total", "route" => "aggregate", "status" => tag).increment(1);
    HttpResponse::build(status).json(response)
}
