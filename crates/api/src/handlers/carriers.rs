use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use shiptrack_domain::CarrierId;

use crate::state::AppState;

/// Input hint shown next to the tracking field.
#[derive(Debug, Serialize, Deserialize)]
pub struct CarrierHint {
    pub id: CarrierId,
    pub name: String,
    pub example: String,
}

pub async fn carriers_handler(state: web::Data<AppState>) -> HttpResponse {
    let hints: Vec<CarrierHint> = state
        .aggregator()
        .registry()
        .iter()
        .map(|config| CarrierHint {
            id: config.id(),
            name: config.name().to_string(),
            example: config.example().to_string(),
        })
        .collect();
    HttpResponse::Ok().json(hints)
}
