use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use super::AppState;
use crate::error::BookingError;
use crate::models::Availability;

/// JSON error body `{"detail": ...}` with a status matching the error kind.
pub(crate) struct ApiError(BookingError);

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            BookingError::CalendarNotFound { negocio, calendario } => {
                warn!("Calendar {} not configured for {}", calendario, negocio);
                (StatusCode::NOT_FOUND, self.0.to_string())
            }
            e if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            e => {
                error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error interno del servidor: {e}"),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookRequest {
    id_negocio: String,
    id_calendario: u32,
    fecha: String,
    hora: String,
    usuario: String,
}

pub(crate) async fn book_handler(
    State(state): State<AppState>,
    Json(req): Json<BookRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .engine
        .create_reservation(
            &req.id_negocio,
            &req.fecha,
            &req.hora,
            &req.usuario,
            req.id_calendario,
        )
        .inspect_err(|e| {
            if e.is_client_error() {
                warn!(
                    "Booking {} {} on {}/{} refused: {}",
                    req.fecha, req.hora, req.id_negocio, req.id_calendario, e
                );
            }
        })?;
    Ok(Json(json!({ "mensaje": "Reserva creada exitosamente!" })))
}

pub(crate) async fn availability_handler(
    State(state): State<AppState>,
    Path((negocio, calendario)): Path<(String, u32)>,
) -> Result<Json<Availability>, ApiError> {
    let today = state.engine.today();
    Ok(Json(state.engine.availability(&negocio, calendario, today)?))
}

pub(crate) async fn server_time_handler(State(state): State<AppState>) -> Json<Value> {
    let now = state.engine.now();
    Json(json!({ "hora": now.format("%Y-%m-%d %H:%M:%S").to_string() }))
}
