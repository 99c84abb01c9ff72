// JSON envelopes returned to the front-end.
// The body shapes (and their Spanish messages) are what the existing client
// expects, so they differ slightly per endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::core::indicators::CreatedIndicator;
use crate::core::table::{ErrorKind, TableError};

pub const MSG_UPDATED: &str = "Se actualizó correctamente";
pub const MSG_ID_NOT_FOUND: &str = "ID no encontrado";
pub const MSG_COLUMN_NOT_FOUND: &str = "Columna no encontrada";
pub const MSG_CONNECTION: &str = "Error en la conexión";
pub const MSG_CREATED: &str = "Indicador creado correctamente";

/// Which endpoint family the failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{status:false, error}` with the error text passed through.
    Fetch,
    /// `{error, status:false}` with fixed messages for known conditions.
    Update,
    /// `{status:false, message}`.
    Create,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ValidationGap => StatusCode::BAD_REQUEST,
        ErrorKind::TransportFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A failed operation, already converted to status code + body.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiFailure {
    pub fn new(envelope: Envelope, err: &TableError) -> Self {
        let kind = err.kind();
        match kind {
            ErrorKind::TransportFailure => tracing::error!("Remote store failure: {}", err),
            ErrorKind::ValidationGap => tracing::warn!("Rejected request: {}", err),
            ErrorKind::NotFound => tracing::info!("{}", err),
        }

        let body = match envelope {
            Envelope::Fetch => json!({ "status": false, "error": err.to_string() }),
            Envelope::Update => match err {
                TableError::RowNotFound(_) => json!({ "error": MSG_ID_NOT_FOUND, "status": false }),
                TableError::ColumnNotFound(_) => {
                    json!({ "error": MSG_COLUMN_NOT_FOUND, "status": false })
                }
                TableError::Validation(message) => json!({ "error": message, "status": false }),
                TableError::Transport(detail) => json!({
                    "error": MSG_CONNECTION,
                    "detail": detail,
                    "status": false,
                }),
            },
            Envelope::Create => json!({ "status": false, "message": err.to_string() }),
        };

        Self {
            status: status_for(kind),
            body,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn fetched(data: Value) -> Json<Value> {
    Json(json!({ "status": true, "data": data }))
}

pub fn updated() -> Json<Value> {
    Json(json!({ "success": MSG_UPDATED, "status": true }))
}

pub fn created(indicator: &CreatedIndicator) -> Json<Value> {
    Json(json!({
        "status": true,
        "message": MSG_CREATED,
        "url": indicator.url,
        "id": indicator.id,
        "idIndicadorOficina": indicator.scoped_id,
        "documentId": indicator.document_id,
    }))
}
