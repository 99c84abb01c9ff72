// HTTP routes.
// Handlers only parse the request, call a core service and pick the
// response envelope; all table logic lives in `core`.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::responses::{self, ApiFailure, Envelope};
use crate::core::indicators::{DocumentStore, IndicatorService, NewIndicator};
use crate::core::table::{cell_from_json, key_from_json, Row, TableError, TableGateway, TableService};

/// Services shared by every handler.
pub struct AppState<G: TableGateway, D: DocumentStore> {
    pub tables: Arc<TableService<G>>,
    pub indicators: IndicatorService<G, D>,
}

type Shared<G, D> = State<Arc<AppState<G, D>>>;

// ============================================================================
// REQUEST BODIES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetDataRequest {
    #[serde(default, rename = "sheetName")]
    sheet_name: Option<String>,
}

/// Body shared by `/updateData` (full row) and `/updateMetas`
/// (`[columnName, value]`).
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default, rename = "updateData")]
    update_data: Option<Vec<Value>>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, rename = "sheetName")]
    sheet_name: Option<String>,
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>, envelope: Envelope) -> Result<T, ApiFailure> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            ApiFailure::new(envelope, &TableError::Validation(rejection.body_text()))
        })
}

fn require_sheet(sheet_name: Option<String>, envelope: Envelope) -> Result<String, ApiFailure> {
    sheet_name
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ApiFailure::new(
                envelope,
                &TableError::Validation("sheetName is required".to_string()),
            )
        })
}

impl UpdateRequest {
    /// Returns `(sheet, id, updateData)` or a validation failure.
    fn into_parts(self) -> Result<(String, String, Vec<Value>), ApiFailure> {
        let invalid = |message: &str| {
            ApiFailure::new(Envelope::Update, &TableError::Validation(message.to_string()))
        };

        let sheet = require_sheet(self.sheet_name, Envelope::Update)?;
        let id = self
            .id
            .as_ref()
            .map(key_from_json)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| invalid("id is required"))?;
        let data = self
            .update_data
            .ok_or_else(|| invalid("updateData is required"))?;
        Ok((sheet, id, data))
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn root() -> &'static str {
    "El servidor está funcionando correctamente"
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `POST /getData`: every data row of a sheet, keyed by header.
async fn get_data<G, D>(
    State(state): Shared<G, D>,
    payload: Result<Json<GetDataRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiFailure>
where
    G: TableGateway + 'static,
    D: DocumentStore + 'static,
{
    let body = parse_body(payload, Envelope::Fetch)?;
    let sheet = require_sheet(body.sheet_name, Envelope::Fetch)?;

    let records = state
        .tables
        .fetch_records(&sheet)
        .await
        .map_err(|e| ApiFailure::new(Envelope::Fetch, &e))?;

    let data = records.into_iter().map(Value::Object).collect();
    Ok(responses::fetched(Value::Array(data)))
}

/// `POST /updateData`: overwrite a whole row.
async fn update_data<G, D>(
    State(state): Shared<G, D>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiFailure>
where
    G: TableGateway + 'static,
    D: DocumentStore + 'static,
{
    let (sheet, id, data) = parse_body(payload, Envelope::Update)?.into_parts()?;
    let row: Row = data.iter().map(cell_from_json).collect();

    state
        .tables
        .update_row(&sheet, &id, row)
        .await
        .map_err(|e| ApiFailure::new(Envelope::Update, &e))?;
    Ok(responses::updated())
}

/// `POST /updateMetas`: set one field and recompute the triennium totals.
async fn update_metas<G, D>(
    State(state): Shared<G, D>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiFailure>
where
    G: TableGateway + 'static,
    D: DocumentStore + 'static,
{
    let (sheet, id, data) = parse_body(payload, Envelope::Update)?.into_parts()?;
    let (column, value) = match data.as_slice() {
        [column, value] => (cell_from_json(column), cell_from_json(value)),
        _ => {
            return Err(ApiFailure::new(
                Envelope::Update,
                &TableError::Validation("updateData must be [columnName, value]".to_string()),
            ))
        }
    };

    state
        .tables
        .update_field(&sheet, &id, &column, &value)
        .await
        .map_err(|e| ApiFailure::new(Envelope::Update, &e))?;
    Ok(responses::updated())
}

/// `POST /createIndicator`: new indicator row plus its companion sheet.
async fn create_indicator<G, D>(
    State(state): Shared<G, D>,
    payload: Result<Json<NewIndicator>, JsonRejection>,
) -> Result<Json<Value>, ApiFailure>
where
    G: TableGateway + 'static,
    D: DocumentStore + 'static,
{
    let request = parse_body(payload, Envelope::Create)?;

    let created = state
        .indicators
        .create_indicator(&request)
        .await
        .map_err(|e| ApiFailure::new(Envelope::Create, &e))?;
    Ok(responses::created(&created))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn router<G, D>(state: Arc<AppState<G, D>>) -> Router
where
    G: TableGateway + 'static,
    D: DocumentStore + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/getData", post(get_data::<G, D>))
        .route("/updateData", post(update_data::<G, D>))
        .route("/updateMetas", post(update_metas::<G, D>))
        .route("/createIndicator", post(create_indicator::<G, D>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
