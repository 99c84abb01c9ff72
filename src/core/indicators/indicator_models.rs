// Indicator domain: the request to create one, the typed record that is
// written to the indicators sheet, and the port used to copy its companion
// spreadsheet from a template.

use crate::core::table::aggregator::format_number;
use crate::core::table::{HeaderIndex, Row, TableError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// COLUMN NAMES
// ============================================================================

pub const COL_ID: &str = "id";
pub const COL_OBJECTIVE: &str = "id_obj_dec";
pub const COL_SCOPED_ID: &str = "id_indicador_oficina";
pub const COL_NAME: &str = "nombre";
pub const COL_OFFICE: &str = "oficina_escuela";
pub const COL_OWNER: &str = "responsable";
pub const COL_TEAMMATE: &str = "coequipero";
pub const GOAL_COLUMNS: [&str; 3] = ["2024", "2025", "2026"];
pub const COL_GOAL_TOTAL: &str = "meta_trienio";
pub const EXECUTION_COLUMNS: [&str; 3] = ["ejec_2024", "ejec_2025", "ejec_2026"];
pub const COL_EXECUTION_TOTAL: &str = "total_ejec";
pub const COL_URL: &str = "url";

/// First year of the triennium; goal `i` belongs to `FIRST_PERIOD + i`.
pub const FIRST_PERIOD: u16 = 2024;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct IndicatorConfig {
    /// Name of the sheet holding one row per indicator.
    pub table: String,
    /// Drive folder receiving the companion spreadsheets.
    pub folder_id: String,
    /// Template used when the request doesn't name one.
    pub default_template_id: Option<String>,
    /// Year whose execution column receives `currentAvance`.
    pub current_period: u16,
}

// ============================================================================
// CREATE REQUEST
// ============================================================================

/// Body of a create-indicator request, as sent by the front-end.
///
/// Numeric fields accept JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIndicator {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default, rename = "oficinaEscuela")]
    pub oficina_escuela: Option<String>,
    #[serde(default)]
    pub responsable: Option<String>,
    #[serde(default)]
    pub coequipero: Option<String>,
    #[serde(default)]
    pub meta2024: Option<Value>,
    #[serde(default)]
    pub meta2025: Option<Value>,
    #[serde(default)]
    pub meta2026: Option<Value>,
    #[serde(default)]
    pub id_obj_dec: Option<Value>,
    #[serde(default, rename = "plantillaId")]
    pub plantilla_id: Option<String>,
    #[serde(default, rename = "currentAvance")]
    pub current_avance: Option<Value>,
}

fn required_text(value: &Option<String>, field: &str) -> Result<String, TableError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(TableError::Validation(format!("{} is required", field))),
    }
}

/// Parses an optional numeric field. Absent, null or blank means zero.
fn optional_number(value: &Option<Value>, field: &str) -> Result<f64, TableError> {
    let invalid = || TableError::Validation(format!("{} must be a number", field));
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

/// The request after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidIndicator {
    pub nombre: String,
    pub oficina_escuela: String,
    pub responsable: String,
    pub coequipero: String,
    pub goals: [f64; 3],
    pub objective_id: String,
    pub template_id: Option<String>,
    pub current_progress: f64,
}

impl NewIndicator {
    pub fn validate(&self) -> Result<ValidIndicator, TableError> {
        let objective_id = match &self.id_obj_dec {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(TableError::Validation("id_obj_dec is required".to_string())),
        };

        Ok(ValidIndicator {
            nombre: required_text(&self.nombre, "nombre")?,
            oficina_escuela: required_text(&self.oficina_escuela, "oficinaEscuela")?,
            responsable: required_text(&self.responsable, "responsable")?,
            coequipero: self
                .coequipero
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            goals: [
                optional_number(&self.meta2024, "meta2024")?,
                optional_number(&self.meta2025, "meta2025")?,
                optional_number(&self.meta2026, "meta2026")?,
            ],
            objective_id,
            template_id: self
                .plantilla_id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            current_progress: optional_number(&self.current_avance, "currentAvance")?,
        })
    }
}

// ============================================================================
// TYPED RECORD
// ============================================================================

/// One row of the indicators sheet, by field rather than by position.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRecord {
    pub id: i64,
    pub objective_id: String,
    pub scoped_id: i64,
    pub nombre: String,
    pub oficina_escuela: String,
    pub responsable: String,
    pub coequipero: String,
    pub goals: [f64; 3],
    pub executions: [Option<f64>; 3],
    pub url: String,
}

impl IndicatorRecord {
    pub fn goal_total(&self) -> f64 {
        self.goals.iter().sum()
    }

    pub fn execution_total(&self) -> f64 {
        self.executions.iter().flatten().sum()
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            (COL_ID, self.id.to_string()),
            (COL_OBJECTIVE, self.objective_id.clone()),
            (COL_SCOPED_ID, self.scoped_id.to_string()),
            (COL_NAME, self.nombre.clone()),
            (COL_OFFICE, self.oficina_escuela.clone()),
            (COL_OWNER, self.responsable.clone()),
            (COL_TEAMMATE, self.coequipero.clone()),
        ];
        for (column, goal) in GOAL_COLUMNS.into_iter().zip(self.goals) {
            fields.push((column, format_number(goal)));
        }
        fields.push((COL_GOAL_TOTAL, format_number(self.goal_total())));
        for (column, execution) in EXECUTION_COLUMNS.into_iter().zip(self.executions) {
            fields.push((column, execution.map(format_number).unwrap_or_default()));
        }
        fields.push((COL_EXECUTION_TOTAL, format_number(self.execution_total())));
        fields.push((COL_URL, self.url.clone()));
        fields
    }

    /// Lays the record out in header order. Header columns the record
    /// doesn't know stay empty; record columns missing from the header are
    /// an error.
    pub fn to_row(&self, header: &HeaderIndex) -> Result<Row, TableError> {
        let mut row = vec![String::new(); header.len()];
        for (column, value) in self.fields() {
            row[header.require(column)?] = value;
        }
        Ok(row)
    }
}

/// Result of a successful creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIndicator {
    pub id: i64,
    pub scoped_id: i64,
    pub document_id: String,
    pub url: String,
}

// ============================================================================
// DOCUMENT STORE (PORT)
// ============================================================================

/// A file produced by copying a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedDocument {
    pub id: String,
}

impl CopiedDocument {
    pub fn spreadsheet_url(&self) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}/edit", self.id)
    }
}

/// Remote document store able to copy a template into a folder.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn copy_template(
        &self,
        template_id: &str,
        name: &str,
        folder_id: &str,
    ) -> Result<CopiedDocument, TableError>;
}
