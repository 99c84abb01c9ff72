// Indicator creation.
// Creating an indicator touches two remote stores: the indicators sheet gets
// a new row, and Drive gets a companion spreadsheet copied from a template.
// The row carries the companion's URL, so the copy happens first.

use super::indicator_models::{
    CreatedIndicator, DocumentStore, IndicatorConfig, IndicatorRecord, NewIndicator,
    COL_OFFICE, COL_SCOPED_ID, FIRST_PERIOD,
};
use crate::core::table::{next_global_id, next_scoped_id, TableError, TableGateway, TableService};
use std::sync::Arc;

pub struct IndicatorService<G: TableGateway, D: DocumentStore> {
    tables: Arc<TableService<G>>,
    documents: D,
    config: IndicatorConfig,
}

impl<G, D> IndicatorService<G, D>
where
    G: TableGateway,
    D: DocumentStore,
{
    /// Shares the table service with the HTTP layer so both use the same
    /// per-table locks.
    pub fn new(tables: Arc<TableService<G>>, documents: D, config: IndicatorConfig) -> Self {
        Self {
            tables,
            documents,
            config,
        }
    }

    /// Creates an indicator row and its companion spreadsheet.
    ///
    /// **Steps** (all under the indicators table lock):
    /// 1. fetch the indicators sheet
    /// 2. allocate the global id and the per-office number
    /// 3. copy the template into the configured folder
    /// 4. project the record through the header and append it
    ///
    /// If the append fails after the copy succeeded, the copied file is left
    /// in Drive and the error is returned.
    pub async fn create_indicator(
        &self,
        request: &NewIndicator,
    ) -> Result<CreatedIndicator, TableError> {
        let valid = request.validate()?;
        let template_id = valid
            .template_id
            .clone()
            .or_else(|| self.config.default_template_id.clone())
            .ok_or_else(|| {
                TableError::Validation(
                    "plantillaId is required when no default template is configured".to_string(),
                )
            })?;

        let table = self.config.table.as_str();
        let _guard = self.tables.lock(table).await;
        let snapshot = self.tables.fetch_table(table).await?;

        let id = next_global_id(&snapshot.rows);
        let scoped_id = next_scoped_id(
            &snapshot.header,
            &snapshot.rows,
            COL_OFFICE,
            &valid.oficina_escuela,
            COL_SCOPED_ID,
        )?;

        let mut executions = [None; 3];
        let slot = usize::from(self.config.current_period.saturating_sub(FIRST_PERIOD));
        if let Some(execution) = executions.get_mut(slot) {
            *execution = Some(valid.current_progress);
        }

        let mut record = IndicatorRecord {
            id,
            objective_id: valid.objective_id,
            scoped_id,
            nombre: valid.nombre,
            oficina_escuela: valid.oficina_escuela,
            responsable: valid.responsable,
            coequipero: valid.coequipero,
            goals: valid.goals,
            executions,
            url: String::new(),
        };
        // Catch header problems before creating anything in Drive.
        record.to_row(&snapshot.header)?;

        let document_name = format!("{} - {}", record.id, record.nombre);
        let document = self
            .documents
            .copy_template(&template_id, &document_name, &self.config.folder_id)
            .await?;
        tracing::info!(
            "Copied template {} to document {} for indicator {}",
            template_id,
            document.id,
            id
        );

        record.url = document.spreadsheet_url();
        let row = record.to_row(&snapshot.header)?;
        self.tables.append_row(table, row).await?;

        tracing::info!(
            "Created indicator {} ({} #{} of '{}')",
            id,
            record.nombre,
            scoped_id,
            record.oficina_escuela
        );

        Ok(CreatedIndicator {
            id,
            scoped_id,
            document_id: document.id,
            url: record.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::indicators::indicator_models::CopiedDocument;
    use crate::core::table::{Row, Table};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockSheet {
        values: Mutex<Vec<Row>>,
    }

    #[async_trait]
    impl TableGateway for MockSheet {
        async fn fetch_range(&self, _: &str) -> Result<Table, TableError> {
            Ok(Table::from_values(self.values.lock().unwrap().clone()))
        }

        async fn write_row(&self, _: &str, _: usize, _: Row) -> Result<(), TableError> {
            Err(TableError::Transport("write_row should not be used".to_string()))
        }

        async fn append_row(&self, _: &str, row: Row) -> Result<(), TableError> {
            self.values.lock().unwrap().push(row);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockDrive {
        copies: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl DocumentStore for MockDrive {
        async fn copy_template(
            &self,
            template_id: &str,
            name: &str,
            folder_id: &str,
        ) -> Result<CopiedDocument, TableError> {
            if self.fail {
                return Err(TableError::Transport("403 insufficient permissions".to_string()));
            }
            let mut copies = self.copies.lock().unwrap();
            copies.push((template_id.to_string(), name.to_string(), folder_id.to_string()));
            Ok(CopiedDocument {
                id: format!("doc-{}", copies.len()),
            })
        }
    }

    const HEADER: &[&str] = &[
        "id",
        "id_obj_dec",
        "id_indicador_oficina",
        "nombre",
        "oficina_escuela",
        "responsable",
        "coequipero",
        "2024",
        "2025",
        "2026",
        "meta_trienio",
        "ejec_2024",
        "ejec_2025",
        "ejec_2026",
        "total_ejec",
        "url",
    ];

    fn sheet(rows: &[&[&str]]) -> MockSheet {
        let mut values: Vec<Row> = vec![HEADER.iter().map(|s| s.to_string()).collect()];
        values.extend(rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect::<Row>()));
        MockSheet {
            values: Mutex::new(values),
        }
    }

    fn config(current_period: u16) -> IndicatorConfig {
        IndicatorConfig {
            table: "Indicadores".to_string(),
            folder_id: "folder-1".to_string(),
            default_template_id: Some("template-default".to_string()),
            current_period,
        }
    }

    fn request() -> NewIndicator {
        serde_json::from_value(json!({
            "nombre": "Tasa de retención",
            "oficinaEscuela": "A",
            "responsable": "Dirección",
            "coequipero": "Equipo 2",
            "meta2024": 10,
            "meta2025": 20,
            "meta2026": "30",
            "id_obj_dec": "4",
            "currentAvance": 7,
        }))
        .unwrap()
    }

    fn service(
        sheet: MockSheet,
        drive: MockDrive,
        current_period: u16,
    ) -> IndicatorService<MockSheet, MockDrive> {
        IndicatorService::new(Arc::new(TableService::new(sheet)), drive, config(current_period))
    }

    #[tokio::test]
    async fn creates_row_and_companion_document() {
        let service = service(
            sheet(&[
                &["1", "1", "1", "X", "A"],
                &["5", "1", "2", "Y", "A"],
                &["3", "2", "9", "Z", "B"],
            ]),
            MockDrive::default(),
            2025,
        );

        let created = service.create_indicator(&request()).await.unwrap();
        assert_eq!(created.id, 6);
        assert_eq!(created.scoped_id, 3);
        assert_eq!(created.document_id, "doc-1");
        assert_eq!(created.url, "https://docs.google.com/spreadsheets/d/doc-1/edit");

        let copies = service.documents.copies.lock().unwrap().clone();
        assert_eq!(
            copies,
            vec![(
                "template-default".to_string(),
                "6 - Tasa de retención".to_string(),
                "folder-1".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn appended_row_carries_totals_and_progress() {
        let service = service(sheet(&[]), MockDrive::default(), 2025);
        service.create_indicator(&request()).await.unwrap();

        let table = service.tables.fetch_table("Indicadores").await.unwrap();
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        let cell = |c: &str| row[table.header.index_of(c).unwrap()].clone();
        assert_eq!(cell("id"), "1");
        assert_eq!(cell("id_indicador_oficina"), "1");
        assert_eq!(cell("meta_trienio"), "60");
        assert_eq!(cell("ejec_2024"), "");
        assert_eq!(cell("ejec_2025"), "7");
        assert_eq!(cell("total_ejec"), "7");
        assert_eq!(cell("url"), "https://docs.google.com/spreadsheets/d/doc-1/edit");
    }

    #[tokio::test]
    async fn request_template_overrides_default() {
        let service = service(sheet(&[]), MockDrive::default(), 2024);
        let mut req = request();
        req.plantilla_id = Some("template-custom".to_string());

        service.create_indicator(&req).await.unwrap();
        let copies = service.documents.copies.lock().unwrap().clone();
        assert_eq!(copies[0].0, "template-custom");
    }

    #[tokio::test]
    async fn missing_template_is_a_validation_error() {
        let mut service = service(sheet(&[]), MockDrive::default(), 2024);
        service.config.default_template_id = None;

        let err = service.create_indicator(&request()).await.unwrap_err();
        assert!(matches!(err, TableError::Validation(_)));
        assert!(service.documents.copies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn header_problems_stop_before_copying() {
        let narrow = MockSheet {
            values: Mutex::new(vec![vec![
                "id".to_string(),
                "oficina_escuela".to_string(),
                "id_indicador_oficina".to_string(),
            ]]),
        };
        let service = service(narrow, MockDrive::default(), 2024);

        let err = service.create_indicator(&request()).await.unwrap_err();
        assert!(matches!(err, TableError::ColumnNotFound(_)));
        assert!(service.documents.copies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn drive_failure_leaves_the_sheet_untouched() {
        let drive = MockDrive {
            fail: true,
            ..Default::default()
        };
        let service = service(sheet(&[&["1"]]), drive, 2024);

        let err = service.create_indicator(&request()).await.unwrap_err();
        assert!(matches!(err, TableError::Transport(_)));
        let table = service.tables.fetch_table("Indicadores").await.unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_up_front() {
        let service = service(sheet(&[]), MockDrive::default(), 2024);
        let mut req = request();
        req.responsable = None;

        let err = service.create_indicator(&req).await.unwrap_err();
        assert!(matches!(err, TableError::Validation(ref m) if m.contains("responsable")));
    }
}
