// In-memory implementations of the TableGateway and DocumentStore ports.
// They behave like the Google adapters closely enough to drive the HTTP
// layer in tests without any network access.

use crate::core::indicators::{CopiedDocument, DocumentStore};
use crate::core::table::{Row, Table, TableError, TableGateway};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tables keyed by name; each value holds the header followed by data rows.
#[derive(Default)]
pub struct InMemoryTableGateway {
    tables: DashMap<String, Vec<Row>>,
}

impl InMemoryTableGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, values: Vec<Row>) -> Self {
        self.tables.insert(name.to_string(), values);
        self
    }

    pub fn values(&self, name: &str) -> Option<Vec<Row>> {
        self.tables.get(name).map(|entry| entry.value().clone())
    }
}

fn unknown_table(name: &str) -> TableError {
    // Sheets answers 400 "Unable to parse range" for a missing tab.
    TableError::Transport(format!("Unable to parse range: {}", name))
}

#[async_trait]
impl TableGateway for InMemoryTableGateway {
    async fn fetch_range(&self, table: &str) -> Result<Table, TableError> {
        self.values(table)
            .map(Table::from_values)
            .ok_or_else(|| unknown_table(table))
    }

    async fn write_row(&self, table: &str, position: usize, row: Row) -> Result<(), TableError> {
        let mut values = self.tables.get_mut(table).ok_or_else(|| unknown_table(table))?;
        if position == 0 {
            return Err(TableError::Transport("Row positions start at 1".to_string()));
        }
        if values.len() < position {
            values.resize(position, Vec::new());
        }
        values[position - 1] = row;
        Ok(())
    }

    async fn append_row(&self, table: &str, row: Row) -> Result<(), TableError> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| unknown_table(table))?
            .push(row);
        Ok(())
    }
}

/// Records template copies and hands out sequential document ids.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    next_id: AtomicU64,
    copies: DashMap<String, (String, String)>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(template_id, folder_id)` used for the document named `name`.
    pub fn copy_named(&self, name: &str) -> Option<(String, String)> {
        self.copies.get(name).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn copy_template(
        &self,
        template_id: &str,
        name: &str,
        folder_id: &str,
    ) -> Result<CopiedDocument, TableError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.copies.insert(
            name.to_string(),
            (template_id.to_string(), folder_id.to_string()),
        );
        Ok(CopiedDocument {
            id: format!("local-{}", id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_in_memory_gateway() {
        let gateway = InMemoryTableGateway::new()
            .with_table("Metas", vec![row(&["id", "nombre"]), row(&["1", "Uno"])]);

        let table = gateway.fetch_range("Metas").await.unwrap();
        assert_eq!(table.rows.len(), 1);

        gateway.write_row("Metas", 2, row(&["1", "Uno bis"])).await.unwrap();
        gateway.append_row("Metas", row(&["2", "Dos"])).await.unwrap();

        let values = gateway.values("Metas").unwrap();
        assert_eq!(values[1], row(&["1", "Uno bis"]));
        assert_eq!(values[2], row(&["2", "Dos"]));
    }

    #[tokio::test]
    async fn unknown_tables_fail_like_the_remote_store() {
        let gateway = InMemoryTableGateway::new();
        let err = gateway.fetch_range("Nope").await.unwrap_err();
        assert!(matches!(err, TableError::Transport(_)));
    }

    #[tokio::test]
    async fn document_ids_are_sequential() {
        let store = InMemoryDocumentStore::new();
        let a = store.copy_template("t", "a", "f").await.unwrap();
        let b = store.copy_template("t", "b", "f").await.unwrap();
        assert_eq!(a.id, "local-1");
        assert_eq!(b.id, "local-2");
        assert_eq!(store.copy_named("b"), Some(("t".to_string(), "f".to_string())));
    }
}
