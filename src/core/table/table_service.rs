// Table service: the read-modify-write workflows on top of a TableGateway.
// It works with plain strings and rows, so the HTTP layer (or a CLI, or a
// test) only has to hand it table names, keys and values.

use super::aggregator::{recompute_totals, AggregationRule, TRIENNIUM_RULES};
use super::row_ops::{locate_row, set_field, LocatedRow};
use super::table_models::{Row, Table, TableError};
use super::table_store::TableGateway;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Orchestrates fetch → locate → mutate → write against one gateway.
///
/// Writes are serialised per table inside this process: every
/// read-modify-write holds the table's lock from the fetch until the write
/// returns, so two requests can't both read the same snapshot and silently
/// overwrite each other. Writers outside this process (other instances,
/// people editing the sheet) are not covered.
pub struct TableService<G: TableGateway> {
    gateway: G,
    rules: &'static [AggregationRule],
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// A held table lock. Dropping it releases the lock and forgets the
/// table's mutex once no other caller holds or waits on it, so names that
/// never existed don't accumulate.
pub struct TableLock<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    table: String,
}

impl Drop for TableLock<'_> {
    fn drop(&mut self) {
        // Release first so our own clone no longer counts.
        self.guard.take();
        self.locks
            .remove_if(self.table.as_str(), |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl<G: TableGateway> TableService<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            rules: TRIENNIUM_RULES,
            locks: DashMap::new(),
        }
    }

    fn validate_table_name(table: &str) -> Result<(), TableError> {
        if table.trim().is_empty() {
            Err(TableError::Validation("sheetName is required".to_string()))
        } else {
            Ok(())
        }
    }

    /// Acquires the single-writer lock for `table`.
    ///
    /// Hold the guard across any fetch whose snapshot feeds a later write.
    pub async fn lock(&self, table: &str) -> TableLock<'_> {
        let mutex = self
            .locks
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        TableLock {
            guard: Some(guard),
            locks: &self.locks,
            table: table.to_string(),
        }
    }

    pub async fn fetch_table(&self, table: &str) -> Result<Table, TableError> {
        Self::validate_table_name(table)?;
        self.gateway.fetch_range(table).await
    }

    /// Fetches `table` and reshapes its data rows into header-keyed records.
    pub async fn fetch_records(&self, table: &str) -> Result<Vec<Map<String, Value>>, TableError> {
        let snapshot = self.fetch_table(table).await?;
        tracing::debug!("Fetched {} row(s) from '{}'", snapshot.rows.len(), table);
        Ok(snapshot.to_records())
    }

    fn find(snapshot: &Table, table: &str, id: &str) -> Result<LocatedRow, TableError> {
        locate_row(snapshot, id).ok_or_else(|| {
            tracing::info!("Row '{}' not found in '{}'", id, table);
            TableError::RowNotFound(id.to_string())
        })
    }

    /// Overwrites the row keyed by `id` with `row`.
    pub async fn update_row(&self, table: &str, id: &str, row: Row) -> Result<(), TableError> {
        Self::validate_table_name(table)?;
        let _guard = self.lock(table).await;

        let snapshot = self.gateway.fetch_range(table).await?;
        if !snapshot.header.is_empty() && row.len() > snapshot.header.len() {
            return Err(TableError::Validation(format!(
                "row has {} cells but '{}' only has {} columns",
                row.len(),
                table,
                snapshot.header.len()
            )));
        }
        let located = Self::find(&snapshot, table, id)?;

        self.gateway.write_row(table, located.position, row).await?;
        tracing::info!("Updated row '{}' of '{}' (sheet row {})", id, table, located.position);
        Ok(())
    }

    /// Sets one named field of the row keyed by `id`, recomputes the derived
    /// totals, and writes the row back in a single call.
    ///
    /// Returns the row as written.
    pub async fn update_field(
        &self,
        table: &str,
        id: &str,
        column: &str,
        value: &str,
    ) -> Result<Row, TableError> {
        Self::validate_table_name(table)?;
        let _guard = self.lock(table).await;

        let snapshot = self.gateway.fetch_range(table).await?;
        let located = Self::find(&snapshot, table, id)?;

        let updated = set_field(&snapshot.header, &located.row, column, value)?;
        let updated = recompute_totals(&snapshot.header, &updated, self.rules)?;

        self.gateway
            .write_row(table, located.position, updated.clone())
            .await?;
        tracing::info!(
            "Set '{}' of row '{}' in '{}' and recomputed totals",
            column,
            id,
            table
        );
        Ok(updated)
    }

    /// Appends `row` to `table`.
    ///
    /// Does not take the table lock; callers that built `row` from a
    /// snapshot (e.g. to allocate an id) must already hold it.
    pub async fn append_row(&self, table: &str, row: Row) -> Result<(), TableError> {
        Self::validate_table_name(table)?;
        self.gateway.append_row(table, row).await?;
        tracing::info!("Appended a row to '{}'", table);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
