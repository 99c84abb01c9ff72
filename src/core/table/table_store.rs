use super::table_models::{Row, Table, TableError};
use async_trait::async_trait;

/// The I/O boundary of the tabular store.
///
/// Every method is one remote call with no local retry. Connectivity or
/// permission problems come back as `TableError::Transport`, never as a
/// not-found condition.
#[async_trait]
pub trait TableGateway: Send + Sync {
    /// Reads the whole configured range of `table`, header included.
    async fn fetch_range(&self, table: &str) -> Result<Table, TableError>;

    /// Overwrites the row at the 1-based sheet row `position`.
    async fn write_row(&self, table: &str, position: usize, row: Row) -> Result<(), TableError>;

    /// Adds `row` after the last row of `table`.
    async fn append_row(&self, table: &str, row: Row) -> Result<(), TableError>;
}
