pub mod aggregator;
pub mod id_allocator;
pub mod row_ops;
pub mod table_models;
pub mod table_service;
pub mod table_store;

pub use id_allocator::{next_global_id, next_scoped_id};
pub use table_models::{cell_from_json, key_from_json, ErrorKind, HeaderIndex, Row, Table, TableError};
pub use table_service::TableService;
pub use table_store::TableGateway;
