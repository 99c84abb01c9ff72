// =============================================================================
// GOOGLE MODULE
// =============================================================================
//
// Adapters for the Google APIs behind the core ports:
// - `service_account.rs` mints and caches OAuth2 tokens
// - `sheets_client.rs` implements `TableGateway` over Sheets v4
// - `drive_client.rs` implements `DocumentStore` over Drive v3

pub mod drive_client;
pub mod service_account;
pub mod sheets_client;

pub use drive_client::GoogleDriveClient;
pub use service_account::{AccessTokenProvider, ServiceAccountAuth};
pub use sheets_client::{GoogleSheetsGateway, SheetsSettings};
