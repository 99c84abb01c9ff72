// Google Sheets v4 implementation of the TableGateway port.
//
// A "table" is a tab of the configured spreadsheet. Reads fetch a fixed A1
// range of the tab (A1:Z1000 by default); writes address a single row.

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::service_account::AccessTokenProvider;
use crate::core::table::{cell_from_json, Row, Table, TableError, TableGateway};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Response body of `spreadsheets.values.get`. Google omits `values`
/// entirely for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub spreadsheet_id: String,
    /// A1 range read from every tab, without the tab name (e.g. `A1:Z1000`).
    pub range: String,
    /// `RAW` or `USER_ENTERED`.
    pub value_input_option: String,
    pub timeout: Duration,
}

pub struct GoogleSheetsGateway {
    client: Client,
    auth: Arc<dyn AccessTokenProvider>,
    settings: SheetsSettings,
    base_url: String,
}

/// Quotes a tab name for A1 notation when it isn't a bare identifier.
pub fn quote_sheet_name(sheet: &str) -> String {
    let bare = !sheet.is_empty() && sheet.chars().all(|c| c.is_alphanumeric() || c == '_');
    if bare {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

/// `<sheet>!<cells>` in A1 notation.
pub fn a1_range(sheet: &str, cells: &str) -> String {
    format!("{}!{}", quote_sheet_name(sheet), cells)
}

fn transport<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> TableError + '_ {
    move |e| TableError::Transport(format!("{}: {}", context, e))
}

impl GoogleSheetsGateway {
    pub fn new(
        auth: Arc<dyn AccessTokenProvider>,
        settings: SheetsSettings,
    ) -> Result<Self, TableError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(transport("Failed to build HTTP client"))?;

        Ok(Self {
            client,
            auth,
            settings,
            base_url: SHEETS_BASE_URL.to_string(),
        })
    }

    /// `<base>/<spreadsheet>/values/<range><suffix>`, with the range
    /// percent-encoded as a single path segment.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, TableError> {
        let mut url = Url::parse(&self.base_url).map_err(transport("Invalid Sheets URL"))?;
        url.path_segments_mut()
            .map_err(|_| TableError::Transport("Sheets URL cannot be a base".to_string()))?
            .push(&self.settings.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<reqwest::Response, TableError> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(transport("Google authentication failed"))?;

        let mut request = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(transport("Sheets request failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(TableError::Transport(format!(
                "Sheets API error ({}): {}",
                status, text
            )));
        }
        Ok(response)
    }
}

/// Converts the raw `values` matrix into string rows.
fn rows_from_values(values: Vec<Vec<Value>>) -> Vec<Row> {
    values
        .into_iter()
        .map(|row| row.iter().map(cell_from_json).collect())
        .collect()
}

#[async_trait]
impl TableGateway for GoogleSheetsGateway {
    async fn fetch_range(&self, table: &str) -> Result<Table, TableError> {
        let range = a1_range(table, &self.settings.range);
        let url = self.values_url(&range, "")?;
        tracing::debug!("Fetching {} from spreadsheet {}", range, self.settings.spreadsheet_id);

        let body: ValueRange = self
            .send(Method::GET, url, None)
            .await?
            .json()
            .await
            .map_err(transport("Invalid Sheets response"))?;

        Ok(Table::from_values(rows_from_values(body.values)))
    }

    async fn write_row(&self, table: &str, position: usize, row: Row) -> Result<(), TableError> {
        let range = a1_range(table, &format!("A{}", position));
        let mut url = self.values_url(&range, "")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", &self.settings.value_input_option);

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [row],
        });
        self.send(Method::PUT, url, Some(body)).await?;
        tracing::debug!("Wrote {}", range);
        Ok(())
    }

    async fn append_row(&self, table: &str, row: Row) -> Result<(), TableError> {
        let range = a1_range(table, "A1");
        let mut url = self.values_url(&range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", &self.settings.value_input_option)
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({
            "majorDimension": "ROWS",
            "values": [row],
        });
        self.send(Method::POST, url, Some(body)).await?;
        tracing::debug!("Appended a row after {}", range);
        Ok(())
    }
}
