// Google Drive v3 implementation of the DocumentStore port.
// Only `files.copy` is needed: each new indicator gets its own copy of a
// template spreadsheet inside a shared folder.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::service_account::AccessTokenProvider;
use crate::core::indicators::{CopiedDocument, DocumentStore};
use crate::core::table::TableError;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

#[derive(Debug, Serialize)]
struct CopyRequest<'a> {
    name: &'a str,
    parents: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct CopyResponse {
    id: String,
}

pub struct GoogleDriveClient {
    client: Client,
    auth: Arc<dyn AccessTokenProvider>,
    base_url: String,
}

impl GoogleDriveClient {
    pub fn new(auth: Arc<dyn AccessTokenProvider>, timeout: Duration) -> Result<Self, TableError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TableError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth,
            base_url: DRIVE_FILES_URL.to_string(),
        })
    }

    fn copy_url(&self, template_id: &str) -> Result<Url, TableError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TableError::Transport(format!("Invalid Drive URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| TableError::Transport("Drive URL cannot be a base".to_string()))?
            .push(template_id)
            .push("copy");
        // Templates and folders often live in shared drives.
        url.query_pairs_mut()
            .append_pair("supportsAllDrives", "true")
            .append_pair("fields", "id");
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for GoogleDriveClient {
    async fn copy_template(
        &self,
        template_id: &str,
        name: &str,
        folder_id: &str,
    ) -> Result<CopiedDocument, TableError> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| TableError::Transport(format!("Google authentication failed: {}", e)))?;

        let response = self
            .client
            .post(self.copy_url(template_id)?)
            .bearer_auth(token)
            .json(&CopyRequest {
                name,
                parents: [folder_id],
            })
            .send()
            .await
            .map_err(|e| TableError::Transport(format!("Drive request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(TableError::Transport(format!(
                "Drive API error ({}): {}. \
                 Make sure the template and folder are shared with the service account.",
                status, text
            )));
        }

        let copied: CopyResponse = response
            .json()
            .await
            .map_err(|e| TableError::Transport(format!("Invalid Drive response: {}", e)))?;
        Ok(CopiedDocument { id: copied.id })
    }
}
