// Runtime configuration, read from the environment (after `.env` is loaded).
// Credentials are not part of this struct; see
// `infra::google::service_account` for how those are found.

use chrono::Datelike;
use std::time::Duration;
use thiserror::Error;

use crate::core::indicators::indicator_models::FIRST_PERIOD;
use crate::core::indicators::IndicatorConfig;
use crate::infra::google::SheetsSettings;

const LAST_PERIOD: u16 = FIRST_PERIOD + 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub spreadsheet_id: String,
    pub range: String,
    pub value_input_option: String,
    pub indicators_table: String,
    pub drive_folder_id: String,
    pub drive_template_id: Option<String>,
    pub current_period: u16,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any name → value lookup. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = match get("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            None => 3001,
        };

        // RAW keeps client text literal, so `=...` is never evaluated.
        let value_input_option = get("SHEETS_VALUE_INPUT_OPTION")
            .unwrap_or_else(|| "RAW".to_string())
            .to_uppercase();
        if value_input_option != "RAW" && value_input_option != "USER_ENTERED" {
            return Err(ConfigError::Invalid {
                name: "SHEETS_VALUE_INPUT_OPTION",
                value: value_input_option,
            });
        }

        let current_period = match get("CURRENT_PERIOD") {
            Some(value) => match value.trim().parse::<u16>() {
                Ok(year) if (FIRST_PERIOD..=LAST_PERIOD).contains(&year) => year,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "CURRENT_PERIOD",
                        value,
                    })
                }
            },
            None => {
                let year = chrono::Utc::now().year().clamp(FIRST_PERIOD as i32, LAST_PERIOD as i32);
                year as u16
            }
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "HTTP_TIMEOUT_SECS",
                    value,
                })?,
            None => Duration::from_secs(30),
        };

        Ok(Self {
            port,
            spreadsheet_id: required("SPREADSHEET_ID")?,
            range: get("SHEETS_RANGE").unwrap_or_else(|| "A1:Z1000".to_string()),
            value_input_option,
            indicators_table: get("INDICATORS_SHEET").unwrap_or_else(|| "Indicadores".to_string()),
            drive_folder_id: required("DRIVE_FOLDER_ID")?,
            drive_template_id: get("DRIVE_TEMPLATE_ID"),
            current_period,
            http_timeout,
        })
    }

    pub fn sheets_settings(&self) -> SheetsSettings {
        SheetsSettings {
            spreadsheet_id: self.spreadsheet_id.clone(),
            range: self.range.clone(),
            value_input_option: self.value_input_option.clone(),
            timeout: self.http_timeout,
        }
    }

    pub fn indicator_config(&self) -> IndicatorConfig {
        IndicatorConfig {
            table: self.indicators_table.clone(),
            folder_id: self.drive_folder_id.clone(),
            default_template_id: self.drive_template_id.clone(),
            current_period: self.current_period,
        }
    }
}
