//! Minimal HTTP client for a row-oriented spreadsheet REST gateway.
//!
//! The gateway exposes token login, spreadsheet lookup by title, worksheet
//! listing and a row-append endpoint. Errors are split so callers can tell
//! stale credentials from transport trouble.

use super::RowAppender;
use crate::error::SheetError;
use crate::reading::{Reading, TIMESTAMP_FORMAT};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;

#[derive(Clone)]
pub struct SheetClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct SpreadsheetList {
    spreadsheets: Vec<SpreadsheetInfo>,
}

#[derive(Deserialize)]
struct SpreadsheetInfo {
    id: String,
    title: String,
}

#[derive(Deserialize)]
struct WorksheetList {
    worksheets: Vec<WorksheetInfo>,
}

#[derive(Deserialize)]
struct WorksheetInfo {
    id: String,
}

impl SheetClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Authenticate and return a session for spreadsheet lookups.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SheetError> {
        let response = self
            .http
            .post(format!("{}/sessions", self.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(SheetError::Auth(format!("login rejected for {email}")));
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| SheetError::MalformedResponse(e.to_string()))?;
        Ok(Session {
            client: self.clone(),
            token: body.token,
        })
    }
}

/// Authenticated session.
pub struct Session {
    client: SheetClient,
    token: String,
}

impl Session {
    /// Look up a spreadsheet by title.
    pub async fn open(&self, title: &str) -> Result<Spreadsheet, SheetError> {
        let response = self
            .client
            .http
            .get(format!("{}/spreadsheets", self.client.base_url))
            .bearer_auth(&self.token)
            .query(&[("title", title)])
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: SpreadsheetList = response
            .json()
            .await
            .map_err(|e| SheetError::MalformedResponse(e.to_string()))?;
        let info = body
            .spreadsheets
            .into_iter()
            .find(|s| s.title == title)
            .ok_or_else(|| SheetError::Api {
                status: 404,
                message: format!("no spreadsheet titled {title}"),
            })?;

        Ok(Spreadsheet {
            client: self.client.clone(),
            token: self.token.clone(),
            id: info.id,
        })
    }
}

pub struct Spreadsheet {
    client: SheetClient,
    token: String,
    id: String,
}

impl Spreadsheet {
    /// The first worksheet, which is where rows get appended.
    pub async fn first_worksheet(&self) -> Result<Worksheet, SheetError> {
        let response = self
            .client
            .http
            .get(format!(
                "{}/spreadsheets/{}/worksheets",
                self.client.base_url, self.id
            ))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: WorksheetList = response
            .json()
            .await
            .map_err(|e| SheetError::MalformedResponse(e.to_string()))?;
        let first = body.worksheets.into_iter().next().ok_or_else(|| {
            SheetError::MalformedResponse("spreadsheet has no worksheets".to_string())
        })?;

        Ok(Worksheet {
            client: self.client.clone(),
            token: self.token.clone(),
            worksheet_id: first.id,
        })
    }
}

/// Append target for reading rows.
pub struct Worksheet {
    client: SheetClient,
    token: String,
    worksheet_id: String,
}

impl Worksheet {
    /// Append one reading as a `[timestamp, temperature, humidity]` row.
    pub async fn append_row(&self, reading: &Reading) -> Result<(), SheetError> {
        let response = self
            .client
            .http
            .post(format!(
                "{}/worksheets/{}/rows",
                self.client.base_url, self.worksheet_id
            ))
            .bearer_auth(&self.token)
            .json(&json!({ "values": row_values(reading) }))
            .send()
            .await?;
        check_status(response).await?;

        debug!("appended row to worksheet {}", self.worksheet_id);
        Ok(())
    }
}

#[async_trait]
impl RowAppender for Worksheet {
    async fn append(&self, reading: &Reading) -> Result<(), SheetError> {
        self.append_row(reading).await
    }
}

/// Row layout: timestamp, temperature, humidity.
fn row_values(reading: &Reading) -> Vec<serde_json::Value> {
    vec![
        json!(reading.timestamp.format(TIMESTAMP_FORMAT).to_string()),
        json!(reading.temperature),
        json!(reading.humidity),
    ]
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        Err(SheetError::Auth(format!(
            "request rejected with status {status}"
        )))
    } else if !status.is_success() {
        Err(api_error(response).await)
    } else {
        Ok(response)
    }
}

async fn api_error(response: reqwest::Response) -> SheetError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    SheetError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_row_layout() {
        let reading = Reading {
            timestamp: NaiveDateTime::parse_from_str("2024-01-01T00:00:00", TIMESTAMP_FORMAT)
                .unwrap(),
            temperature: 21.5,
            humidity: 48.2,
        };

        let values = row_values(&reading);
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], json!("2024-01-01T00:00:00"));
        assert_eq!(values[1], json!(21.5_f32));
        assert_eq!(values[2], json!(48.2_f32));
    }
}
