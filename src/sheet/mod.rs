//! Spreadsheet sink: an authenticated, appendable row-oriented table.
//!
//! The sampling loop depends only on the two traits here. A session is the
//! product of the full login chain (authenticate, open the configured
//! spreadsheet, take its first worksheet); the loop drops it on any append
//! error and re-runs the chain on a later cycle.

mod client;

pub use client::{Session, SheetClient, Spreadsheet, Worksheet};

use crate::config::SheetConfig;
use crate::error::SheetError;
use crate::reading::Reading;
use async_trait::async_trait;

/// An established sink session that can append reading rows.
#[async_trait]
pub trait RowAppender: Send + Sync {
    async fn append(&self, reading: &Reading) -> Result<(), SheetError>;
}

/// Establishes sink sessions.
#[async_trait]
pub trait SheetConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RowAppender>, SheetError>;
}

/// [`SheetConnector`] backed by the HTTP client and static configuration.
pub struct ConfiguredSheetConnector {
    client: SheetClient,
    email: String,
    password: String,
    spreadsheet_name: String,
}

impl ConfiguredSheetConnector {
    pub fn new(config: &SheetConfig) -> Self {
        Self {
            client: SheetClient::new(&config.api_base),
            email: config.email.clone(),
            password: config.password.clone(),
            spreadsheet_name: config.spreadsheet_name.clone(),
        }
    }
}

#[async_trait]
impl SheetConnector for ConfiguredSheetConnector {
    async fn connect(&self) -> Result<Box<dyn RowAppender>, SheetError> {
        let session = self.client.login(&self.email, &self.password).await?;
        let worksheet = session
            .open(&self.spreadsheet_name)
            .await?
            .first_worksheet()
            .await?;
        Ok(Box::new(worksheet))
    }
}
