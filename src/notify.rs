// src/notify.rs

use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Hook answered HTTP {status}: {body}")]
    ApiError { status: u16, body: String },
}

/// Side effect fired once after rows were written.
pub trait RunHook {
    fn notify(&self) -> Result<(), NotificationError>;
}

/// Pings the downstream job that builds image previews for new rows.
pub struct PreviewTrigger {
    endpoint: String,
    client: Client,
}

impl PreviewTrigger {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::RequestFailed(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

impl RunHook for PreviewTrigger {
    fn notify(&self) -> Result<(), NotificationError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .send()
            .map_err(|e| NotificationError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NotificationError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
