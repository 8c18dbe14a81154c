//! # Claimstage HTTP gateway
//!
//! The networked [`ClaimGateway`] implementation. This crate owns every
//! transport concern (URLs, multipart encoding, timeouts, status handling)
//! and translates all of it into the gateway contract's error kinds, so the
//! reconciler in `claimstage-core` never sees a raw `reqwest` error.
//!
//! Endpoint shape (fixed by the backend):
//! - `GET /claim/{id}`: claim plus joined rows; see the wire module for
//!   how the heterogeneous row array is parsed.
//! - `DELETE /photos/{media_id}`: hard-deletes one media record.
//! - `PUT /claim/full_submission/{id}`: multipart combined update;
//!   additions only, no way to express a deletion.

pub mod config;
mod wire;

pub use config::{ConfigError, HttpConfig};

use claimstage_core::{Claim, ClaimGateway, ClaimMedia, GatewayError, UpdateRequest};
use claimstage_types::{ClaimId, MediaId};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

/// Networked claim gateway.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpGateway {
    /// Creates a gateway over the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` when the underlying client cannot
    /// be constructed (TLS backend initialization, essentially).
    pub fn new(config: HttpConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    /// The configuration this gateway was built with.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl ClaimGateway for HttpGateway {
    async fn fetch_claim(
        &self,
        id: &ClaimId,
    ) -> Result<(Claim, Vec<ClaimMedia>), GatewayError> {
        let url = format!("{}/claim/{}", self.config.base_url(), id);
        tracing::debug!(%url, "fetching claim");

        let response = self
            .client
            .get(&url)
            .timeout(self.config.read_timeout())
            .send()
            .await
            .map_err(map_transport)?;
        let response = require_success(response).await?;

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;
        wire::parse_claim_response(rows)
    }

    async fn delete_media(&self, id: &MediaId) -> Result<(), GatewayError> {
        let url = format!("{}/photos/{}", self.config.base_url(), id);
        tracing::debug!(%url, "deleting media");

        let response = self
            .client
            .delete(&url)
            .timeout(self.config.read_timeout())
            .send()
            .await
            .map_err(map_transport)?;
        require_success(response).await?;
        Ok(())
    }

    async fn update_claim(
        &self,
        id: &ClaimId,
        update: UpdateRequest,
    ) -> Result<(), GatewayError> {
        let url = format!("{}/claim/full_submission/{}", self.config.base_url(), id);
        tracing::debug!(%url, new_files = update.new_files.len(), "submitting combined update");

        let mut form = Form::new();
        if let Some(date) = update.date_of_incident {
            form = form.text("date_of_incident", date);
        }
        if let Some(time) = update.incident_time {
            form = form.text("incident_time", time.as_str().to_owned());
        }
        form = form
            .text("incident_location", update.incident_location)
            .text("description", update.description)
            .text("edited_by_user_id", update.editor.to_string());

        // Descriptions are transmitted as a parallel list: the i-th
        // new_descriptions part belongs to the i-th new_files part.
        let descriptions: Vec<String> = update
            .new_files
            .iter()
            .map(|file| file.description.clone())
            .collect();

        for file in update.new_files {
            let filename = wire::suggested_filename(id, &file.content_type);
            let part = Part::bytes(file.bytes.clone()).file_name(filename.clone());
            let part = match part.mime_str(&file.content_type) {
                Ok(part) => part,
                // An unparseable picker MIME type is not worth failing the
                // save over; send the bytes untyped.
                Err(_) => Part::bytes(file.bytes).file_name(filename),
            };
            form = form.part("new_files", part);
        }
        for description in descriptions {
            form = form.text("new_descriptions", description);
        }

        let response = self
            .client
            .put(&url)
            .multipart(form)
            .timeout(self.config.upload_timeout())
            .send()
            .await
            .map_err(map_transport)?;
        require_success(response).await?;
        Ok(())
    }
}

/// Maps a `reqwest` failure into the gateway contract's error kinds.
fn map_transport(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

/// Turns a non-success status into [`GatewayError::Rejected`], carrying
/// whatever detail the backend put in the body.
async fn require_success(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(GatewayError::Rejected {
        status: status.as_u16(),
        detail,
    })
}
