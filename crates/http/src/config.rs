//! Gateway configuration.
//!
//! The backend base URL and the media bucket URL were once module-level
//! constants; here they are explicit configuration resolved at startup and
//! passed into the gateway at construction time, so two gateways against
//! different environments can coexist in one process and tests never depend
//! on process-wide state.

use std::time::Duration;

/// Default deadline for plain reads and deletions.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Default deadline for the multipart update. Materially longer than the
/// read timeout because upload payloads are larger and variable.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised while constructing an [`HttpConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("base URL cannot be empty")]
    EmptyBaseUrl,
    #[error("media bucket URL cannot be empty")]
    EmptyMediaBucketUrl,
    #[error("upload timeout ({upload:?}) must exceed the read timeout ({read:?})")]
    UploadTimeoutTooShort { upload: Duration, read: Duration },
}

/// Configuration for the networked gateway, resolved once at startup.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    base_url: String,
    media_bucket_url: String,
    read_timeout: Duration,
    upload_timeout: Duration,
}

impl HttpConfig {
    /// Creates a configuration with the default timeouts.
    ///
    /// Trailing slashes on both URLs are trimmed so path joining stays
    /// uniform.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when either URL is empty.
    pub fn new(
        base_url: impl Into<String>,
        media_bucket_url: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        let media_bucket_url = media_bucket_url
            .into()
            .trim()
            .trim_end_matches('/')
            .to_owned();
        if media_bucket_url.is_empty() {
            return Err(ConfigError::EmptyMediaBucketUrl);
        }

        Ok(Self {
            base_url,
            media_bucket_url,
            read_timeout: DEFAULT_READ_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        })
    }

    /// Replaces both timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UploadTimeoutTooShort` unless the upload
    /// timeout strictly exceeds the read timeout.
    pub fn with_timeouts(
        mut self,
        read_timeout: Duration,
        upload_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if upload_timeout <= read_timeout {
            return Err(ConfigError::UploadTimeoutTooShort {
                upload: upload_timeout,
                read: read_timeout,
            });
        }
        self.read_timeout = read_timeout;
        self.upload_timeout = upload_timeout;
        Ok(self)
    }

    /// The backend base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The public media bucket base URL, without a trailing slash. Passed to
    /// [`claimstage_core::resolve_media_url`] by the presentation layer.
    pub fn media_bucket_url(&self) -> &str {
        &self.media_bucket_url
    }

    /// Deadline for plain reads and deletions.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Deadline for the multipart update.
    pub fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }
}
