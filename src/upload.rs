//! Upload parameters handed out to the mobile client.
//!
//! The client has to submit exactly these values alongside the signature,
//! otherwise the provider rejects the upload.

use apisign_lib::{Params, SignatureAlgorithm, api_sign_request};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::SignUploadResponse;
use crate::config::AppConfig;
use crate::error::ApiError;

/// Destination folder for every upload.
pub const UPLOAD_FOLDER: &str = "flutter_uploads";

/// The fixed parameter set that gets signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadParams {
    pub timestamp: i64,
    /// Keep the original file name as the public id
    pub use_filename: bool,
    /// Don't append random characters to the public id
    pub unique_filename: bool,
    pub folder: &'static str,
}

impl UploadParams {
    pub fn at(timestamp: i64) -> Self {
        Self {
            timestamp,
            use_filename: true,
            unique_filename: false,
            folder: UPLOAD_FOLDER,
        }
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .insert("timestamp", self.timestamp)
            .insert("use_filename", self.use_filename)
            .insert("unique_filename", self.unique_filename)
            .insert("folder", self.folder);
        params
    }

    pub fn sign(&self, api_secret: &str, algorithm: SignatureAlgorithm) -> String {
        api_sign_request(&self.to_params(), api_secret, algorithm)
    }
}

/// Unix seconds for `now`, rounded to the nearest second.
pub fn unix_timestamp(now: DateTime<Utc>) -> Result<i64, ApiError> {
    let millis = now.timestamp_millis();
    if millis < 0 {
        return Err(ApiError::Clock(format!(
            "{} is before the Unix epoch",
            now.to_rfc3339()
        )));
    }
    Ok((millis + 500) / 1000)
}

/// Build the signed response for a request received at `now`.
pub fn sign_upload_at(
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<SignUploadResponse, ApiError> {
    let credentials = config.credentials()?;
    let params = UploadParams::at(unix_timestamp(now)?);
    let signature = params.sign(credentials.api_secret, config.signature_algorithm);

    info!(
        "{} Signed upload params: timestamp={} folder={}",
        now.to_rfc3339(),
        params.timestamp,
        params.folder
    );

    Ok(SignUploadResponse {
        signature,
        timestamp: params.timestamp,
        cloud_name: credentials.cloud_name.to_string(),
        api_key: credentials.api_key.to_string(),
        use_filename: params.use_filename,
        unique_filename: params.unique_filename,
        folder: params.folder.to_string(),
    })
}
