//! Signed upload credentials for direct-to-provider media uploads.
//!
//! The server hands out a signature over a fixed set of upload parameters
//! so a mobile client can upload straight to the media provider without
//! ever seeing the API secret. The client side of the exchange lives in
//! [`upload_requests`]:
//! - `request_signature(...)`
//! - `verify_signature(...)`

pub mod config;
pub mod error;
pub mod server;
pub mod upload;

use serde::{Deserialize, Serialize};

/// Body returned by GET /api/sign-upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUploadResponse {
    pub signature: String,
    pub timestamp: i64,
    pub cloud_name: String,
    pub api_key: String,
    pub use_filename: bool,
    pub unique_filename: bool,
    pub folder: String,
}

pub mod upload_requests {
    use super::SignUploadResponse;
    use apisign_lib::{Params, SignatureAlgorithm, verify_request};
    use reqwest::blocking::Client;
    use std::error::Error;

    /// Fetches a fresh upload signature via HTTP GET.
    ///
    /// # Example
    /// ```no_run
    /// # use sign_upload::upload_requests::request_signature;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let signed = request_signature("http://127.0.0.1:3000")?;
    /// println!("Upload to {} with {}", signed.folder, signed.signature);
    /// # Ok(()) }
    /// ```
    pub fn request_signature(server_addr: &str) -> Result<SignUploadResponse, Box<dyn Error>> {
        let url = format!("{}/api/sign-upload", server_addr);
        let client = Client::new();
        let resp = client.get(&url).send()?;
        if !resp.status().is_success() {
            return Err(format!("Server returned error: {}", resp.status()).into());
        }
        let signed: SignUploadResponse = resp.json()?;
        Ok(signed)
    }

    /// Verifies that `signed.signature` matches the parameters echoed in the
    /// response, using the API secret the server signed with.
    ///
    /// # Example
    /// ```no_run
    /// # use apisign_lib::SignatureAlgorithm;
    /// # use sign_upload::upload_requests::{request_signature, verify_signature};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let signed = request_signature("http://127.0.0.1:3000")?;
    /// assert!(verify_signature(&signed, "my-secret", SignatureAlgorithm::Sha1));
    /// # Ok(()) }
    /// ```
    pub fn verify_signature(
        signed: &SignUploadResponse,
        api_secret: &str,
        algorithm: SignatureAlgorithm,
    ) -> bool {
        let mut params = Params::new();
        params
            .insert("timestamp", signed.timestamp)
            .insert("use_filename", signed.use_filename)
            .insert("unique_filename", signed.unique_filename)
            .insert("folder", signed.folder.as_str());
        verify_request(&params, api_secret, algorithm, &signed.signature)
    }
}
