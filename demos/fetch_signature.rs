//! Fetch an upload signature from a running server and check it locally.
//!
//! Needs the same secret the server signs with:
//! `CLOUDINARY_API_SECRET=... cargo run --example fetch-signature`

use apisign_lib::SignatureAlgorithm;
use sign_upload::upload_requests::{request_signature, verify_signature};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server = std::env::var("SIGN_UPLOAD_SERVER")
        .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());

    // 1) Ask the server for signed upload params
    let signed = request_signature(&server)?;
    println!(
        "Signed: cloud={}, api_key={}, timestamp={}, folder={}, signature={}",
        signed.cloud_name, signed.api_key, signed.timestamp, signed.folder, signed.signature
    );

    // 2) Verify against the shared secret, if we have it
    match std::env::var("CLOUDINARY_API_SECRET") {
        Ok(secret) => {
            let is_valid = verify_signature(&signed, &secret, SignatureAlgorithm::default());
            println!("Signature valid? {}", is_valid);
        }
        Err(_) => println!("CLOUDINARY_API_SECRET not set, skipping verification"),
    }

    Ok(())
}
