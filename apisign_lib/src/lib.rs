//! Wrapper crate for the media provider's request signing scheme.
//!
//! Upload parameters are canonicalised as `key=value` pairs sorted by key and
//! joined with `&`, the API secret is appended, and the whole string is
//! hashed. The hex digest is the signature the provider expects next to the
//! upload form.

use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Keys the provider never includes in the signed string.
pub const EXCLUDED_KEYS: [&str; 4] = ["file", "cloud_name", "resource_type", "api_key"];

/// Digest used to produce the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported signature algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for SignatureAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => f.write_str("sha1"),
            Self::Sha256 => f.write_str("sha256"),
        }
    }
}

/// A single parameter value as the provider renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Empty strings and empty lists are treated as absent and left out of
    /// the signed string.
    pub fn is_present(&self) -> bool {
        match self {
            ParamValue::Str(s) => !s.is_empty(),
            ParamValue::List(items) => !items.is_empty(),
            ParamValue::Int(_) | ParamValue::Bool(_) => true,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

/// Parameters to sign, kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Canonical string the signature is computed over, without the secret.
    pub fn to_sign_string(&self) -> String {
        self.entries
            .iter()
            .filter(|(key, value)| !EXCLUDED_KEYS.contains(&key.as_str()) && value.is_present())
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Sign `params` with `api_secret`, returning the lowercase hex digest.
pub fn api_sign_request(params: &Params, api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut payload = params.to_sign_string();
    payload.push_str(api_secret);
    match algorithm {
        SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
    }
}

/// Check a hex signature against the one `params` and `api_secret` produce.
pub fn verify_request(
    params: &Params,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
    signature: &str,
) -> bool {
    let provided = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let expected = match hex::decode(api_sign_request(params, api_secret, algorithm)) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    provided == expected
}
