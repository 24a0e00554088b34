use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use apisign_lib::SignatureAlgorithm;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::error::ApiError;

pub const DEFAULT_PORT: u16 = 3000;
pub const CONFIG_PATH_ENV: &str = "SIGN_UPLOAD_CONFIG";

pub const CLOUD_NAME_ENV: &str = "CLOUDINARY_CLOUD_NAME";
pub const API_KEY_ENV: &str = "CLOUDINARY_API_KEY";
pub const API_SECRET_ENV: &str = "CLOUDINARY_API_SECRET";
pub const CLOUDINARY_URL_ENV: &str = "CLOUDINARY_URL";
pub const SIGNATURE_ALGORITHM_ENV: &str = "CLOUDINARY_SIGNATURE_ALGORITHM";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error(transparent)]
    InvalidAlgorithm(#[from] apisign_lib::UnknownAlgorithm),
    #[error("invalid CLOUDINARY_URL: {0}")]
    InvalidCloudinaryUrl(String),
}

/// Optional on-disk settings. Every field may be overridden from the
/// environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub port: Option<u16>,
    pub signature_algorithm: Option<String>,
}

/// Settings the server runs with, loaded once at startup and shared
/// read-only with every request.
///
/// Credentials are optional here: the server still starts without them and
/// answers each signing request with a server error instead.
#[derive(Debug)]
pub struct AppConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<SecretString>,
    pub port: u16,
    pub signature_algorithm: SignatureAlgorithm,
}

/// Borrowed view of a complete set of credentials.
pub struct Credentials<'a> {
    pub cloud_name: &'a str,
    pub api_key: &'a str,
    pub api_secret: &'a str,
}

/// `cloudinary://<api_key>:<api_secret>@<cloud_name>`
struct CloudinaryUrl {
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
}

fn parse_cloudinary_url(raw: &str) -> Result<CloudinaryUrl, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidCloudinaryUrl(e.to_string()))?;
    if url.scheme() != "cloudinary" {
        return Err(ConfigError::InvalidCloudinaryUrl(format!(
            "unexpected scheme {:?}",
            url.scheme()
        )));
    }
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    Ok(CloudinaryUrl {
        cloud_name: url.host_str().and_then(non_empty),
        api_key: non_empty(url.username()),
        api_secret: url.password().and_then(non_empty),
    })
}

/// Read and parse a TOML config file.
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Export variables from a `.env` file in the working directory (or a
/// parent) into the process environment. Variables that are already set
/// keep their value. Returns the file that was loaded, if any.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Parse a `.env` file without touching the process environment.
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// `<config dir>/sign-upload/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sign-upload").join("config.toml"))
}

impl AppConfig {
    /// Merge file settings with environment lookups. Individual variables
    /// win over `CLOUDINARY_URL`, which wins over the file.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let from_url = lookup(CLOUDINARY_URL_ENV)
            .map(|raw| parse_cloudinary_url(&raw))
            .transpose()?;
        let (url_cloud, url_key, url_secret) = match from_url {
            Some(u) => (u.cloud_name, u.api_key, u.api_secret),
            None => (None, None, None),
        };

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let signature_algorithm = lookup(SIGNATURE_ALGORITHM_ENV)
            .or(file.signature_algorithm)
            .map(|raw| raw.parse::<SignatureAlgorithm>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            cloud_name: lookup(CLOUD_NAME_ENV).or(url_cloud).or(file.cloud_name),
            api_key: lookup(API_KEY_ENV).or(url_key).or(file.api_key),
            api_secret: lookup(API_SECRET_ENV)
                .or(url_secret)
                .or(file.api_secret)
                .map(SecretString::from),
            port,
            signature_algorithm,
        })
    }

    /// Load from the process environment plus the optional config file.
    ///
    /// The file named by `SIGN_UPLOAD_CONFIG` must exist; the default path is
    /// only read when present.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => load_file(Path::new(&path))?,
            Err(_) => match default_config_path() {
                Some(path) if path.exists() => load_file(&path)?,
                _ => FileConfig::default(),
            },
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// All three credentials, or the name of the first one missing.
    pub fn credentials(&self) -> Result<Credentials<'_>, ApiError> {
        let cloud_name = self
            .cloud_name
            .as_deref()
            .ok_or(ApiError::MissingConfig(CLOUD_NAME_ENV))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ApiError::MissingConfig(API_KEY_ENV))?;
        let api_secret = self
            .api_secret
            .as_ref()
            .map(|s| s.expose_secret())
            .ok_or(ApiError::MissingConfig(API_SECRET_ENV))?;
        Ok(Credentials {
            cloud_name,
            api_key,
            api_secret,
        })
    }

    /// Names of the credential variables that are not set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.cloud_name.is_none() {
            missing.push(CLOUD_NAME_ENV);
        }
        if self.api_key.is_none() {
            missing.push(API_KEY_ENV);
        }
        if self.api_secret.is_none() {
            missing.push(API_SECRET_ENV);
        }
        missing
    }
}
