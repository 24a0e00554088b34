use sign_upload::config::{AppConfig, load_dotenv};
use sign_upload::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging to stdout, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match load_dotenv() {
        Ok(Some(path)) => tracing::info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            tracing::info!(
                "Loaded configuration (port {}, {} signatures)",
                config.port,
                config.signature_algorithm
            );
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        tracing::warn!(
            "Missing {}; signing requests will fail until they are set",
            missing.join(", ")
        );
    }

    server::run_server(config).await.unwrap_or_else(|err| {
        tracing::error!("Server error: {}", err);
    });
}
