//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/certcode").
    pub data_dir: String,

    /// Directory rendered certificates are served from
    /// (default: "/data/certcode/certificates").
    pub certificates_dir: String,

    /// Public URL of the redemption page, used in issued code URLs.
    pub public_base_url: String,

    /// Admin API key for `/v1` endpoints.
    pub admin_api_key: Option<String>,

    /// Certificate renderer URL (default: `<http://localhost:8090>`).
    pub renderer_url: String,

    /// Bearer token for the renderer (optional).
    pub renderer_api_key: Option<String>,

    /// Upper bound on one certificate render, in seconds.
    pub render_timeout_seconds: u64,

    /// Maximum number of codes per issuance batch.
    pub max_batch_size: usize,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Secrets file structure.
#[derive(Debug, Default, Deserialize)]
struct CertcodeSecrets {
    #[serde(default)]
    admin_api_key: Option<String>,
    #[serde(default)]
    renderer_api_key: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secrets = load_secrets();

        Self {
            listen_addr: env_or("LISTEN_ADDR", defaults.listen_addr),
            data_dir: env_or("DATA_DIR", defaults.data_dir),
            certificates_dir: env_or("CERTIFICATES_DIR", defaults.certificates_dir),
            public_base_url: env_or("PUBLIC_BASE_URL", defaults.public_base_url),
            admin_api_key: secrets
                .admin_api_key
                .or_else(|| std::env::var("ADMIN_API_KEY").ok()),
            renderer_url: env_or("RENDERER_URL", defaults.renderer_url),
            renderer_api_key: secrets
                .renderer_api_key
                .or_else(|| std::env::var("RENDERER_API_KEY").ok()),
            render_timeout_seconds: env_parse_or(
                "RENDER_TIMEOUT_SECONDS",
                defaults.render_timeout_seconds,
            ),
            max_batch_size: env_parse_or("MAX_BATCH_SIZE", defaults.max_batch_size),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or(defaults.cors_origins),
            max_body_bytes: env_parse_or("MAX_BODY_BYTES", defaults.max_body_bytes),
            request_timeout_seconds: env_parse_or(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Load secrets from the first secrets file found, or nothing.
fn load_secrets() -> CertcodeSecrets {
    let secret_paths = [
        ".secrets/certcode.json",
        "certcode/.secrets/certcode.json",
        "../.secrets/certcode.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<CertcodeSecrets>(path) {
            tracing::info!(path = %path, "Loaded secrets from file");
            return secrets;
        }
    }

    tracing::debug!("Secrets file not found, using environment variables");
    CertcodeSecrets::default()
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<T, std::io::Error> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/certcode".into(),
            certificates_dir: "/data/certcode/certificates".into(),
            public_base_url: "http://localhost:8080".into(),
            admin_api_key: None,
            renderer_url: "http://localhost:8090".into(),
            renderer_api_key: None,
            render_timeout_seconds: 60,
            max_batch_size: 1000,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 90,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn render_timeout_fits_in_request_timeout() {
        let config = ServiceConfig::default();
        assert!(config.render_timeout_seconds < config.request_timeout_seconds);
    }

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            parse_origins("https://a.example.com, https://b.example.com ,"),
            vec!["https://a.example.com", "https://b.example.com"]
        );
    }

    #[test]
    fn secrets_file_fields_are_optional() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"admin_api_key": "admin-secret"}}"#).unwrap();

        let secrets: CertcodeSecrets = load_secrets_file(file.path()).unwrap();
        assert_eq!(secrets.admin_api_key.as_deref(), Some("admin-secret"));
        assert!(secrets.renderer_api_key.is_none());
    }

    #[test]
    fn missing_secrets_file_is_not_found() {
        let err = load_secrets_file::<CertcodeSecrets>("/nonexistent/certcode.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
