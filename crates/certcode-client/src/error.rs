//! Client error types.

/// Errors that can occur when using the certcode client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The code is unknown or has already been used.
    #[error("invalid or used code")]
    InvalidOrUsedCode,

    /// The request was missing a field or malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The code was redeemed but the certificate could not be rendered.
    /// Retry with [`crate::CertcodeClient::retry_render`].
    #[error("certificate rendering failed")]
    RenderingFailed,

    /// Missing or rejected admin key.
    #[error("unauthorized")]
    Unauthorized,

    /// Server returned another error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
