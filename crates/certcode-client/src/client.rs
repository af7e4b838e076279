//! Certcode HTTP client implementation.

use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, Certificate, CodeStats, IssueCodesRequest, IssueCodesResponse, IssuedCode,
    MessageResponse, RecoveryReport, RedeemRequest, RetryRequest,
};

/// Certcode API client.
///
/// Recipient methods need no credentials. Admin methods need an admin key
/// set through [`ClientOptions`].
#[derive(Debug, Clone)]
pub struct CertcodeClient {
    client: Client,
    base_url: String,
    admin_api_key: Option<String>,
}

impl CertcodeClient {
    /// Create a new certcode client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the certcode service (e.g., `"http://certcode:8080"`)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new certcode client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_api_key: options.admin_api_key,
        })
    }

    /// Check whether a code can still be redeemed.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidOrUsedCode` for unknown or used codes.
    pub async fn validate(&self, code: &str) -> Result<MessageResponse, ClientError> {
        let url = format!("{}/certificate", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("code", code)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Redeem a code and have its certificate generated.
    ///
    /// # Errors
    ///
    /// - `ClientError::InvalidRequest` if a field is empty.
    /// - `ClientError::InvalidOrUsedCode` for unknown or used codes.
    /// - `ClientError::RenderingFailed` if the code was consumed but the
    ///   certificate is not ready; call [`Self::retry_render`].
    pub async fn redeem(
        &self,
        code: &str,
        name: &str,
        email: &str,
    ) -> Result<Certificate, ClientError> {
        let url = format!("{}/certificate", self.base_url);
        let request = RedeemRequest {
            code: code.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        };

        tracing::debug!(code = %code, "Redeeming code");

        let response = self.client.post(&url).json(&request).send().await?;

        self.handle_response(response).await
    }

    /// Render the certificate of an already redeemed code again.
    ///
    /// # Errors
    ///
    /// Same as [`Self::redeem`]; a mismatching email is reported as
    /// `ClientError::InvalidOrUsedCode`.
    pub async fn retry_render(&self, code: &str, email: &str) -> Result<Certificate, ClientError> {
        let url = format!("{}/certificate/retry", self.base_url);
        let request = RetryRequest {
            code: code.to_string(),
            email: email.to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        self.handle_response(response).await
    }

    /// Issue a batch of codes (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if no admin key is configured, the key is rejected,
    /// or the count or category is invalid.
    pub async fn issue_codes(
        &self,
        count: u32,
        category: &str,
        tags: &[String],
    ) -> Result<Vec<IssuedCode>, ClientError> {
        let url = format!("{}/v1/codes", self.base_url);
        let request = IssueCodesRequest {
            count,
            category: category.to_string(),
            tags: tags.to_vec(),
        };

        let response = self.admin(self.client.post(&url))?.json(&request).send().await?;

        let issued: IssueCodesResponse = self.handle_response(response).await?;
        Ok(issued.codes)
    }

    /// Code counts, overall and per category (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if no admin key is configured or the key is rejected.
    pub async fn stats(&self) -> Result<CodeStats, ClientError> {
        let url = format!("{}/v1/codes/stats", self.base_url);

        let response = self.admin(self.client.get(&url))?.send().await?;

        self.handle_response(response).await
    }

    /// Render redeemed codes whose certificate is still pending (admin).
    ///
    /// `limit` caps how many are rendered in this run; `None` leaves the
    /// cap to the service.
    ///
    /// # Errors
    ///
    /// Returns an error if no admin key is configured or the key is rejected.
    pub async fn recover_pending(
        &self,
        limit: Option<usize>,
    ) -> Result<RecoveryReport, ClientError> {
        let url = format!("{}/v1/codes/recover", self.base_url);

        let mut request = self.admin(self.client.post(&url))?;
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Absolute URL of a generated certificate.
    #[must_use]
    pub fn certificate_url(&self, certificate: &Certificate) -> String {
        format!("{}{}", self.base_url, certificate.jpeg_url)
    }

    fn admin(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let key = self
            .admin_api_key
            .as_ref()
            .ok_or_else(|| ClientError::Configuration("admin API key not set".into()))?;
        Ok(request.header("x-admin-key", key))
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ApiErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {status}"),
        };

        match status {
            StatusCode::NOT_FOUND => Err(ClientError::InvalidOrUsedCode),
            StatusCode::BAD_REQUEST => Err(ClientError::InvalidRequest(message)),
            StatusCode::BAD_GATEWAY => Err(ClientError::RenderingFailed),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            _ => Err(ClientError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 120, above the service's own
    /// request timeout so slow renders surface as server errors).
    pub timeout_seconds: u64,
    /// Admin API key for `/v1` endpoints.
    pub admin_api_key: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            admin_api_key: None,
        }
    }
}

impl ClientOptions {
    /// Create options with an admin key.
    #[must_use]
    pub fn with_admin_key(key: impl Into<String>) -> Self {
        Self {
            admin_api_key: Some(key.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn error(status: u16, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_json(json!({ "error": message }))
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = CertcodeClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn certificate_url_is_absolute() {
        let client = CertcodeClient::new("https://certs.example.com").unwrap();
        let certificate = Certificate {
            message: String::new(),
            jpeg_url: "/certificates/abc.jpg".into(),
        };
        assert_eq!(
            client.certificate_url(&certificate),
            "https://certs.example.com/certificates/abc.jpg"
        );
    }

    #[tokio::test]
    async fn validate_sends_code_as_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certificate"))
            .and(query_param("code", "validcode123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "message": "Code valid. Please submit your details." })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CertcodeClient::new(server.uri()).unwrap();
        let response = client.validate("validcode123").await.unwrap();

        assert_eq!(response.message, "Code valid. Please submit your details.");
    }

    #[tokio::test]
    async fn used_code_maps_to_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certificate"))
            .respond_with(error(404, "Invalid or used code"))
            .mount(&server)
            .await;

        let client = CertcodeClient::new(server.uri()).unwrap();
        let err = client.validate("invalidcode456").await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidOrUsedCode));
    }

    #[tokio::test]
    async fn redeem_returns_certificate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/certificate"))
            .and(body_json(json!({
                "code": "validcode123",
                "name": "John Doe",
                "email": "johndoe@example.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Certificate generated successfully!",
                "jpeg_url": "/certificates/validcode123.jpg"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CertcodeClient::new(server.uri()).unwrap();
        let certificate = client
            .redeem("validcode123", "John Doe", "johndoe@example.com")
            .await
            .unwrap();

        assert_eq!(certificate.jpeg_url, "/certificates/validcode123.jpg");
    }

    #[tokio::test]
    async fn redeem_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/certificate"))
            .respond_with(error(400, "Invalid request"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/certificate/retry"))
            .respond_with(error(502, "Certificate rendering failed"))
            .mount(&server)
            .await;

        let client = CertcodeClient::new(server.uri()).unwrap();

        let err = client.redeem("validcode123", "John Doe", "").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(ref m) if m == "Invalid request"));

        let err = client
            .retry_render("validcode123", "johndoe@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RenderingFailed));
    }

    #[tokio::test]
    async fn issue_codes_sends_admin_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/codes"))
            .and(header("x-admin-key", "admin-key"))
            .and(body_json(json!({ "count": 2, "type": "Kraftakt" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "codes": [
                    { "code": "a1", "url": "https://certs.example.com/?code=a1" },
                    { "code": "b2", "url": "https://certs.example.com/?code=b2" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            CertcodeClient::with_options(server.uri(), ClientOptions::with_admin_key("admin-key"))
                .unwrap();
        let codes = client.issue_codes(2, "Kraftakt", &[]).await.unwrap();

        assert_eq!(codes.len(), 2);
        assert_eq!(codes[1].code, "b2");
    }

    #[tokio::test]
    async fn admin_calls_require_key() {
        let client = CertcodeClient::new("http://localhost:1").unwrap();

        let err = client.stats().await.unwrap_err();

        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[tokio::test]
    async fn rejected_admin_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/codes/stats"))
            .respond_with(error(401, "Unauthorized"))
            .mount(&server)
            .await;

        let client =
            CertcodeClient::with_options(server.uri(), ClientOptions::with_admin_key("wrong"))
                .unwrap();

        assert!(matches!(
            client.stats().await.unwrap_err(),
            ClientError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn stats_are_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/codes/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 4,
                "unused": 3,
                "by_type": { "Kraftakt": { "total": 4, "unused": 3 } }
            })))
            .mount(&server)
            .await;

        let client =
            CertcodeClient::with_options(server.uri(), ClientOptions::with_admin_key("admin-key"))
                .unwrap();
        let stats = client.stats().await.unwrap();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_type["Kraftakt"].unused, 3);
    }

    #[tokio::test]
    async fn recover_pending_passes_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/codes/recover"))
            .and(query_param("limit", "5"))
            .and(header("x-admin-key", "admin-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "rendered": 2, "failed": 1 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client =
            CertcodeClient::with_options(server.uri(), ClientOptions::with_admin_key("admin-key"))
                .unwrap();
        let report = client.recover_pending(Some(5)).await.unwrap();

        assert_eq!(report, RecoveryReport { rendered: 2, failed: 1 });
    }
}
