//! Rendering service HTTP client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use certcode_core::ArtifactRef;

use super::types::{RenderErrorResponse, RenderRequest, RenderResponse};
use super::{CertificateRenderer, RenderError, RenderJob};

/// Date format printed on certificates.
const CERTIFICATE_DATE_FORMAT: &str = "%m.%d.%Y";

/// Client for an external certificate rendering service.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRenderer {
    /// Create a new renderer client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Rendering service URL (e.g., `"http://renderer:8090"`)
    /// * `api_key` - Optional bearer token for the rendering service
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RenderError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request_body(job: &RenderJob) -> RenderRequest {
        RenderRequest {
            code: job.code.to_string(),
            category: job.category.clone(),
            name: job.name.clone(),
            email: job.email.clone(),
            redeemed_at: job.redeemed_at,
            date: job.redeemed_at.format(CERTIFICATE_DATE_FORMAT).to_string(),
            file_name: ArtifactRef::default_file_name(&job.code),
        }
    }

    /// Handle renderer response and convert errors.
    async fn handle_response(response: reqwest::Response) -> Result<RenderResponse, RenderError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<RenderErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {status}"),
        };

        Err(RenderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CertificateRenderer for HttpRenderer {
    async fn render(&self, job: &RenderJob) -> Result<ArtifactRef, RenderError> {
        let url = format!("{}/render", self.base_url);

        let mut request = self.client.post(&url).json(&Self::request_body(job));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await?;
        let rendered = Self::handle_response(response).await?;

        tracing::debug!(code = %job.code, file_name = %rendered.file_name, "Certificate rendered");

        Ok(ArtifactRef::from_file_name(&rendered.file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certcode_core::Code;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job() -> RenderJob {
        RenderJob {
            code: Code::parse("validcode123").unwrap(),
            category: "Kraftakt".into(),
            name: "John Doe".into(),
            email: "johndoe@example.com".into(),
            redeemed_at: Utc.with_ymd_and_hms(2024, 9, 11, 10, 0, 0).unwrap(),
        }
    }

    fn renderer(server: &MockServer, api_key: Option<&str>) -> HttpRenderer {
        HttpRenderer::new(
            server.uri(),
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn renderer_trims_trailing_slash() {
        let renderer =
            HttpRenderer::new("http://localhost:8090/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(renderer.base_url, "http://localhost:8090");
    }

    #[tokio::test]
    async fn render_posts_job_and_returns_artifact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render"))
            .and(header("Authorization", "Bearer render-key"))
            .and(body_partial_json(serde_json::json!({
                "code": "validcode123",
                "category": "Kraftakt",
                "name": "John Doe",
                "email": "johndoe@example.com",
                "redeemed_at": "2024-09-11T10:00:00Z",
                "date": "09.11.2024",
                "file_name": "validcode123.jpg"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "file_name": "validcode123.jpg" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let artifact = renderer(&server, Some("render-key"))
            .render(&job())
            .await
            .unwrap();

        assert_eq!(artifact.as_str(), "/certificates/validcode123.jpg");
    }

    #[tokio::test]
    async fn render_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({ "error": "template missing" })),
            )
            .mount(&server)
            .await;

        let err = renderer(&server, None).render(&job()).await.unwrap_err();

        match err {
            RenderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "template missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn render_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/render"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = renderer(&server, None).render(&job()).await.unwrap_err();

        assert!(matches!(err, RenderError::Api { status: 503, .. }));
    }
}
