use super::{TranslationProvider, TranslationRequest, TranslationResult};
use crate::error::{DispatchError, Result};
use crate::i18n::{Language, LanguageCatalog};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Request body for `POST {base}/translate`
#[derive(Debug, Serialize)]
struct RemoteTranslateRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

/// Response body for both endpoints; either the payload or `error` is present
#[derive(Debug, Deserialize)]
struct RemoteTranslateResponse {
    translated_text: Option<String>,
    error: Option<RemoteError>,
}

#[derive(Debug, Serialize)]
struct RemoteDetectRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemoteDetectResponse {
    language: Option<String>,
    error: Option<RemoteError>,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    code: String,
    #[serde(default)]
    message: String,
}

/// Provider backed by an external translation service speaking JSON over HTTP.
pub struct RemoteProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    catalog: Arc<LanguageCatalog>,
}

impl RemoteProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            catalog: Arc::new(LanguageCatalog::global().clone()),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies)
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<LanguageCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(format!("{}/{}", self.base_url, endpoint))
            .header("Content-Type", "application/json");
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

/// Retry 429 (rate limit) and 5xx errors; other 4xx client errors are permanent
fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Error codes in a 2xx body that describe a transient upstream condition
fn is_retryable_code(code: &str) -> bool {
    matches!(code, "rate_limited" | "unavailable" | "timeout")
}

#[async_trait]
impl TranslationProvider for RemoteProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        if request.text.trim().is_empty() {
            return TranslationResult::permanent("text is empty");
        }

        let body = RemoteTranslateRequest {
            text: &request.text,
            source_lang: request.source.code(),
            target_lang: request.target.code(),
        };

        let response = match self.post("translate").json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                return TranslationResult::transient(format!(
                    "Failed to send translation request: {}",
                    e
                ))
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            let reason = format!("Translation API error ({}): {}", status, body);
            debug!("{} -> {}: {}", request.source.code(), request.target.code(), reason);
            return TranslationResult::Failure {
                reason,
                retryable: is_retryable_status(status.as_u16()),
            };
        }

        let parsed: RemoteTranslateResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                return TranslationResult::transient(format!(
                    "Failed to parse translation response: {}",
                    e
                ))
            }
        };

        match (parsed.translated_text, parsed.error) {
            (_, Some(error)) => {
                warn!(
                    "Translation API rejected {} -> {}: {} {}",
                    request.source.code(),
                    request.target.code(),
                    error.code,
                    error.message
                );
                TranslationResult::Failure {
                    retryable: is_retryable_code(&error.code),
                    reason: format!("{}: {}", error.code, error.message),
                }
            }
            (Some(text), None) => TranslationResult::success(text),
            (None, None) => {
                TranslationResult::transient("Translation response contained no text")
            }
        }
    }

    async fn detect_language(&self, text: &str) -> Result<Language> {
        if text.trim().is_empty() {
            return Err(DispatchError::DetectionFailed("text is empty".to_string()));
        }

        let response = self
            .post("detect")
            .json(&RemoteDetectRequest { text })
            .send()
            .await
            .map_err(|e| DispatchError::DetectionFailed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DispatchError::DetectionFailed(format!(
                "detection API returned {}",
                response.status()
            )));
        }

        let parsed: RemoteDetectResponse = response
            .json()
            .await
            .map_err(|e| DispatchError::DetectionFailed(format!("invalid response: {}", e)))?;

        match (parsed.language, parsed.error) {
            (_, Some(error)) => Err(DispatchError::DetectionFailed(format!(
                "{}: {}",
                error.code, error.message
            ))),
            (Some(code), None) => self.catalog.resolve(&code).map_err(|_| {
                DispatchError::DetectionFailed(format!("detected '{}' is not supported", code))
            }),
            (None, None) => Err(DispatchError::DetectionFailed(
                "no language detected".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn request(text: &str) -> TranslationRequest {
        TranslationRequest::new(
            text,
            Language::from_code("en").unwrap(),
            Language::from_code("hi").unwrap(),
        )
    }

    // ==================== Translate Tests ====================

    #[tokio::test]
    async fn test_translate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_json(serde_json::json!({
                "text": "Flood warning",
                "source_lang": "en",
                "target_lang": "hi"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"translated_text": "बाढ़ की चेतावनी"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = RemoteProvider::new(mock_server.uri(), Some("test-key".to_string()));
        let result = provider.translate(&request("Flood warning")).await;

        assert_eq!(result, TranslationResult::success("बाढ़ की चेतावनी"));
    }

    #[tokio::test]
    async fn test_translate_500_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let provider = RemoteProvider::new(mock_server.uri(), None);
        let result = provider.translate(&request("Evacuate")).await;

        assert!(result.is_retryable());
        let TranslationResult::Failure { reason, .. } = result else {
            panic!("expected failure");
        };
        assert!(reason.contains("500"));
    }

    #[tokio::test]
    async fn test_translate_400_is_permanent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unsupported pair"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = RemoteProvider::new(mock_server.uri(), None);
        let result = provider.translate(&request("Evacuate")).await;

        assert!(!result.is_success());
        assert!(!result.is_retryable());
    }

    #[tokio::test]
    async fn test_translate_error_body_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"code": "rate_limited", "message": "slow down"}
            })))
            .mount(&mock_server)
            .await;

        let provider = RemoteProvider::new(mock_server.uri(), None);
        let result = provider.translate(&request("Evacuate")).await;

        assert_eq!(
            result,
            TranslationResult::Failure {
                reason: "rate_limited: slow down".to_string(),
                retryable: true,
            }
        );
    }

    #[tokio::test]
    async fn test_translate_empty_body_is_transient() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let provider = RemoteProvider::new(mock_server.uri(), None);
        assert!(provider.translate(&request("Evacuate")).await.is_retryable());
    }

    #[tokio::test]
    async fn test_translate_empty_text_skips_api_call() {
        // Unroutable URL: no request should be made
        let provider = RemoteProvider::new("http://invalid-url-should-not-be-called.test", None);
        let result = provider.translate(&request("")).await;
        assert_eq!(result, TranslationResult::permanent("text is empty"));
    }

    #[tokio::test]
    async fn test_translate_network_error_is_transient() {
        let provider = RemoteProvider::new("http://127.0.0.1:1", None);
        assert!(provider.translate(&request("Evacuate")).await.is_retryable());
    }

    // ==================== Detect Tests ====================

    #[tokio::test]
    async fn test_detect_language_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"language": "ml"})),
            )
            .mount(&mock_server)
            .await;

        let provider = RemoteProvider::new(format!("{}/", mock_server.uri()), None);
        let detected = provider.detect_language("വെള്ളപ്പൊക്കം").await.unwrap();
        assert_eq!(detected.code(), "ml");
    }

    #[tokio::test]
    async fn test_detect_language_unsupported_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"language": "fr"})),
            )
            .mount(&mock_server)
            .await;

        let provider = RemoteProvider::new(mock_server.uri(), None);
        let err = provider.detect_language("Bonjour").await.unwrap_err();
        assert!(matches!(err, DispatchError::DetectionFailed(_)));
    }

    #[tokio::test]
    async fn test_detect_language_empty_text() {
        let provider = RemoteProvider::new("http://invalid-url-should-not-be-called.test", None);
        assert!(provider.detect_language(" ").await.is_err());
    }

    // ==================== Status Classification Tests ====================

    #[test]
    fn test_is_retryable_status() {
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(401));
        assert!(!is_retryable_status(403));
        assert!(!is_retryable_status(404));
    }

    #[test]
    fn test_is_retryable_code() {
        assert!(is_retryable_code("rate_limited"));
        assert!(is_retryable_code("unavailable"));
        assert!(!is_retryable_code("unsupported_pair"));
    }

    #[test]
    fn test_request_serialization() {
        let body = RemoteTranslateRequest {
            text: "Hello",
            source_lang: "en",
            target_lang: "ta",
        };
        let json = serde_json::to_string(&body).expect("Should serialize");
        assert_eq!(json, r#"{"text":"Hello","source_lang":"en","target_lang":"ta"}"#);
    }
}
