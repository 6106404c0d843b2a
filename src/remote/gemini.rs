/// Client for the Gemini `generateContent` REST endpoint
///
/// Sends the cropped portrait together with an enhanced prompt and asks for an
/// image-only response. Only the first inline image of the first candidate is used.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::{Result, StudioError};
use crate::imaging::data_url::DataUrl;

/// Marker the API puts in its message when the key is rejected
const INVALID_KEY_MARKER: &str = "API key not valid";

// ========== Wire types ==========

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiErrorDetails,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetails {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// ========== Prompt ==========

/// Wrap the user's request in the fixed branding-photo instructions
pub fn enhanced_prompt(user_prompt: &str) -> String {
    format!(
        "**Objective**: Transform the provided image into a professional branding photograph based on the user's request.\n\
         **CRITICAL INSTRUCTION**: You MUST preserve the person's face from the original image with 100% accuracy. \
         The facial features, expression, and identity must remain completely unchanged. Do not alter the face.\n\
         **Style**: The final image must be ultra-realistic, photorealistic, 8K resolution, with professional studio lighting, \
         and extremely high detail, suitable for a corporate website or LinkedIn profile.\n\
         **User's Request**: \"{}\"",
        user_prompt
    )
}

/// Request body: image part first, then the instructions
pub fn build_request(image: &DataUrl, user_prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part {
                    inline_data: Some(InlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.data.clone(),
                    }),
                    text: None,
                },
                Part {
                    inline_data: None,
                    text: Some(enhanced_prompt(user_prompt)),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
        },
    }
}

/// Pull the first inline image out of the first candidate
pub fn extract_image(response: &GenerateContentResponse) -> std::result::Result<DataUrl, String> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| "Response contained no candidates".to_string())?;

    candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .find_map(|part| part.inline_data.as_ref())
        .map(|inline| DataUrl::new(inline.mime_type.clone(), inline.data.clone()))
        .ok_or_else(|| match &candidate.finish_reason {
            Some(reason) => format!("No image was generated in the response (finish reason: {})", reason),
            None => "No image was generated in the response.".to_string(),
        })
}

/// Map a failure detail to what the user is shown
pub fn classify_failure(detail: String) -> StudioError {
    if detail.contains(INVALID_KEY_MARKER) {
        StudioError::InvalidApiKey
    } else {
        StudioError::Generation(detail)
    }
}

/// Readable detail from a non-success HTTP body
fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => format!(
            "HTTP {} {}: {}",
            status.as_u16(),
            parsed.error.status.unwrap_or_default(),
            parsed.error.message
        ),
        Err(_) => format!("HTTP {}: {}", status.as_u16(), body.chars().take(200).collect::<String>()),
    }
}

// ========== Client ==========

/// Cheap to clone; the underlying reqwest client is reference counted
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("branding-studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("⚠️  Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Full URL of the generateContent call
    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Restyle `image` according to `user_prompt`, preserving the face
    ///
    /// Every failure except a rejected key collapses to the generic generation
    /// error; the underlying detail is logged.
    pub async fn generate_branded_image(self, image: DataUrl, user_prompt: String) -> Result<DataUrl> {
        let api_key = self.api_key.clone().ok_or(StudioError::MissingApiKey)?;

        match self.send(&api_key, &image, &user_prompt).await {
            Ok(result) => {
                log::info!(
                    "✨ Received generated image ({}, ~{} KB)",
                    result.mime_type,
                    result.approx_len() / 1024
                );
                Ok(result)
            }
            Err(detail) => {
                log::error!("❌ Error generating image with {}: {}", self.model, detail);
                Err(classify_failure(detail))
            }
        }
    }

    async fn send(&self, api_key: &str, image: &DataUrl, user_prompt: &str) -> std::result::Result<DataUrl, String> {
        if image.mime_type.is_empty() || image.data.is_empty() {
            return Err(StudioError::InvalidDataUrl.to_string());
        }

        let body = build_request(image, user_prompt);
        log::info!("🚀 Sending {} (~{} KB) to {}", image.mime_type, image.approx_len() / 1024, self.model);
        log::debug!("POST {}", self.url());

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))?;

        if !status.is_success() {
            return Err(error_detail(status, &text));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| format!("Malformed response: {}", e))?;

        extract_image(&parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let image = DataUrl::new("image/jpeg", "QUJD");
        let request = build_request(&image, "  navy suit, modern office  ");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(value["contents"][0]["parts"][0]["inlineData"]["data"], "QUJD");
        assert!(value["contents"][0]["parts"][0].get("text").is_none());

        let text = value["contents"][0]["parts"][1]["text"].as_str().unwrap();
        assert!(text.contains("\"  navy suit, modern office  \""));
        assert!(value["contents"][0]["parts"][1].get("inlineData").is_none());

        assert_eq!(value["generationConfig"]["responseModalities"], json!(["IMAGE"]));
    }

    #[test]
    fn test_enhanced_prompt_keeps_face_instruction() {
        let prompt = enhanced_prompt("studio headshot");
        assert!(prompt.contains("preserve the person's face"));
        assert!(prompt.contains("photorealistic"));
        assert!(prompt.ends_with("\"studio headshot\""));
    }

    #[test]
    fn test_enhanced_prompt_quotes_text_as_typed() {
        let prompt = enhanced_prompt("  black suit,\n  glass office ");
        assert!(prompt.ends_with("\"  black suit,\n  glass office \""));
    }

    #[test]
    fn test_extract_first_inline_image() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here is your photo" },
                    { "inlineData": { "mimeType": "image/png", "data": "iVBO" } },
                    { "inlineData": { "mimeType": "image/png", "data": "SECOND" } }
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let image = extract_image(&response).unwrap();
        assert_eq!(image.to_string(), "data:image/png;base64,iVBO");
    }

    #[test]
    fn test_extract_without_image_part() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't do that" }] } }]
        }))
        .unwrap();
        let err = extract_image(&response).unwrap_err();
        assert!(err.contains("No image was generated"));

        let blocked: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "IMAGE_SAFETY" }]
        }))
        .unwrap();
        assert!(extract_image(&blocked).unwrap_err().contains("IMAGE_SAFETY"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(extract_image(&empty).is_err());
    }

    #[test]
    fn test_classify_failure() {
        let detail = error_detail(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
        );
        assert_eq!(classify_failure(detail), StudioError::InvalidApiKey);

        let detail = error_detail(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");
        assert_eq!(detail, "HTTP 500: upstream exploded");
        assert!(matches!(classify_failure(detail), StudioError::Generation(_)));
    }

    #[test]
    fn test_url_from_config() {
        let config = AppConfig {
            endpoint: "http://localhost:8080/v1beta".into(),
            model: "test-model".into(),
            ..AppConfig::default()
        };
        let client = GeminiClient::new(&config);
        assert_eq!(client.url(), "http://localhost:8080/v1beta/models/test-model:generateContent");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = GeminiClient::new(&AppConfig::default());
        let result = client
            .generate_branded_image(DataUrl::new("image/jpeg", "QUJD"), "suit".into())
            .await;
        assert_eq!(result, Err(StudioError::MissingApiKey));
    }

    // ========== End to end against a local one-shot server ==========

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Read one HTTP request (headers plus Content-Length body)
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..n]);
            if let Some(end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buffer[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buffer.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Answer a single request with `status` and `body`; yields the raw request
    async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{}/v1beta", addr), handle)
    }

    fn local_client(endpoint: String) -> GeminiClient {
        GeminiClient::new(&AppConfig {
            api_key: Some("secret-key".into()),
            model: "test-model".into(),
            endpoint,
            request_timeout_secs: 10,
            ..AppConfig::default()
        })
    }

    #[tokio::test]
    async fn test_send_returns_generated_image() {
        let body = json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "iVBORw0K" } }
            ]}}]
        })
        .to_string();
        let (endpoint, server) = serve_once("200 OK", body).await;

        let result = local_client(endpoint)
            .generate_branded_image(DataUrl::new("image/jpeg", "QUJD"), "grey suit".into())
            .await;
        assert_eq!(result, Ok(DataUrl::new("image/png", "iVBORw0K")));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/test-model:generateContent "));
        assert!(request.to_lowercase().contains("x-goog-api-key: secret-key"));
        assert!(request.contains(r#""mimeType":"image/jpeg""#));
        assert!(request.contains(r#""responseModalities":["IMAGE"]"#));
    }

    #[tokio::test]
    async fn test_send_maps_rejected_key() {
        let body = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })
        .to_string();
        let (endpoint, server) = serve_once("400 Bad Request", body).await;

        let result = local_client(endpoint)
            .generate_branded_image(DataUrl::new("image/jpeg", "QUJD"), "grey suit".into())
            .await;
        assert_eq!(result, Err(StudioError::InvalidApiKey));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_maps_server_error_to_generic_failure() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "upstream exploded".into()).await;

        let result = local_client(endpoint)
            .generate_branded_image(DataUrl::new("image/jpeg", "QUJD"), "grey suit".into())
            .await;
        match result {
            Err(StudioError::Generation(detail)) => assert_eq!(detail, "HTTP 500: upstream exploded"),
            other => panic!("expected generation error, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_without_image_part_is_generic_failure() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Sorry, I can't help with that." }] } }]
        })
        .to_string();
        let (endpoint, server) = serve_once("200 OK", body).await;

        let result = local_client(endpoint)
            .generate_branded_image(DataUrl::new("image/jpeg", "QUJD"), "grey suit".into())
            .await;
        match result {
            Err(StudioError::Generation(detail)) => assert!(detail.contains("No image was generated")),
            other => panic!("expected generation error, got {:?}", other),
        }
        server.await.unwrap();
    }
}
