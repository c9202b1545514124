//! External image classifier
//!
//! The [`Classifier`] trait is the seam between the reconciler and the
//! outside world. [`GeminiClient`] is the production implementation, calling
//! the Gemini `generateContent` endpoint with the prompt and the image inline.
//!
//! One request per call. No retries and no rate limiting: callers decide
//! whether to ask again.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use spotter_common::config::ClassifierConfig;

const USER_AGENT: &str = concat!("swamp-spotter/", env!("CARGO_PKG_VERSION"));

/// MIME type assumed when the image carries no data-URI header
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Classifier client errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Classifier returned no text")]
    EmptyResponse,
}

/// Errors decoding an uploaded image
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageDataError {
    #[error("No image provided")]
    Empty,

    #[error("Malformed data URI: {0}")]
    MalformedUri(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(String),
}

/// A decoded image ready to send upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Decode `data:image/<type>;base64,<payload>`
    ///
    /// A bare base64 payload without a header is accepted as `image/jpeg`.
    pub fn from_data_uri(input: &str) -> Result<Self, ImageDataError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ImageDataError::Empty);
        }

        let (mime_type, payload) = match input.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| ImageDataError::MalformedUri("missing ','".to_string()))?;
                let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
                    ImageDataError::MalformedUri("only base64 data URIs are supported".to_string())
                })?;
                if !mime_type.starts_with("image/") || mime_type.len() <= "image/".len() {
                    return Err(ImageDataError::UnsupportedMediaType(mime_type.to_string()));
                }
                (mime_type.to_string(), payload)
            }
            None => (DEFAULT_IMAGE_MIME.to_string(), input),
        };

        if payload.is_empty() {
            return Err(ImageDataError::Empty);
        }

        let bytes = BASE64
            .decode(payload)
            .map_err(|e| ImageDataError::InvalidBase64(e.to_string()))?;

        Ok(Self { mime_type, bytes })
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// Something that turns an image and an instruction into free text
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifier identifier for logs
    fn name(&self) -> &'static str;

    /// Ask the classifier about `image`; returns the raw text answer
    async fn classify(&self, image: &ImageData, prompt: &str) -> Result<String, ClassifierError>;
}

// Gemini generateContent request/response shapes

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(config: &ClassifierConfig, api_key: String) -> Result<Self, ClassifierError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            http_client,
            endpoint,
            api_key,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn classify(&self, image: &ImageData, prompt: &str) -> Result<String, ClassifierError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text { text: prompt },
                    RequestPart::Inline {
                        inline_data: InlineData {
                            mime_type: &image.mime_type,
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        tracing::debug!(
            mime_type = %image.mime_type,
            image_bytes = image.bytes.len(),
            "Querying classifier"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api(status.as_u16(), error_text));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.without_url().to_string()))?;

        let text = body.first_text().ok_or(ClassifierError::EmptyResponse)?;
        if text.trim().is_empty() {
            return Err(ClassifierError::EmptyResponse);
        }

        Ok(text)
    }
}
