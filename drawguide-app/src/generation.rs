//! AI guide generation.
//!
//! A prompt goes to an external generation service, which answers with an
//! image URL. The image is fetched and handed back as bytes for the canvas
//! to show as a guide. Rate limiting is delegated to a
//! [`GenerationPolicy`]; the service itself is behind [`GenerationClient`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use drawguide_renderer::decode_data_uri;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::limits::GenerationPolicy;

/// Default request timeout for the generation service.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Message shown when the daily allowance is used up.
pub const LIMIT_REACHED_MESSAGE: &str =
    "You've reached the daily limit. Please try again tomorrow.";

/// Errors from the generation round trip.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid generation endpoint: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service reported an error.
    #[error("{0}")]
    Service(String),
    /// The response did not have the expected shape.
    #[error("unexpected generation response: {0}")]
    UnexpectedResponse(String),
    /// The generated image could not be retrieved.
    #[error("failed to load generated image: {0}")]
    Image(String),
    /// The rate-limit policy refused the request.
    #[error("You've reached the daily limit. Please try again tomorrow.")]
    LimitReached,
    /// Another generation is still running.
    #[error("a generation is already in progress")]
    Busy,
}

/// Drawing style appended to the prompt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SketchStyle {
    /// Action-manga look.
    #[default]
    Shounen,
    /// Soft, romantic look.
    Shoujo,
    /// Mature, detailed look.
    Seinen,
    /// Super-deformed look.
    Chibi,
    /// Robots and machinery.
    Mecha,
}

impl SketchStyle {
    /// Lowercase style name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shounen => "shounen",
            Self::Shoujo => "shoujo",
            Self::Seinen => "seinen",
            Self::Chibi => "chibi",
            Self::Mecha => "mecha",
        }
    }
}

impl std::fmt::Display for SketchStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the prompt sent to the service.
///
/// A blank prompt asks for a generic character in the style.
#[must_use]
pub fn compose_prompt(prompt: &str, style: SketchStyle) -> String {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        format!("{style} style character")
    } else {
        format!("{prompt} in {style} style")
    }
}

/// Talks to the image generation service.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Request an image for `prompt`, returning its URL.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or an
    /// error body.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Download the image at `url`. `data:` URLs are decoded locally.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Image`] if the image cannot be retrieved.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    image_url: Option<String>,
    error: Option<String>,
}

/// [`GenerationClient`] over HTTP with reqwest. Requests are not retried.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    http: Client,
    endpoint: Url,
}

impl HttpGenerationClient {
    /// Create a client posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidUrl`] if the URL is malformed.
    /// Returns [`GenerationError::Http`] if the HTTP client fails to build.
    pub fn new(endpoint: impl AsRef<str>, timeout: Duration) -> Result<Self, GenerationError> {
        let endpoint = Url::parse(endpoint.as_ref())
            .map_err(|e| GenerationError::InvalidUrl(e.to_string()))?;
        let http = Client::builder()
            .user_agent(format!("drawguide/{}", crate::VERSION))
            .timeout(timeout)
            .build()?;
        Ok(Self { http, endpoint })
    }

    /// The service endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&GenerateRequest { prompt })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<GenerateResponse> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("HTTP {status}: {body}"));
            tracing::warn!("Generation service returned {status}");
            return Err(GenerationError::Service(message));
        }

        let parsed = parsed.ok_or_else(|| {
            GenerationError::UnexpectedResponse(format!("body is not JSON: {body}"))
        })?;
        match (parsed.image_url, parsed.error) {
            (_, Some(error)) => Err(GenerationError::Service(error)),
            (Some(url), None) => Ok(url),
            (None, None) => Err(GenerationError::UnexpectedResponse(
                "missing imageUrl".to_string(),
            )),
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, GenerationError> {
        if url.starts_with("data:") {
            return decode_data_uri(url).map_err(|e| GenerationError::Image(e.to_string()));
        }

        let url = self
            .endpoint
            .join(url)
            .map_err(|e| GenerationError::Image(format!("invalid image URL: {e}")))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GenerationError::Image(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Image(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Resets the pending flag however the generation ends.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs prompt-to-guide generations under a rate-limit policy.
#[derive(Debug)]
pub struct GuideGenerator<C, P> {
    client: C,
    policy: Mutex<P>,
    pending: AtomicBool,
}

impl<C: GenerationClient, P: GenerationPolicy> GuideGenerator<C, P> {
    /// Create a generator.
    pub fn new(client: C, policy: P) -> Self {
        Self {
            client,
            policy: Mutex::new(policy),
            pending: AtomicBool::new(false),
        }
    }

    /// Whether a generation is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Run `f` with the policy.
    pub fn with_policy<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        let mut policy = self.policy.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut policy)
    }

    /// Generate a guide image for `prompt` in `style`, returning its bytes.
    ///
    /// The policy is consulted first and only charged when the image was
    /// retrieved successfully.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::LimitReached`] if the policy refuses,
    /// [`GenerationError::Busy`] if another generation is running, or the
    /// client's error.
    pub async fn generate(
        &self,
        prompt: &str,
        style: SketchStyle,
    ) -> Result<Vec<u8>, GenerationError> {
        if !self.with_policy(|p| p.check_allowed()) {
            return Err(GenerationError::LimitReached);
        }
        if self.pending.swap(true, Ordering::AcqRel) {
            return Err(GenerationError::Busy);
        }
        let _guard = PendingGuard(&self.pending);

        let full_prompt = compose_prompt(prompt, style);
        tracing::info!("Generating guide for \"{full_prompt}\"");

        let result = async {
            let url = self.client.generate(&full_prompt).await?;
            self.client.fetch_image(&url).await
        }
        .await;

        match &result {
            Ok(bytes) => {
                self.with_policy(P::record_attempt);
                tracing::debug!("Fetched {} byte guide image", bytes.len());
            }
            Err(e) => tracing::warn!("Guide generation failed: {e}"),
        }
        result
    }
}
