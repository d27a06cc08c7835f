use std::env;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::backend::{FragmentStream, GenerationBackend};
use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, STREAM_BYTES, STREAM_CHUNKS,
    STREAM_ERRORS,
};
use crate::sse::process_sse;
use crate::types::{GenerateContentRequest, GenerateContentResponse, ModelConfig, ModelId};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads the API key from the environment.
///
/// A missing or blank key is a configuration error; the chat refuses to start
/// without one.
pub fn api_key_from_env() -> Result<String> {
    api_key_from(env::var(API_KEY_ENV).ok())
}

/// Validates a raw API key value, trimming surrounding whitespace.
pub fn api_key_from(value: Option<String>) -> Result<String> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(Error::configuration(format!(
            "API key missing! Set {API_KEY_ENV}"
        ))),
    }
}

/// Client for the Gemini API.
#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl Gemini {
    /// Create a new Gemini client.
    ///
    /// The API key can be provided directly or read from the GOOGLE_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => api_key_from_env()?,
        };
        if HeaderValue::from_str(&api_key).is_err() {
            return Err(Error::configuration(
                "API key contains characters that cannot be sent in a header",
            ));
        }

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attaches a logger that sees every request and streamed chunk.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| Error::configuration("API key is not a valid header value"))?;
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    /// The URL of `method` (`generateContent`, `streamGenerateContent`) for a model.
    fn endpoint(&self, model: ModelId, method: &str) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("models/{}:{method}", model.api_id()))?)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        error_from_body(status_code, &error_body, retry_after)
    }

    async fn post(
        &self,
        url: Url,
        request: &GenerateContentRequest,
        accept: &'static str,
    ) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let mut headers = self.default_headers()?;
        headers.insert(header::ACCEPT, HeaderValue::from_static(accept));

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {e}"),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
                }
            });
        let response = match response {
            Ok(response) => response,
            Err(err) => return Err(self.record_error(err)),
        };

        if !response.status().is_success() {
            let err = Self::process_error_response(response).await;
            return Err(self.record_error(err));
        }
        Ok(response)
    }

    fn record_error(&self, err: Error) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        if let Some(logger) = &self.logger {
            logger.log_error(&err);
        }
        err
    }

    /// Generate a complete response in one round trip.
    pub async fn generate_content(
        &self,
        model: ModelId,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model, "generateContent")?;
        if let Some(logger) = &self.logger {
            logger.log_request(model, request);
        }

        let start = Instant::now();
        let response = self.post(url, request, "application/json").await?;
        let response = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
            });
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        let response = response.map_err(|e| self.record_error(e))?;

        if let Some(logger) = &self.logger {
            logger.log_response(&response);
        }
        Ok(response)
    }

    /// Generate a response as a stream of parsed chunks.
    pub async fn stream_generate_content(
        &self,
        model: ModelId,
        request: &GenerateContentRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>> {
        let mut url = self.endpoint(model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");
        if let Some(logger) = &self.logger {
            logger.log_request(model, request);
        }

        let start = Instant::now();
        let response = self.post(url, request, "text/event-stream").await?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let bytes = response.bytes_stream().inspect(|chunk| {
            if let Ok(chunk) = chunk {
                STREAM_BYTES.count(chunk.len() as u64);
            }
        });
        Ok(Box::pin(process_sse(Box::pin(bytes))))
    }
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl GenerationBackend for Gemini {
    async fn stream_fragments(&self, prompt: &str, config: &ModelConfig) -> Result<FragmentStream> {
        let request = GenerateContentRequest::from_prompt(prompt, config.generation_config());
        let chunks = self.stream_generate_content(config.model(), &request).await?;
        Ok(fragments(chunks, self.logger.clone()))
    }
}

/// Turns parsed chunks into text fragments, dropping chunks without text.
pub(crate) fn fragments<S>(chunks: S, logger: Option<Arc<dyn ClientLogger>>) -> FragmentStream
where
    S: Stream<Item = Result<GenerateContentResponse>> + Send + 'static,
{
    let fragments = chunks.filter_map(move |chunk| {
        let logger = logger.clone();
        async move {
            let text = chunk.and_then(|chunk| {
                STREAM_CHUNKS.click();
                if let Some(logger) = &logger {
                    logger.log_stream_chunk(&chunk);
                }
                chunk.text()
            });
            match text {
                Ok(text) if text.is_empty() => None,
                Ok(text) => Some(Ok(text)),
                Err(err) => {
                    STREAM_ERRORS.click();
                    if let Some(logger) = &logger {
                        logger.log_error(&err);
                    }
                    Some(Err(err))
                }
            }
        }
    });
    Box::pin(fragments)
}

/// Maps an error response onto the error taxonomy by HTTP status.
///
/// The body is Google's error envelope when it parses, raw text otherwise.
fn error_from_body(status_code: u16, body: &str, retry_after: Option<u64>) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
        status: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let status = detail.as_ref().and_then(|d| d.status.clone());
    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| body.to_string());

    match status_code {
        400 => Error::bad_request(message),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, status, message),
    }
}
