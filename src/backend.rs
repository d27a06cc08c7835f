//! The contract between the chat and whatever produces responses.

use std::pin::Pin;

use futures::Stream;

use crate::error::Result;
use crate::types::ModelConfig;

/// Text fragments of one response, in arrival order.
///
/// The stream ends at natural completion. Dropping it stops consumption; no
/// cancellation is sent to the server.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Something that turns a prompt into a stream of text fragments.
///
/// [`Gemini`](crate::Gemini) is the production implementation; tests use
/// scripted in-memory backends.
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Starts generating a response to `prompt` with the given parameters.
    ///
    /// Errors returned here, and errors yielded by the stream, are generation
    /// errors: the caller reports them and keeps the session alive.
    async fn stream_fragments(&self, prompt: &str, config: &ModelConfig)
    -> Result<FragmentStream>;
}
