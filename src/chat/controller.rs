//! The streaming response controller.
//!
//! One call to [`StreamingController::run_cycle`] is one cycle:
//!
//! ```text
//! Idle -> Requesting -> Streaming -> [Cancelling] -> Finalizing -> Idle
//!             |             |
//!             +-------------+-------> Failed -----------------> Idle
//! ```
//!
//! The user message is appended before any network activity. Fragments are
//! accumulated and pushed to the renderer with [`STREAM_CURSOR`] appended. A
//! stop request is checked once per fragment boundary. On success or
//! cancellation the accumulated text becomes an assistant message; on failure
//! nothing is appended and the error is reported. The generation flags are
//! cleared on every exit path.

use std::time::{Duration, Instant};

use futures::StreamExt;

use crate::backend::GenerationBackend;
use crate::chat::state::{GenerationState, SessionState};
use crate::error::{Error, Result};
use crate::observability::{
    CYCLE_DURATION, CYCLE_FRAGMENTS, CYCLES_CANCELLED, CYCLES_COMPLETED, CYCLES_FAILED,
};
use crate::render::{Renderer, STREAM_CURSOR};
use crate::types::{Message, ModelConfig};

/// Default delay between fragment renders.
pub const DEFAULT_PACING: Duration = Duration::from_millis(20);

/// How a cycle ended.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The response ran to completion; holds the appended assistant message.
    Completed(Message),
    /// The user stopped generation; holds the partial assistant message.
    Cancelled(Message),
    /// The request or the stream failed; no assistant message was appended.
    Failed(Error),
}

impl CycleOutcome {
    /// The assistant message appended by this cycle, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            CycleOutcome::Completed(message) | CycleOutcome::Cancelled(message) => Some(message),
            CycleOutcome::Failed(_) => None,
        }
    }

    /// The generation error, if the cycle failed.
    pub fn error(&self) -> Option<&Error> {
        match self {
            CycleOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// True if the user stopped the cycle.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CycleOutcome::Cancelled(_))
    }
}

/// What the streaming phase produced before it ended.
struct Streamed {
    text: String,
    cancelled: bool,
}

/// Drives one request/response cycle at a time.
#[derive(Debug, Clone)]
pub struct StreamingController {
    pacing: Duration,
}

impl StreamingController {
    /// Creates a controller that waits `pacing` after rendering each fragment.
    ///
    /// The delay is purely visual; `Duration::ZERO` disables it.
    pub fn new(pacing: Duration) -> Self {
        Self { pacing }
    }

    /// The delay between fragment renders.
    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Runs one cycle for `prompt`.
    ///
    /// Returns `Ok(None)` for blank input, which starts no cycle, and
    /// `Err(Error::Busy)` if a cycle is already active. Generation errors never
    /// surface as `Err`: they are reported to `renderer` and returned as
    /// [`CycleOutcome::Failed`].
    pub async fn run_cycle<B: GenerationBackend + ?Sized>(
        &self,
        backend: &B,
        state: &mut SessionState,
        prompt: &str,
        config: &ModelConfig,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<CycleOutcome>> {
        if prompt.trim().is_empty() {
            return Ok(None);
        }
        let Some(_guard) = state.generation().begin() else {
            return Err(Error::busy("a response is already being generated"));
        };
        let started = Instant::now();
        let generation = state.generation().clone();

        state.append_message(Message::user(prompt));
        renderer.start_response(config.model().display_name());

        let outcome = match self
            .stream(backend, prompt, config, &generation, renderer)
            .await
        {
            Ok(Streamed { text, cancelled }) => {
                renderer.finish_response(&text);
                let message = Message::assistant(text);
                state.append_message(message.clone());
                if cancelled {
                    renderer.print_interrupted();
                    CYCLES_CANCELLED.click();
                    CycleOutcome::Cancelled(message)
                } else {
                    CYCLES_COMPLETED.click();
                    CycleOutcome::Completed(message)
                }
            }
            Err(err) => {
                renderer.print_error(&err.to_string());
                CYCLES_FAILED.click();
                CycleOutcome::Failed(err)
            }
        };
        CYCLE_DURATION.add(started.elapsed().as_secs_f64());
        Ok(Some(outcome))
    }

    async fn stream<B: GenerationBackend + ?Sized>(
        &self,
        backend: &B,
        prompt: &str,
        config: &ModelConfig,
        generation: &GenerationState,
        renderer: &mut dyn Renderer,
    ) -> Result<Streamed> {
        let mut fragments = backend.stream_fragments(prompt, config).await?;
        let mut text = String::new();
        loop {
            if generation.is_stop_requested() {
                return Ok(Streamed {
                    text,
                    cancelled: true,
                });
            }
            let Some(fragment) = fragments.next().await else {
                return Ok(Streamed {
                    text,
                    cancelled: false,
                });
            };
            text.push_str(&fragment?);
            CYCLE_FRAGMENTS.click();
            renderer.update_display(&format!("{text}{STREAM_CURSOR}"));
            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }
    }
}

impl Default for StreamingController {
    fn default() -> Self {
        Self::new(DEFAULT_PACING)
    }
}
