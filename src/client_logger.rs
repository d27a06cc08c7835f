//! Logging trait for Gemini client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`Gemini`](crate::Gemini)
//! client, plus [`StderrLogger`], which writes them as JSON lines.

use std::io::{self, Write};

use serde_json::json;

use crate::{GenerateContentRequest, GenerateContentResponse, ModelId};

/// A trait for logging Gemini client operations.
///
/// Implement this trait to capture and record all API interactions,
/// including both non-streaming responses and individual streaming chunks.
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, model: ModelId, request: &GenerateContentRequest);

    /// Log a complete response from a non-streaming call.
    fn log_response(&self, response: &GenerateContentResponse);

    /// Log an individual streamed chunk.
    ///
    /// Called once for every chunk received during a streaming request,
    /// including chunks that carry no text.
    fn log_stream_chunk(&self, chunk: &GenerateContentResponse);

    /// Log a failed request or a failure in the middle of a stream.
    fn log_error(&self, error: &crate::Error);
}

/// Writes every logged interaction to stderr as one JSON object per line.
#[derive(Debug, Default)]
pub struct StderrLogger;

impl StderrLogger {
    /// Creates a new stderr logger.
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, line: serde_json::Value) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
    }
}

impl ClientLogger for StderrLogger {
    fn log_request(&self, model: ModelId, request: &GenerateContentRequest) {
        self.emit(json!({"event": "request", "model": model, "body": request}));
    }

    fn log_response(&self, response: &GenerateContentResponse) {
        self.emit(json!({"event": "response", "body": response}));
    }

    fn log_stream_chunk(&self, chunk: &GenerateContentResponse) {
        self.emit(json!({"event": "chunk", "body": chunk}));
    }

    fn log_error(&self, error: &crate::Error) {
        self.emit(json!({"event": "error", "message": error.to_string()}));
    }
}
