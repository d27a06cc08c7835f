//! Integration tests for the geminichat library.
//!
//! Most tests drive a [`ChatSession`] against a scripted backend or a local
//! SSE server. The live tests require an API key in the environment to run.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::stream;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use geminichat::chat::{ChatConfig, ChatSession, CycleOutcome, StopHandle};
    use geminichat::{
        Error, FragmentStream, Gemini, GenerationBackend, ModelConfig, ModelId, Renderer, Result,
        Role,
    };

    /// Replays the same fragments for every prompt, or fails the whole stream
    /// after `fail_after` fragments.
    struct MockBackend {
        fragments: Vec<&'static str>,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl GenerationBackend for MockBackend {
        async fn stream_fragments(
            &self,
            _prompt: &str,
            _config: &ModelConfig,
        ) -> Result<FragmentStream> {
            let mut items: Vec<Result<String>> =
                self.fragments.iter().map(|f| Ok(f.to_string())).collect();
            if let Some(n) = self.fail_after {
                items.truncate(n);
                items.push(Err(Error::service_unavailable("overloaded", None)));
            }
            Ok(Box::pin(stream::iter(items)))
        }
    }

    /// Records the display buffer and optionally stops after N updates.
    #[derive(Default)]
    struct TestRenderer {
        updates: Vec<String>,
        finished: Vec<String>,
        errors: Vec<String>,
        interrupted: usize,
        stop_after: Option<(usize, StopHandle)>,
    }

    impl Renderer for TestRenderer {
        fn start_response(&mut self, _label: &str) {}

        fn update_display(&mut self, buffer: &str) {
            self.updates.push(buffer.to_string());
            if let Some((n, handle)) = &self.stop_after
                && self.updates.len() == *n
            {
                handle.request_stop();
            }
        }

        fn finish_response(&mut self, text: &str) {
            self.finished.push(text.to_string());
        }

        fn print_interrupted(&mut self) {
            self.interrupted += 1;
        }

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, _info: &str) {}
    }

    fn mock_session(
        fragments: Vec<&'static str>,
        fail_after: Option<usize>,
    ) -> ChatSession<MockBackend> {
        let config = ChatConfig::new().with_pacing(Duration::ZERO);
        ChatSession::new(
            MockBackend {
                fragments,
                fail_after,
            },
            config,
        )
    }

    #[tokio::test]
    async fn history_alternates_after_many_cycles() {
        let mut session = mock_session(vec!["Hi", " there", "!"], None);
        let mut renderer = TestRenderer::default();

        for i in 0..5 {
            let outcome = session
                .submit(&format!("message {i}"), &mut renderer)
                .await
                .unwrap();
            assert!(matches!(outcome, Some(CycleOutcome::Completed(_))));
        }

        let messages = session.state().messages();
        assert_eq!(messages.len(), 10);
        for (i, pair) in messages.chunks(2).enumerate() {
            assert_eq!(pair[0].role(), Role::User);
            assert_eq!(pair[0].content(), format!("message {i}"));
            assert_eq!(pair[1].role(), Role::Assistant);
            assert_eq!(pair[1].content(), "Hi there!");
        }
        assert!(!session.state().generation().is_generating());
        assert_eq!(session.stats().completed_cycles, 5);
    }

    #[tokio::test]
    async fn display_shows_cursor_until_final() {
        let mut session = mock_session(vec!["Hi", " there", "!"], None);
        let mut renderer = TestRenderer::default();
        session.submit("Hello", &mut renderer).await.unwrap();

        assert_eq!(renderer.updates, vec!["Hi▌", "Hi there▌", "Hi there!▌"]);
        assert_eq!(renderer.finished, vec!["Hi there!"]);
    }

    #[tokio::test]
    async fn stop_keeps_partial_response() {
        let mut session = mock_session(vec!["Sure,", " here", " is", " more"], None);
        let mut renderer = TestRenderer {
            stop_after: Some((1, session.stop_handle())),
            ..Default::default()
        };

        let outcome = session.submit("Tell me", &mut renderer).await.unwrap();
        let outcome = outcome.unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.message().unwrap().content(), "Sure,");
        assert_eq!(renderer.interrupted, 1);

        let state = session.state();
        assert_eq!(state.message_count(), 2);
        assert_eq!(state.messages()[1].content(), "Sure,");
        assert!(!state.generation().is_generating());
        assert!(!state.generation().is_stop_requested());
        assert_eq!(session.stats().cancelled_cycles, 1);
    }

    #[tokio::test]
    async fn stop_while_idle_does_not_affect_next_cycle() {
        let mut session = mock_session(vec!["a", "b"], None);
        let mut renderer = TestRenderer::default();

        assert!(!session.stop_handle().request_stop());
        let outcome = session.submit("go", &mut renderer).await.unwrap().unwrap();
        assert!(matches!(outcome, CycleOutcome::Completed(ref m) if m.content() == "ab"));
    }

    #[tokio::test]
    async fn stream_error_adds_only_user_message() {
        let mut session = mock_session(vec!["partial", " text"], Some(1));
        let mut renderer = TestRenderer::default();

        session.submit("first", &mut renderer).await.unwrap();
        let outcome = session.submit("second", &mut renderer).await.unwrap().unwrap();
        assert!(outcome.error().unwrap().is_server_error());

        let messages = session.state().messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.role() == Role::User));
        assert_eq!(renderer.errors.len(), 2);
        assert!(renderer.errors[0].contains("overloaded"));
        assert!(!session.state().generation().is_generating());
        assert_eq!(session.stats().failed_cycles, 2);
    }

    #[tokio::test]
    async fn clear_restores_help() {
        let mut session = mock_session(vec!["ok"], None);
        let mut renderer = TestRenderer::default();
        session.submit("hello", &mut renderer).await.unwrap();
        assert!(!session.state().show_help());

        session.clear();
        assert_eq!(session.message_count(), 0);
        assert!(session.state().show_help());
    }

    /// Serves one canned HTTP response and hands back the raw request.
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: String,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1beta/", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nConnection: close\r\n\r\n{body}"
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (base_url, handle)
    }

    #[tokio::test]
    async fn client_streams_from_local_server() {
        let body = [
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"}]},"index":0}]}"#,
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":", world"}]},"index":0}]}"#,
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":""}]},"finishReason":"STOP","index":0}]}"#,
        ]
        .iter()
        .map(|event| format!("data: {event}\r\n\r\n"))
        .collect::<String>();
        let (base_url, server) = serve_once("200 OK", "text/event-stream", body).await;

        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some(base_url),
            Some(Duration::from_secs(10)),
        )
        .unwrap();
        let config = ChatConfig::new()
            .with_model(ModelId::Gemini20FlashExp)
            .with_top_k(7)
            .with_pacing(Duration::ZERO);
        let mut session = ChatSession::new(client, config);
        let mut renderer = TestRenderer::default();

        let outcome = session
            .submit("Say hello", &mut renderer)
            .await
            .unwrap()
            .unwrap();
        assert!(
            matches!(outcome, CycleOutcome::Completed(ref m) if m.content() == "Hello, world")
        );
        assert_eq!(renderer.updates, vec!["Hello▌", "Hello, world▌"]);

        let request = server.await.unwrap();
        assert!(request.starts_with(
            "POST /v1beta/models/gemini-2.0-flash-exp:streamGenerateContent?alt=sse "
        ));
        assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
        assert!(request.contains(r#""text":"Say hello""#));
        assert!(request.contains(r#""topK":7"#));
        assert!(request.contains(r#""maxOutputTokens":4096"#));
    }

    #[tokio::test]
    async fn client_maps_error_envelope() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        let (base_url, server) =
            serve_once("429 Too Many Requests", "application/json", body.to_string()).await;

        let client =
            Gemini::with_options(Some("test-key".to_string()), Some(base_url), None).unwrap();
        let config = ChatConfig::new().with_pacing(Duration::ZERO);
        let mut session = ChatSession::new(client, config);
        let mut renderer = TestRenderer::default();

        let outcome = session.submit("Hello", &mut renderer).await.unwrap().unwrap();
        let err = outcome.error().unwrap();
        assert!(err.is_rate_limit());
        assert!(renderer.errors[0].contains("Resource has been exhausted"));
        assert_eq!(session.message_count(), 1);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_streaming_chat_live() {
        // This test requires GOOGLE_API_KEY to be set
        let api_key = std::env::var("GOOGLE_API_KEY").ok();
        if api_key.is_none() {
            eprintln!("Skipping test: GOOGLE_API_KEY not set");
            return;
        }

        let client = Gemini::new(api_key).expect("Failed to create client");
        let config = ChatConfig::new()
            .with_max_output_tokens(100)
            .with_pacing(Duration::ZERO);
        let mut session = ChatSession::new(client, config);
        let mut renderer = TestRenderer::default();

        let outcome = session
            .submit("Say 'test passed'", &mut renderer)
            .await
            .expect("submission should be accepted")
            .expect("non-blank input starts a cycle");
        assert!(
            outcome.error().is_none(),
            "Request should succeed with valid API key: {:?}",
            outcome.error()
        );
        assert_eq!(session.message_count(), 2);
    }
}
