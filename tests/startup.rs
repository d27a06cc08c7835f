//! Startup behaviour of the `gemini-chat` binary.

use std::process::{Command, Output};

fn run_chat(api_key: Option<&str>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gemini-chat"));
    command.env_remove("GOOGLE_API_KEY").env_remove("DEBUG_MODE");
    if let Some(key) = api_key {
        command.env("GOOGLE_API_KEY", key);
    }
    command.output().expect("failed to run gemini-chat")
}

fn assert_refused(output: &Output) {
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("API key missing! Set GOOGLE_API_KEY"),
        "unexpected stderr: {stderr}"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("AI Chat Interface"));
    assert!(!stdout.contains("Getting Started Guide"));
}

#[test]
fn missing_key_exits_before_ui() {
    assert_refused(&run_chat(None));
}

#[test]
fn blank_key_exits_before_ui() {
    assert_refused(&run_chat(Some("   ")));
}

#[test]
fn invalid_arguments_exit_with_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_gemini-chat"))
        .args(["--top-k", "500"])
        .env("GOOGLE_API_KEY", "test-key")
        .output()
        .expect("failed to run gemini-chat");
    assert_eq!(output.status.code(), Some(2));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("AI Chat Interface"));
}
