//! Interactive chat application for conversing with Gemini.
//!
//! This binary provides a streaming REPL interface for chatting with Gemini
//! models via the Google Generative Language API.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! GOOGLE_API_KEY=... gemini-chat
//!
//! # Specify a model and temperature
//! gemini-chat --model gemini-exp-1206 --temperature 0.2
//!
//! # Show the debug panel and log API traffic to stderr
//! DEBUG_MODE=True gemini-chat
//!
//! # Disable colors (useful for piping output)
//! gemini-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/model <name|n>` - Change the model
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application
//!
//! Press Ctrl-C while a response is streaming to stop it.

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use geminichat::chat::view::STOP_HINT;
use geminichat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, banner,
    help_text, parse_command, render_view,
};
use geminichat::{Gemini, ModelId, StderrLogger, api_key_from_env};

/// Main entry point for the gemini-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("gemini-chat [OPTIONS]");
    let config = match ChatConfig::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    // Nothing is shown until the credential is known to be present.
    let api_key = match api_key_from_env() {
        Ok(key) => key,
        Err(_) => {
            eprintln!("API key missing! Set GOOGLE_API_KEY");
            std::process::exit(1);
        }
    };

    let mut client = Gemini::with_options(Some(api_key), config.base_url.clone(), config.timeout)?;
    if config.debug {
        client = client.with_logger(Arc::new(StderrLogger::new()));
    }

    let use_color = config.use_color;
    let mut session = ChatSession::new(client, config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Ctrl-C while streaming stops the response; at the prompt rustyline
    // reports it as `Interrupted` instead.
    let stop = session.stop_handle();
    ctrlc::set_handler(move || {
        stop.request_stop();
    })?;

    println!("{}\n", banner());
    println!("Model: {}", session.model().display_name());
    println!("Type /help for commands, /quit to exit\n");
    print_view(&session);

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Conversation cleared.");
                            print_view(&session);
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Model(model) => {
                            session.set_model(model);
                            renderer.print_info(&format!(
                                "Model changed to: {} ({})",
                                model.display_name(),
                                model
                            ));
                        }
                        ChatCommand::Models => {
                            print_models(session.model());
                        }
                        ChatCommand::Temperature(value) => {
                            match session.set_temperature(value) {
                                Ok(()) => {
                                    renderer.print_info(&format!("temperature set to {value:.2}"))
                                }
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::TopK(value) => match session.set_top_k(value) {
                            Ok(()) => renderer.print_info(&format!("top_k set to {value}")),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::TopP(value) => match session.set_top_p(value) {
                            Ok(()) => renderer.print_info(&format!("top_p set to {value:.2}")),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::MaxTokens(value) => {
                            match session.set_max_output_tokens(value) {
                                Ok(()) => {
                                    renderer.print_info(&format!("max_tokens set to {value}"))
                                }
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Config => {
                            print_config(&session);
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Debug => {
                            let enabled = session.toggle_debug();
                            renderer.print_info(if enabled {
                                "Debug panel enabled."
                            } else {
                                "Debug panel disabled."
                            });
                            print_view(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to API
                renderer.print_info(STOP_HINT);
                match session.submit(line, &mut renderer).await {
                    Ok(_) => {}
                    Err(err) => renderer.print_error(&err.to_string()),
                }
                print_view(&session);
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_view(session: &ChatSession<Gemini>) {
    let view = render_view(session.state(), session.config());
    if !view.is_empty() {
        println!("{view}\n");
    }
}

fn print_models(current: ModelId) {
    println!("    Available models:");
    for (index, model) in ModelId::ALL.into_iter().enumerate() {
        let marker = if model == current { "*" } else { " " };
        println!(
            "    {marker} {}. {} ({})",
            index + 1,
            model.display_name(),
            model
        );
        println!("         {}", model.description());
    }
}

fn print_stats(session: &ChatSession<Gemini>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model.display_name());
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Responses: {} completed / {} stopped / {} failed",
        stats.completed_cycles, stats.cancelled_cycles, stats.failed_cycles
    );
}

fn print_config(session: &ChatSession<Gemini>) {
    let stats = session.stats();
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Model: {} ({})", stats.model.display_name(), stats.model);
    println!("      Temperature: {:.2}", stats.temperature);
    println!("      Top-k: {}", stats.top_k);
    println!("      Top-p: {:.2}", stats.top_p);
    println!("      Max tokens: {}", stats.max_output_tokens);
    println!("      Pacing: {}ms", config.pacing.as_millis());
    println!(
        "      Debug panel: {}",
        if config.debug { "shown" } else { "hidden" }
    );
}
