//! CLI command definitions and the interactive chat session

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::config::Config;
use crate::contract::TripContext;
use crate::llm::{LlmClient, Message};
use crate::turn::{Run, TurnCoordinator, TurnRequest};

/// Wayplan - multi-agent travel itinerary planner
#[derive(Parser)]
#[command(
    name = "wayplan",
    about = "Multi-agent travel itinerary planner",
    version,
    after_help = "Logs are written to: ~/.local/share/wayplan/logs/wayplan.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Start an interactive planning chat
    Chat {
        /// First message to send (e.g. "Boston to Miami next month")
        initial_message: Option<String>,
    },

    /// Print the effective configuration
    ShowConfig,
}

/// Interactive planning chat over one trip
pub struct ChatSession {
    coordinator: TurnCoordinator,
    trip_id: String,
    trip_context: Option<TripContext>,
    history: Vec<Message>,
    last_run: Option<Run>,
}

impl ChatSession {
    pub fn new(client: Arc<dyn LlmClient>, config: &Config) -> Self {
        let uuid = uuid::Uuid::now_v7();
        Self {
            coordinator: TurnCoordinator::new(client, config),
            trip_id: format!("{}-trip", &uuid.to_string()[..8]),
            trip_context: None,
            history: Vec::new(),
            last_run: None,
        }
    }

    /// Run the chat main loop
    pub async fn run(&mut self, initial_message: Option<String>) -> Result<()> {
        self.print_welcome();

        if let Some(message) = initial_message {
            println!("{} {}", ">".bright_green(), message);
            self.process_message(&message).await;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input) {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_message(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Safe travels!");
        Ok(())
    }

    async fn process_message(&mut self, message: &str) {
        let request = TurnRequest {
            trip_id: self.trip_id.clone(),
            trip_context: self.trip_context.clone(),
            history: self.history.clone(),
            user_message: message.to_string(),
        };

        match self.coordinator.run_turn(request).await {
            Ok(outcome) => {
                println!();
                println!("{}", outcome.reply);
                println!();

                self.history.push(Message::user(message));
                self.history.push(Message::assistant(&outcome.reply));
                self.trip_context = Some(outcome.trip_context);
                self.last_run = Some(outcome.run);
            }
            Err(failure) => {
                println!();
                println!("{} {}", "Error:".bright_red(), failure.error);
                println!("You can try sending the message again.");
                println!();
                self.last_run = Some(failure.run);
            }
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Wayplan Travel Planner".bright_cyan().bold());
        println!("Tell me about your trip and I'll plan it with you.");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/context" => {
                match &self.trip_context {
                    Some(context) => match serde_json::to_string_pretty(context) {
                        Ok(json) => println!("{}", json),
                        Err(e) => println!("{} {}", "Error:".bright_red(), e),
                    },
                    None => println!("No trip context yet - send a message first."),
                }
                SlashResult::Continue
            }
            "/select" => {
                match (parts.get(1), self.last_run.as_mut()) {
                    (Some(option_id), Some(run)) => match run.select_option(option_id) {
                        Ok(()) => println!("{} Selected {}", "OK".bright_green(), option_id),
                        Err(e) => println!("{} {}", "Error:".bright_red(), e),
                    },
                    (None, _) => println!("Usage: /select <option-id>"),
                    (_, None) => println!("No itinerary options yet."),
                }
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            other => {
                println!("Unknown command: {}. Type /help for help.", other);
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  {}          Show this help", "/help".yellow());
        println!("  {}       Show the current trip context", "/context".yellow());
        println!("  {}  Select an itinerary option", "/select <id>".yellow());
        println!("  {}          Exit the chat", "/quit".yellow());
        println!();
        println!("Anything else is sent to the planner.");
    }
}

enum SlashResult {
    Continue,
    Quit,
}
