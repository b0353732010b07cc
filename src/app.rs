// ABOUTME: App orchestrator — wires the agent client and history logger into a chat loop.
// ABOUTME: Reads stdin line by line, dispatches commands, and logs each exchange.

use std::io::Write as _;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::agent::AgentClient;
use crate::config::Config;
use crate::error::{ChatError, Result};
use crate::session::HistoryLogger;

/// What one line of user input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    NewSession,
    History,
    Prompt(String),
}

impl Command {
    /// Classify a trimmed, non-empty input line.
    pub fn parse(input: &str) -> Self {
        match input.to_lowercase().as_str() {
            "quit" | "exit" => Command::Quit,
            "new" => Command::NewSession,
            "history" => Command::History,
            _ => Command::Prompt(input.to_string()),
        }
    }
}

/// Interactive chat application for a hosted Bedrock-style agent.
pub struct ChatApp {
    client: AgentClient,
    logger: HistoryLogger,
    log_dir: PathBuf,
    trace_enabled: bool,
}

impl ChatApp {
    /// Wire up the client and logger from resolved configuration.
    pub fn new(config: &Config, trace_enabled: bool) -> Result<Self> {
        let agent_id = config
            .agent
            .agent_id
            .as_deref()
            .ok_or_else(|| ChatError::Configuration("agent id is not set".to_string()))?;

        let mut client = AgentClient::new(agent_id, &config.agent.alias_id, &config.agent.region)?;
        if let Some(endpoint) = config.agent.endpoint.as_deref() {
            client = client.with_endpoint(endpoint);
        }
        if let Some(api_key) = config.agent.api_key.as_deref() {
            client = client.with_api_key(api_key);
        }

        let logger = HistoryLogger::new(&config.history.dir, Some(client.session_id()))?;

        Ok(Self {
            client,
            logger,
            log_dir: config.history.dir.clone(),
            trace_enabled,
        })
    }

    /// Run the chat loop until quit or end of input.
    ///
    /// Everything is strictly sequential: one line of input, one remote
    /// call, one log write. An invocation failure is reported and the
    /// session carries on with its id and history intact.
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("You: ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break; // EOF
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            match Command::parse(input) {
                Command::Quit => {
                    println!("\nGoodbye! Chat history saved to {}\n", self.logger.log_path().display());
                    break;
                }
                Command::NewSession => self.start_new_session()?,
                Command::History => self.print_history()?,
                Command::Prompt(prompt) => match self.process_message(&prompt).await {
                    Ok(reply) => println!("Agent: {reply}\n"),
                    Err(err) => eprintln!("\nError: {err}\n"),
                },
            }
        }
        Ok(())
    }

    /// Send one prompt, log the exchange, and return the agent's reply.
    async fn process_message(&self, prompt: &str) -> Result<String> {
        println!("\nAgent is thinking...\n");
        let invocation = self.client.invoke(prompt, self.trace_enabled, false).await?;

        if let Some(trace) = &invocation.trace {
            tracing::debug!(records = trace.len(), "trace records received");
        }

        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "session_id".to_string(),
            invocation.session_id.clone().into(),
        );
        if let Err(err) = self
            .logger
            .log_exchange(prompt, &invocation.completion, Some(&metadata))
        {
            // A logging failure should not eat the reply the user is waiting on.
            warn!("failed to log exchange: {err}");
        }

        Ok(invocation.completion)
    }

    /// Rotate the session id and bind a fresh log file to it.
    fn start_new_session(&mut self) -> Result<()> {
        let session_id = self.client.rotate_session();
        self.logger = HistoryLogger::new(&self.log_dir, Some(&session_id))?;
        println!("\nStarted new session: {session_id}");
        println!("New log file: {}\n", self.logger.log_path().display());
        Ok(())
    }

    /// Print the current session's full history.
    fn print_history(&self) -> Result<()> {
        let history = self.logger.read_history()?;
        if history.is_empty() {
            println!("\nNo chat history available.\n");
            return Ok(());
        }

        println!("\n{}", "-".repeat(70));
        println!("Chat History");
        println!("{}", "-".repeat(70));
        for entry in &history {
            println!(
                "[{}] {}:",
                entry.timestamp,
                entry.role.as_str().to_uppercase()
            );
            println!("  {}\n", entry.content);
        }
        println!("{}\n", "-".repeat(70));
        Ok(())
    }

    fn print_welcome(&self) {
        println!("\n{}", "=".repeat(70));
        println!("AWS Bedrock Agent Chat");
        println!("{}", "=".repeat(70));
        println!("Session ID: {}", self.client.session_id());
        println!("Log file: {}", self.logger.log_path().display());
        println!("\nCommands:");
        println!("  - Type your message and press Enter to chat");
        println!("  - Type 'quit' or 'exit' to end the session");
        println!("  - Type 'new' to start a new session");
        println!("  - Type 'history' to view chat history");
        println!("{}\n", "=".repeat(70));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_tokens_are_commands() {
        assert_eq!(Command::parse("quit"), Command::Quit);
        assert_eq!(Command::parse("exit"), Command::Quit);
        assert_eq!(Command::parse("QUIT"), Command::Quit);
        assert_eq!(Command::parse("new"), Command::NewSession);
        assert_eq!(Command::parse("History"), Command::History);
    }

    #[test]
    fn anything_else_is_a_prompt_sent_verbatim() {
        assert_eq!(
            Command::parse("tell me about quitting"),
            Command::Prompt("tell me about quitting".to_string())
        );
        assert_eq!(
            Command::parse("What is new in Rust?"),
            Command::Prompt("What is new in Rust?".to_string())
        );
    }
}
