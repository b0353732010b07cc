// ABOUTME: Entry point for bedrock-chat — an interactive CLI for hosted Bedrock agents.
// ABOUTME: Parses CLI args, layers config, and runs the chat loop.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bedrock_agent_chat::app::ChatApp;
use bedrock_agent_chat::config::Config;

#[derive(Debug, Parser)]
#[command(name = "bedrock-chat", about = "Interactive chat client for AWS Bedrock agents")]
struct Cli {
    /// Bedrock agent id (overrides config and environment).
    #[arg(long)]
    agent_id: Option<String>,

    /// Full Bedrock agent ARN; id and region are parsed from it.
    #[arg(long)]
    agent_arn: Option<String>,

    /// Agent alias id.
    #[arg(long)]
    alias_id: Option<String>,

    /// AWS region of the agent runtime.
    #[arg(long)]
    region: Option<String>,

    /// Agent runtime endpoint override.
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory for chat history log files.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Request diagnostic trace records with every invocation.
    #[arg(long)]
    trace: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load local .env before reading any environment variables.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_env();
    if let Some(agent_id) = cli.agent_id {
        config.agent.agent_id = Some(agent_id);
    }
    if let Some(agent_arn) = cli.agent_arn {
        config.agent.agent_arn = Some(agent_arn);
    }
    if let Some(alias_id) = cli.alias_id {
        config.agent.alias_id = alias_id;
    }
    if let Some(region) = cli.region {
        config.agent.region = region;
    }
    if let Some(endpoint) = cli.endpoint {
        config.agent.endpoint = Some(endpoint);
    }
    if let Some(log_dir) = cli.log_dir {
        config.history.dir = log_dir;
    }
    config.resolve()?;

    let mut app = ChatApp::new(&config, cli.trace)?;
    app.run().await?;
    Ok(())
}
