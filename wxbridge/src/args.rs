use std::path::PathBuf;

use clap::Parser;

/// Chat with a watsonx.ai foundation model
#[derive(Debug, Parser)]
#[command(name = "wxbridge", about = "Send a prompt to a watsonx.ai chat model")]
pub struct Args {
    /// Path to configuration file; without one, `WATSONX_*` environment
    /// variables are used
    #[arg(short, long, env = "WXBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// System instruction sent before the prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Print the reply as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Offer the model a local `get_weather` tool
    #[arg(long)]
    pub weather: bool,

    /// Prompt to send
    pub prompt: String,
}
