#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod weather;

use std::io::Write;
use std::sync::Arc;

use args::Args;
use clap::Parser;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use weather::WeatherTool;
use wxbridge_config::{Config, WatsonxConfig};
use wxbridge_llm::{
    CreateContent, CreateOptions, CreateResult, FunctionCall, FunctionExecutionResult, LlmError, LlmMessage,
    StreamItem, Tool, ToolDescriptor, WatsonxClient,
};

/// Call/result rounds allowed before giving up on a text answer
const MAX_TOOL_ROUNDS: usize = 5;

/// Source label for messages this binary adds to the conversation
const AGENT: &str = "wxbridge";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let (watsonx, telemetry) = match &args.config {
        Some(path) => {
            let config = Config::load(path)?;
            (config.watsonx, config.telemetry)
        }
        None => (WatsonxConfig::from_env()?, None),
    };

    // Initialize telemetry
    wxbridge_telemetry::init(telemetry.as_ref(), "warn")?;

    let client = WatsonxClient::new(watsonx)?;

    tracing::info!(
        model_id = %client.config().model_id,
        stream = args.stream,
        weather = args.weather,
        "starting wxbridge"
    );

    // Ctrl-C abandons the request in flight
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    let outcome = converse(&client, &args, &CreateOptions::with_cancellation(shutdown)).await;

    let usage = client.total_usage();
    eprintln!(
        "tokens used: {} prompt, {} completion",
        usage.prompt_tokens, usage.completion_tokens
    );

    outcome
}

/// Send the prompt and answer tool calls until the model replies in text
async fn converse(client: &WatsonxClient, args: &Args, options: &CreateOptions) -> anyhow::Result<()> {
    let weather: Arc<dyn Tool> = Arc::new(WeatherTool);
    let tools: Vec<ToolDescriptor> = if args.weather {
        vec![Arc::clone(&weather).into()]
    } else {
        Vec::new()
    };

    let mut conversation = Vec::new();
    if let Some(system) = &args.system {
        conversation.push(LlmMessage::system(system.as_str()));
    }
    conversation.push(LlmMessage::user(args.prompt.as_str(), "user"));

    for round in 1..=MAX_TOOL_ROUNDS {
        let reply = if args.stream {
            stream_reply(client, &conversation, &tools, options).await
        } else {
            client.create(&conversation, &tools, options).await.map(Some)
        };

        let result = match reply {
            Ok(Some(result)) => result,
            Ok(None) | Err(LlmError::Cancelled) => {
                tracing::info!("request cancelled");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let calls = match result.content {
            CreateContent::Text(text) => {
                if !args.stream {
                    println!("{text}");
                }
                return Ok(());
            }
            CreateContent::FunctionCalls(calls) => calls,
        };

        tracing::info!(round, calls = calls.len(), "model requested tool calls");

        let mut results = Vec::with_capacity(calls.len());
        for call in &calls {
            results.push(FunctionExecutionResult::new(
                run_tool(weather.as_ref(), call).await,
                call.id.clone(),
            ));
        }

        conversation.push(LlmMessage::function_calls(calls, AGENT));
        conversation.push(LlmMessage::tool_results(results));
    }

    anyhow::bail!("no text answer after {MAX_TOOL_ROUNDS} tool rounds")
}

/// Print fragments as they arrive and return the final result, or `None` if
/// the stream was cancelled
async fn stream_reply(
    client: &WatsonxClient,
    conversation: &[LlmMessage],
    tools: &[ToolDescriptor],
    options: &CreateOptions,
) -> Result<Option<CreateResult>, LlmError> {
    let mut stream = client.create_stream(conversation, tools, options).await?;
    let mut stdout = std::io::stdout();
    let mut printed = false;

    while let Some(item) = stream.next().await {
        match item? {
            StreamItem::Text(fragment) => {
                print!("{fragment}");
                stdout.flush().ok();
                printed = true;
            }
            StreamItem::Done(result) => {
                if printed {
                    println!();
                }
                return Ok(Some(result));
            }
        }
    }

    if printed {
        println!();
    }
    Ok(None)
}

/// Run a requested call, reporting failures back to the model as text
async fn run_tool(tool: &dyn Tool, call: &FunctionCall) -> String {
    if call.name != tool.schema().name {
        tracing::warn!(name = %call.name, "model called an unknown tool");
        return format!("error: unknown tool '{}'", call.name);
    }

    match tool.run(&call.arguments).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(name = %call.name, error = %e, "tool call failed");
            format!("error: {e}")
        }
    }
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
