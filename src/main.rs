mod agent;
mod config;
mod llm;
mod sandbox;
mod tools;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::agent::AgentRuntime;
use crate::config::Config;
use crate::llm::AnthropicClient;
use crate::sandbox::PathBoundary;
use crate::tools::list_files::ListFilesTool;
use crate::tools::read_file::ReadFileTool;
use crate::tools::run_script::RunScriptTool;
use crate::tools::write_file::WriteFileTool;
use crate::tools::{ToolContext, ToolRegistry};

/// Default configuration path, relative to the invocation directory.
const DEFAULT_CONFIG_PATH: &str = "config/agent.toml";

fn print_help() {
    println!(
        "\
forge-agent v{}

An AI coding agent that works on a local project tree through sandboxed tools.

USAGE:
    forge-agent \"your prompt here\" [OPTIONS]

EXAMPLE:
    forge-agent \"How do I fix the calculator?\"

OPTIONS:
    --verbose          Log rounds, tool calls and token usage
    --config <PATH>    Path to TOML configuration file [default: {DEFAULT_CONFIG_PATH}]
    -h, --help         Print this help message and exit
    -V, --version      Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.

    RUST_LOG              Log level filter for tracing
                          (e.g. debug, forge_agent=debug,warn)
    ANTHROPIC_API_KEY     API key for Anthropic Claude models
                          (from https://console.anthropic.com/)",
        env!("CARGO_PKG_VERSION"),
    );
}

/// Parsed command line: prompt words, verbosity, config path.
struct CliArgs {
    prompt: String,
    verbose: bool,
    config_path: String,
}

/// Hand-rolled argument parsing: every non-flag argument is part of the
/// prompt, so quoting the whole prompt is convenient but not required.
fn parse_args(args: &[String]) -> CliArgs {
    let mut prompt_words: Vec<&str> = Vec::new();
    let mut verbose = false;
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("forge-agent v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--verbose" => verbose = true,
            "--config" => {
                if let Some(path) = iter.next() {
                    config_path = path.clone();
                }
            }
            // Unknown flags are ignored rather than folded into the prompt.
            other if other.starts_with("--") => {}
            other => prompt_words.push(other),
        }
    }

    CliArgs {
        prompt: prompt_words.join(" "),
        verbose,
        config_path,
    }
}

/// Wires one session together and runs it to completion.
async fn run_session(config: Config, prompt: &str) -> Result<String> {
    let boundary = PathBoundary::new(&config.sandbox.root).with_context(|| {
        format!(
            "cannot open sandbox root {}",
            config.sandbox.root.display()
        )
    })?;

    info!("Agent: {}", config.agent.name);
    info!("LLM: {} ({})", config.llm.provider, config.llm.model);
    info!("Sandbox root: {}", boundary.root().display());

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ListFilesTool))?;
    registry.register(Arc::new(ReadFileTool))?;
    registry.register(Arc::new(WriteFileTool))?;
    registry.register(Arc::new(RunScriptTool))?;
    info!("Tools: {} registered", registry.len());

    let context = ToolContext {
        boundary,
        read_limit: config.sandbox.read_limit,
        exec_timeout: Duration::from_secs(config.sandbox.exec_timeout_secs),
    };

    let llm = AnthropicClient::new(config.llm.clone());
    let runtime = AgentRuntime::new(Box::new(llm), registry, context, config.agent.max_rounds);
    runtime.run(prompt).await
}

#[tokio::main]
async fn main() {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw);

    if args.prompt.trim().is_empty() {
        println!(
            "\
forge-agent — AI coding agent

Usage: forge-agent \"your prompt here\" [--verbose]
Example: forge-agent \"How do I fix the calculator?\""
        );
        std::process::exit(1);
    }

    // --verbose raises the default filter to debug; RUST_LOG still wins.
    let default_filter = if args.verbose {
        "forge_agent=debug"
    } else {
        "forge_agent=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match Config::load(&args.config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    if !config.has_credential() {
        eprintln!(
            "Configuration error: no API key configured — set ANTHROPIC_API_KEY or edit {}",
            args.config_path
        );
        std::process::exit(1);
    }

    match run_session(config, &args.prompt).await {
        Ok(text) => {
            println!("Final response:");
            println!("{text}");
        }
        Err(e) => {
            eprintln!("Unexpected error: {e:#}");
            std::process::exit(1);
        }
    }
}
