// crates/tool-gateway-cli/src/main.rs
// ============================================================================
// Module: Tool Gateway CLI Entry Point
// Description: Command dispatcher for the gateway server and offline checks.
// Purpose: Run the HTTP gateway and inspect its policy and contract schemas.
// Dependencies: clap, tokio, tool-gateway-{config,core,server}, tracing-subscriber
// ============================================================================

//! ## Overview
//! `tool-gateway serve` loads configuration from the environment and runs the
//! HTTP gateway until Ctrl-C. `check-host` evaluates the configured allowlist
//! without network access and `schema` prints a published contract schema.
//! Diagnostics go to stderr as JSON lines; audit events use their own sink.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use thiserror::Error;
use tool_gateway_config::GatewayConfig;
use tool_gateway_core::PolicyEngine;
use tool_gateway_core::ToolName;
use tool_gateway_core::contract::SchemaKind;
use tool_gateway_core::contract::tool_schema;
use tool_gateway_core::target_hostname;
use tool_gateway_server::GatewayServer;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the diagnostics filter.
const LOG_ENV: &str = "TOOL_GATEWAY_LOG";
/// Filter used when [`LOG_ENV`] is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tool-gateway", version, about = "Policy-enforcing gateway for agent web tools")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve(ServeCommand),
    /// Report whether the configured allowlist admits a hostname.
    CheckHost(CheckHostCommand),
    /// Print a tool contract schema.
    Schema(SchemaCommand),
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Listen address (overrides `TOOL_GATEWAY_BIND`).
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,
}

/// Configuration for the `check-host` command.
#[derive(Args, Debug)]
struct CheckHostCommand {
    /// Hostname or absolute URL to evaluate.
    #[arg(value_name = "HOSTNAME")]
    target: String,
}

/// Configuration for the `schema` command.
#[derive(Args, Debug)]
struct SchemaCommand {
    /// Tool whose schema to print.
    #[arg(value_enum)]
    tool: ToolArg,
    /// Request or response side.
    #[arg(value_enum)]
    kind: SchemaKindArg,
}

/// Tool selector for CLI arguments.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ToolArg {
    /// `web.fetch`.
    #[value(name = "web.fetch")]
    WebFetch,
    /// `web.search`.
    #[value(name = "web.search")]
    WebSearch,
}

impl From<ToolArg> for ToolName {
    fn from(value: ToolArg) -> Self {
        match value {
            ToolArg::WebFetch => Self::WebFetch,
            ToolArg::WebSearch => Self::WebSearch,
        }
    }
}

/// Schema side selector for CLI arguments.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaKindArg {
    /// Request body schema.
    Request,
    /// Response envelope schema.
    Response,
}

impl From<SchemaKindArg> for SchemaKind {
    fn from(value: SchemaKindArg) -> Self {
        match value {
            SchemaKindArg::Request => Self::Request,
            SchemaKindArg::Response => Self::Response,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_logging()?;
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::CheckHost(command) => command_check_host(&command),
        Commands::Schema(command) => command_schema(&command),
    }
}

/// Installs the JSON diagnostics subscriber on stderr.
fn init_logging() -> CliResult<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .map_err(|err| CliError::new(format!("invalid log filter: {err}")))?;
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| CliError::new(format!("logging init failed: {err}")))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let mut config = load_config()?;
    if let Some(bind) = command.bind {
        config.bind = bind;
    }
    let server = tokio::task::spawn_blocking(move || GatewayServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    tracing::info!("tool gateway stopped");
    Ok(ExitCode::SUCCESS)
}

/// Executes the `check-host` command.
fn command_check_host(command: &CheckHostCommand) -> CliResult<ExitCode> {
    let config = load_config()?;
    let policy = PolicyEngine::load(config.allowlist)
        .map_err(|err| CliError::new(format!("allowlist load failed: {err}")))?;
    let Some(hostname) = resolve_host(&command.target) else {
        return Err(CliError::new(format!("no hostname in '{}'", command.target)));
    };
    let allowed = policy.is_allowed_host(&hostname);
    write_stdout_line(&host_verdict(&hostname, allowed))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(if allowed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Executes the `schema` command.
fn command_schema(command: &SchemaCommand) -> CliResult<ExitCode> {
    let schema = tool_schema(command.tool.into(), command.kind.into());
    let rendered = serde_json::to_string_pretty(&schema)
        .map_err(|err| CliError::new(format!("schema render failed: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads gateway configuration from the process environment.
fn load_config() -> CliResult<GatewayConfig> {
    GatewayConfig::from_env().map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Extracts a lowercase hostname from a bare host or absolute URL.
fn resolve_host(target: &str) -> Option<String> {
    let target = target.trim();
    if target.contains("://") {
        return target_hostname(target);
    }
    target_hostname(&format!("http://{target}"))
}

/// Formats the `check-host` verdict line.
fn host_verdict(hostname: &str, allowed: bool) -> String {
    let verdict = if allowed { "allow" } else { "deny" };
    format!("{verdict} {hostname}")
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
