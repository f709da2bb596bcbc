//! `agentreg` - inspect an agent catalog and route tasks through it.
//!
//! Agents come from the `[[agents]]` tables of the configuration file. Each
//! one is registered with an echo handler that reports what it was asked to
//! do, which makes the binary useful for checking how tasks are routed.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use agentreg::agents::{AgentCapabilities, AgentContext, AgentHandler, AgentResult, AgentSchema};
use agentreg::cli::{agents_table, display_error_with_suggestions, print_result, statistics_table};
use agentreg::config::{ConfigurationLoader, EnvironmentLoader};
use agentreg::orchestration::{ExecutionOptions, OrchestrationRequest, RegistryOrchestrator};
use agentreg::registry::Parameters;
use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "agentreg", version, about = "Route tasks through a catalog of agents")]
struct Cli {
    /// Configuration file (defaults to config/agentreg.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Environment file loaded before reading overrides
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the agents in the catalog
    Agents,
    /// Run a task on the best matching agent
    Run {
        /// Task name, matched against agent capabilities
        task: String,
        /// Task parameter as key=value; the value is parsed as JSON when possible
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
        /// User id recorded on the session
        #[arg(short, long)]
        user: Option<String>,
        /// Do not fall back to utility agents
        #[arg(long)]
        no_fallback: bool,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show registry and session statistics
    Stats,
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Handler registered for every catalog agent.
struct EchoAgent {
    capabilities: Vec<String>,
}

#[async_trait]
impl AgentHandler for EchoAgent {
    async fn execute(&self, context: &AgentContext) -> Result<AgentResult> {
        Ok(AgentResult::ok(json!({
            "agent": context.agent_id,
            "task": context.task,
            "parameters": context.parameters,
            "priority": context.priority,
        })))
    }

    fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::for_tasks(self.capabilities.iter().cloned())
    }
}

async fn build_orchestrator(cli: &Cli) -> Result<RegistryOrchestrator> {
    let env = EnvironmentLoader::new(cli.env_file.as_deref());
    let mut loader = ConfigurationLoader::new(cli.config.as_deref())?;
    loader.apply_environment(&env);
    let config = loader.config;

    let orchestrator = RegistryOrchestrator::from_config(config.orchestrator_config());

    #[cfg(feature = "observability")]
    {
        let log = agentreg::observability::ActivityLog::new(
            Some(std::path::Path::new(&config.logging.log_file)),
            Some(&config.logging.log_level),
        )?;
        orchestrator.add_observer(Arc::new(log));
    }

    for schema in config.agents {
        register_catalog_agent(&orchestrator, schema).await?;
    }
    Ok(orchestrator)
}

async fn register_catalog_agent(
    orchestrator: &RegistryOrchestrator,
    schema: AgentSchema,
) -> Result<()> {
    let id = schema.id.clone();
    let handler = Arc::new(EchoAgent {
        capabilities: schema.capabilities.clone(),
    });
    orchestrator
        .register_agent(schema, handler)
        .await
        .with_context(|| format!("Failed to register agent '{}' from config", id))?;
    Ok(())
}

async fn run(cli: Cli) -> Result<bool> {
    let orchestrator = build_orchestrator(&cli).await?;

    match cli.command {
        Commands::Agents => {
            println!("{}", agents_table(&orchestrator.get_available_agents(None)));
            Ok(true)
        }
        Commands::Run {
            task,
            params,
            user,
            no_fallback,
            json,
        } => {
            let parameters: Parameters = params.into_iter().collect();
            let mut request = OrchestrationRequest::new(task).with_parameters(parameters);
            if no_fallback {
                request = request.with_options(ExecutionOptions {
                    allow_fallback: Some(false),
                    ..Default::default()
                });
            }

            let result = orchestrator.execute_task(request, user.as_deref()).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            Ok(result.success)
        }
        Commands::Stats => {
            println!("{}", statistics_table(&orchestrator.get_system_statistics()));
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            display_error_with_suggestions(&format!("{:#}", e), "agentreg failed");
            ExitCode::FAILURE
        }
    }
}
