//! agentspacectl - Control CLI for the Agentspace registry server
//!
//! Lists apps and reasoning engines and manages the agents of an app
//! through a running server's JSON API.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use agentspace::registry::{CreateAgent, UpdateAgent};

const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "Error: {err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let client = RegistryClient::new(&cli.server);

    match cli.command {
        Command::Status => handle_status(&client, cli.json).await,
        Command::Apps => handle_apps(&client, cli.json).await,
        Command::Agents(args) => handle_agents(&client, args, cli.json).await,
        Command::ReasoningEngines { project, location } => {
            handle_reasoning_engines(&client, &project, location.as_deref(), cli.json).await
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "agentspacectl",
    author,
    version,
    about = "Control CLI for the Agentspace registry - list apps and manage agents."
)]
struct Cli {
    /// Registry server URL
    #[arg(long, short = 's', default_value = DEFAULT_SERVER_URL, env = "AGENTSPACE_SERVER_URL")]
    server: String,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check server status
    Status,

    /// List the Agentspace apps of the server's project
    Apps,

    /// Manage the agents of an app
    Agents(AgentsArgs),

    /// List deployed reasoning engines
    ReasoningEngines {
        /// GCP project id
        #[arg(long, env = "AGENTSPACE_PROJECT_ID")]
        project: String,
        /// Vertex AI region (server default when omitted)
        #[arg(long)]
        location: Option<String>,
    },
}

#[derive(Debug, Args)]
struct AgentsArgs {
    /// GCP project id
    #[arg(long, env = "AGENTSPACE_PROJECT_ID")]
    project: String,

    /// Agentspace app (engine) id
    #[arg(long, env = "AGENTSPACE_APP_ID")]
    app: String,

    #[command(subcommand)]
    command: AgentCommand,
}

#[derive(Debug, Subcommand)]
enum AgentCommand {
    /// List all agents
    List,
    /// Get agent details
    Get {
        /// Agent id
        id: String,
    },
    /// Find an agent by exact display name
    Find {
        /// Display name
        name: String,
    },
    /// Register an ADK deployment as an agent
    Create {
        #[arg(long)]
        display_name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        tool_description: String,
        /// Reasoning engine id of the ADK deployment
        #[arg(long)]
        deployment: String,
        /// Authorization id
        #[arg(long)]
        auth: Option<String>,
        #[arg(long)]
        icon_uri: Option<String>,
    },
    /// Change an agent; omitted fields keep their value
    Update {
        /// Agent id
        id: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        tool_description: Option<String>,
        /// Full reasoning engine resource name, stored as given
        #[arg(long)]
        reasoning_engine: Option<String>,
        /// Full authorization resource name, stored as given
        #[arg(long)]
        auth: Option<String>,
        #[arg(long)]
        icon_uri: Option<String>,
    },
    /// Delete an agent
    Delete {
        /// Agent id
        id: String,
    },
}

/// HTTP client for communicating with the registry server
struct RegistryClient {
    base_url: String,
    client: reqwest::Client,
}

impl RegistryClient {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        self.client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .context("sending request to server")
    }

    async fn send_json<T: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        self.client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .context("sending request to server")
    }

    async fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        self.client
            .delete(self.url(path))
            .query(query)
            .send()
            .await
            .context("sending request to server")
    }
}

/// Parse a JSON body, turning error responses into an error.
async fn read_json(response: reqwest::Response, action: &str) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.context("reading response body")?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["error"].as_str().map(str::to_string))
            .unwrap_or(body);
        bail!("Failed to {action} ({status}): {message}");
    }
    serde_json::from_str(&body).context("parsing server response")
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn short_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn print_agent(agent: &Value) {
    let definition = &agent["adkAgentDefinition"];
    println!("Agent: {}", short_id(agent["name"].as_str().unwrap_or("-")));
    println!("  Display name: {}", agent["displayName"].as_str().unwrap_or("-"));
    println!("  Description: {}", agent["description"].as_str().unwrap_or("-"));
    println!(
        "  Tool description: {}",
        definition["toolSettings"]["toolDescription"]
            .as_str()
            .unwrap_or("-")
    );
    println!(
        "  Reasoning engine: {}",
        definition["provisionedReasoningEngine"]["reasoningEngine"]
            .as_str()
            .unwrap_or("-")
    );
    if let Some(auths) = definition["authorizations"].as_array() {
        for auth in auths {
            println!("  Authorization: {}", auth.as_str().unwrap_or("-"));
        }
    }
    if let Some(uri) = agent["icon"]["uri"].as_str() {
        println!("  Icon: {uri}");
    }
}

async fn handle_status(client: &RegistryClient, json: bool) -> Result<()> {
    let response = client.get("/health", &[]).await?;

    if response.status().is_success() {
        let health: Value = response.json().await.unwrap_or(Value::Null);
        if json {
            print_json(&serde_json::json!({
                "status": "ok",
                "server": client.base_url,
                "version": health["version"],
            }))?;
        } else {
            println!(
                "Server is running at {} (version {})",
                client.base_url,
                health["version"].as_str().unwrap_or("unknown")
            );
        }
    } else if json {
        print_json(&serde_json::json!({
            "status": "error",
            "code": response.status().as_u16(),
        }))?;
    } else {
        println!("Server returned error: {}", response.status());
    }
    Ok(())
}

async fn handle_apps(client: &RegistryClient, json: bool) -> Result<()> {
    let response = client.get("/api/as-agents", &[]).await?;
    let apps = read_json(response, "list apps").await?;
    if json {
        return print_json(&apps);
    }

    println!("{:<30} {:<30} {:<24}", "APP_ID", "DISPLAY_NAME", "SOLUTION_TYPE");
    println!("{}", "-".repeat(86));
    for app in apps.as_array().into_iter().flatten() {
        println!(
            "{:<30} {:<30} {:<24}",
            short_id(app["name"].as_str().unwrap_or("-")),
            app["displayName"].as_str().unwrap_or("-"),
            app["solutionType"].as_str().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn handle_reasoning_engines(
    client: &RegistryClient,
    project: &str,
    location: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut query = vec![("project_id", project)];
    if let Some(location) = location {
        query.push(("location_id", location));
    }
    let response = client
        .get("/api/as-agents/list-reasoning-engines", &query)
        .await?;
    let engines = read_json(response, "list reasoning engines").await?;
    if json {
        return print_json(&engines);
    }

    println!(
        "{:<22} {:<30} {:<24} {:<24}",
        "ID", "DISPLAY_NAME", "CREATED", "UPDATED"
    );
    println!("{}", "-".repeat(102));
    for engine in engines.as_array().into_iter().flatten() {
        println!(
            "{:<22} {:<30} {:<24} {:<24}",
            engine["name"].as_str().unwrap_or("-"),
            engine["display_name"].as_str().unwrap_or("-"),
            engine["create_time"].as_str().unwrap_or("-"),
            engine["update_time"].as_str().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn handle_agents(client: &RegistryClient, args: AgentsArgs, json: bool) -> Result<()> {
    let project = args.project.as_str();
    let app = args.app.as_str();

    match args.command {
        AgentCommand::List => {
            let response = client
                .get(
                    "/api/as-agents/list-agents",
                    &[("project_id", project), ("app_id", app)],
                )
                .await?;
            let body = read_json(response, "list agents").await?;
            if json {
                return print_json(&body);
            }
            println!("{:<22} {:<30} {:<40}", "ID", "DISPLAY_NAME", "DESCRIPTION");
            println!("{}", "-".repeat(94));
            for agent in body["agents"].as_array().into_iter().flatten() {
                println!(
                    "{:<22} {:<30} {:<40}",
                    short_id(agent["name"].as_str().unwrap_or("-")),
                    agent["displayName"].as_str().unwrap_or("-"),
                    agent["description"].as_str().unwrap_or("-"),
                );
            }
        }
        AgentCommand::Get { id } => {
            let response = client
                .get(
                    "/api/as-agents/get-agent",
                    &[("project_id", project), ("app_id", app), ("agent_id", id.as_str())],
                )
                .await?;
            let body = read_json(response, "get agent").await?;
            if json {
                return print_json(&body);
            }
            print_agent(&body["agent_details"]);
        }
        AgentCommand::Find { name } => {
            let response = client
                .get(
                    "/api/as-agents/get-agent-by-name",
                    &[
                        ("project_id", project),
                        ("app_id", app),
                        ("display_name", name.as_str()),
                    ],
                )
                .await?;
            let body = read_json(response, "find agent").await?;
            if json {
                return print_json(&body);
            }
            match body.get("agent") {
                Some(agent) => print_agent(agent),
                None => println!("{}", body["message"].as_str().unwrap_or("Not found")),
            }
        }
        AgentCommand::Create {
            display_name,
            description,
            tool_description,
            deployment,
            auth,
            icon_uri,
        } => {
            let request = CreateAgent {
                project_id: args.project.clone(),
                app_id: args.app.clone(),
                display_name,
                description,
                tool_description,
                adk_deployment_id: deployment,
                auth_id: auth,
                icon_uri,
            };
            let response = client
                .send_json(reqwest::Method::POST, "/api/as-agents/add-agent", &request)
                .await?;
            let body = read_json(response, "create agent").await?;
            if json {
                return print_json(&body);
            }
            println!(
                "Agent {} created",
                short_id(body["data"]["name"].as_str().unwrap_or("-"))
            );
        }
        AgentCommand::Update {
            id,
            display_name,
            description,
            tool_description,
            reasoning_engine,
            auth,
            icon_uri,
        } => {
            let request = UpdateAgent {
                project_id: args.project.clone(),
                app_id: args.app.clone(),
                agent_id: id.clone(),
                display_name,
                description,
                tool_description,
                adk_deployment_id: reasoning_engine,
                auth_id: auth,
                icon_uri,
            };
            let response = client
                .send_json(reqwest::Method::PUT, "/api/as-agents/update-agent", &request)
                .await?;
            let body = read_json(response, "update agent").await?;
            if json {
                return print_json(&body);
            }
            println!("Agent {id} updated");
        }
        AgentCommand::Delete { id } => {
            let response = client
                .delete(
                    "/api/as-agents/delete-agent",
                    &[("project_id", project), ("app_id", app), ("agent_id", id.as_str())],
                )
                .await?;
            let body = read_json(response, "delete agent").await?;
            if json {
                return print_json(&body);
            }
            println!("{}", body["message"].as_str().unwrap_or("Agent deleted"));
        }
    }
    Ok(())
}
