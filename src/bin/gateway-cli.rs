use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, HOST};
use reqwest::Method;
use serde_json::{json, Value};
use std::path::PathBuf;
use url::Url;

use api_gateway::lifecycle;
use api_gateway::routing::{Route, RouteTable};
use api_gateway::security::signing;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the API gateway", long_about = None)]
struct Cli {
    /// Gateway configuration file (TOML).
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the configuration and compile the API document
    Check,
    /// List compiled routes
    Routes,
    /// Show which route serves METHOD PATH
    Resolve { method: String, path: String },
    /// Sign a request and print the headers to send
    Sign {
        #[arg(long)]
        key_id: String,
        /// Signing secret; prefer --secret-env
        #[arg(long, conflicts_with = "secret_env")]
        secret: Option<String>,
        /// Environment variable holding the signing secret
        #[arg(long)]
        secret_env: Option<String>,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Body to sign
        #[arg(short, long, default_value = "")]
        data: String,
        /// Full request URL, e.g. http://localhost:8080/choc/case/details/7
        url: String,
        /// Send the signed request and print the response
        #[arg(long)]
        send: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            let loaded = lifecycle::load(&cli.config)?;
            print_json(&json!({
                "ok": true,
                "title": loaded.api.title,
                "version": loaded.api.version,
                "routes": loaded.api.routes.len(),
            }))?;
        }
        Commands::Routes => {
            let loaded = lifecycle::load(&cli.config)?;
            let routes: Vec<Value> = loaded.api.routes.iter().map(describe_route).collect();
            print_json(&Value::Array(routes))?;
        }
        Commands::Resolve { method, path } => {
            let loaded = lifecycle::load(&cli.config)?;
            let table = RouteTable::new(loaded.api.routes);
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            match table.resolve(&method, &path) {
                Ok(resolved) => {
                    let captures: serde_json::Map<String, Value> = resolved
                        .captures
                        .iter()
                        .map(|(name, value)| (name.to_string(), Value::from(value)))
                        .collect();
                    print_json(&json!({
                        "route": describe_route(&resolved.route),
                        "captures": captures,
                    }))?;
                }
                Err(not_found) => {
                    eprintln!("Error: {}", not_found);
                    std::process::exit(1);
                }
            }
        }
        Commands::Sign {
            key_id,
            secret,
            secret_env,
            method,
            data,
            url,
            send,
        } => {
            let secret = match (secret, secret_env) {
                (Some(secret), _) => secret,
                (None, Some(var)) => std::env::var(&var)
                    .map_err(|_| format!("environment variable `{}` is not set", var))?,
                (None, None) => return Err("one of --secret or --secret-env is required".into()),
            };
            let url = Url::parse(&url)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;

            let mut headers = HeaderMap::new();
            headers.insert(HOST, HeaderValue::from_str(&host_header(&url)?)?);
            signing::sign_request(
                &key_id,
                &secret,
                &method,
                url.path(),
                url.query(),
                &mut headers,
                data.as_bytes(),
                chrono::Utc::now(),
            )?;

            if send {
                let res = reqwest::Client::new()
                    .request(method, url)
                    .headers(headers)
                    .body(data)
                    .send()
                    .await?;
                print_response(res).await?;
            } else {
                let printable: serde_json::Map<String, Value> = headers
                    .iter()
                    .filter_map(|(name, value)| {
                        value.to_str().ok().map(|v| (name.to_string(), Value::from(v)))
                    })
                    .collect();
                print_json(&Value::Object(printable))?;
            }
        }
    }

    Ok(())
}

fn describe_route(route: &Route) -> Value {
    json!({
        "id": route.id,
        "summary": route.summary,
        "tags": route.tags,
        "integration": route.integration.kind(),
        "target": route.integration.target(),
        "security": route.security.as_ref().map(|s| s.name()),
        "validator": route.validator.as_ref().map(|v| v.name.as_str()),
        "responses": route
            .responses
            .rules()
            .iter()
            .map(|rule| json!({ "pattern": rule.pattern, "status": rule.spec.status.as_u16() }))
            .collect::<Vec<_>>(),
        "default": route.responses.default_spec().map(|spec| spec.status.as_u16()),
    })
}

fn host_header(url: &Url) -> Result<String, Box<dyn std::error::Error>> {
    let host = url.host_str().ok_or("url has no host")?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => print_json(&json)?,
        Err(_) => println!("{}", text),
    }
    Ok(())
}
