//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use api_gateway::config::GatewayConfig;
use api_gateway::document::{compile, parse_document};
use api_gateway::http::HttpServer;
use api_gateway::lifecycle::{build_engine, Shutdown};

pub const API_DOCUMENT: &str = include_str!("../../config/api.yaml");
pub const API_KEY: &str = "k-test-123";
pub const ZOHO_TOKEN: &str = "SECURE_ZOHO_KEY";
pub const SIGNING_KEY_ID: &str = "choc-operator";
pub const SIGNING_SECRET: &str = "s3cr3t";

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Request target: path plus query.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What the mock backend answers.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

pub fn reply(status: u16, body: &str) -> Reply {
    Reply {
        status,
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: body.to_string(),
    }
}

impl Reply {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Handle to a running mock backend.
pub struct Backend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Backend {
    /// Base URL with a trailing slash, as the API document expects.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("backend received no request")
    }
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F>(f: F) -> Backend
where
    F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let f = f.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let _ = handle_connection(socket, f, recorded).await;
            });
        }
    });

    Backend { addr, requests }
}

async fn handle_connection<F>(
    socket: TcpStream,
    f: Arc<F>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) -> std::io::Result<()>
where
    F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
{
    let mut reader = BufReader::new(socket);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).await?;

    let request = RecordedRequest {
        method,
        target,
        headers,
        body,
    };
    let reply = f(&request);
    recorded.lock().unwrap().push(request);

    let mut response = format!("HTTP/1.1 {} {}\r\n", reply.status, reason(reply.status));
    for (name, value) in &reply.headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.body.len(),
        reply.body
    ));

    let mut socket = reader.into_inner();
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    Ok(())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        411 => "Length Required",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway configuration with every document variable pointing at `base`.
pub fn test_config(base: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.upstream_secs = 5;
    config.timeouts.request_secs = 10;
    config.variables = BTreeMap::from([
        ("choc_api_url".to_string(), base.to_string()),
        ("ledger_app_api_url".to_string(), base.to_string()),
        ("tally_app_api_url".to_string(), base.to_string()),
        ("zoho_app_api_url".to_string(), base.to_string()),
        ("zoho_inventory_url".to_string(), format!("{}api/v1/", base)),
        ("zoho_auth_token".to_string(), ZOHO_TOKEN.to_string()),
        ("zoho_organization_id".to_string(), "112".to_string()),
    ]);
    config.credentials.api_keys.push(api_gateway::config::ApiKeyConfig {
        name: "partner".to_string(),
        value: Some(API_KEY.to_string()),
        value_env: None,
    });
    config.credentials.signing_keys.push(api_gateway::config::SigningKeyConfig {
        access_key_id: SIGNING_KEY_ID.to_string(),
        secret: Some(SIGNING_SECRET.to_string()),
        secret_env: None,
    });
    config
}

/// The sample document compiled into a router, for in-process tests.
pub fn build_router(config: &GatewayConfig) -> axum::Router {
    let doc = parse_document(API_DOCUMENT).unwrap();
    let api = compile(&doc, &config.variables).unwrap();
    let engine = build_engine(config, api.routes).unwrap();
    HttpServer::new(config, Arc::new(engine)).into_router()
}

/// Running gateway; dropping it does not stop the server, call `stop`.
pub struct Gateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Serve the sample document over real TCP.
pub async fn start_gateway(config: GatewayConfig) -> Gateway {
    let doc = parse_document(API_DOCUMENT).unwrap();
    let api = compile(&doc, &config.variables).unwrap();
    let engine = build_engine(&config, api.routes).unwrap();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, Arc::new(engine));
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    Gateway { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
