mod config;

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use tandem_core::{spawn_hub, HubConfig, SignalHub};
use tandem_gateway::{start_server, GatewayState, SessionRegistry};
use tandem_logging::init_logger;

use config::Config;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "tandem: rendezvous and signaling relay for two-party real-time sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the signaling server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
        /// Tell a connection when its partner leaves
        #[arg(long)]
        notify_partner_left: bool,
    },
    /// Show matchmaking status of a running server
    Status {
        /// Port the server is listening on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    init_logger(&config.log_level, config.log_dir.as_deref());

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            bind,
            notify_partner_left,
        } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                bind_address: bind.unwrap_or(config.bind_address),
                notify_partner_on_leave: notify_partner_left || config.notify_partner_on_leave,
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status { port } => {
            let port = port.unwrap_or(config.port);
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{port}/api/status"))
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await?;
                    println!("{}", describe_status(status, &body));
                }
                Err(_) => {
                    println!("tandem is not running on port {port}");
                }
            }
        }
    }

    Ok(())
}

/// Render a `/api/status` reply for the terminal.
fn describe_status(status: reqwest::StatusCode, body: &str) -> String {
    if !status.is_success() {
        return format!("tandem responded with {status}; the signal hub may be down");
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string()),
        Err(_) => format!("unexpected status reply: {body}"),
    }
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        ws_path = %config.ws_path,
        notify_partner_on_leave = config.notify_partner_on_leave,
        "Starting tandem"
    );

    let ip: IpAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.bind_address))?;
    let addr = SocketAddr::new(ip, config.port);

    let sessions = SessionRegistry::new();
    let hub = SignalHub::new(
        HubConfig {
            notify_partner_on_leave: config.notify_partner_on_leave,
        },
        sessions.clone(),
    );
    let (handle, hub_task) = spawn_hub(hub, config.hub_buffer);

    let state = GatewayState::new(handle, sessions);
    let served = start_server(addr, &config.ws_path, state).await;

    // Upgraded sockets may still hold hub handles; stop the hub explicitly.
    hub_task.abort();
    if let Err(e) = &served {
        warn!(error = %e, "Gateway exited with error");
    }
    served
}
