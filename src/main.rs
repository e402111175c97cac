mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dnsbox::api::{self, ApiConfig, ApiState};
use dnsbox::client::{Client, ClientConfig};
use dnsbox::handlers::record_store_handler::RecordStoreHandle;
use dnsbox::protocol::ResourceType;
use dnsbox::server::{Server, ServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};

use crate::cli::{Args, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse_args();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    match args.command {
        Command::Resolve {
            name,
            rtype,
            server,
            timeout,
        } => {
            let config = ClientConfig {
                server,
                verbose: args.verbose,
            };
            resolve(config, &name, rtype, Duration::from_secs(timeout)).await
        }
        Command::Serve { listen, resolver } => {
            let client = Client::new(client_config(resolver, args.verbose));
            let server = Server::new(ServerConfig { listen }, Arc::new(client))
                .with_cancellation(shutdown_on_ctrl_c());
            server.start().await?;
            Ok(())
        }
        Command::Api { listen, resolver } => {
            let state = ApiState {
                resolver: Arc::new(Client::new(client_config(resolver, args.verbose))),
                store: RecordStoreHandle::new(),
            };
            api::serve(&ApiConfig { listen }, state, shutdown_on_ctrl_c())
                .await
                .with_context(|| format!("API server on {}", listen))
        }
    }
}

fn client_config(resolver: Option<std::net::SocketAddr>, verbose: bool) -> ClientConfig {
    let mut config = ClientConfig {
        verbose,
        ..ClientConfig::default()
    };
    // Default to Google's public DNS
    if let Some(server) = resolver {
        config.server = server;
    }
    config
}

async fn resolve(
    config: ClientConfig,
    name: &str,
    rtype: ResourceType,
    timeout: Duration,
) -> anyhow::Result<()> {
    let client = Client::new(config);
    let received = tokio::time::timeout(timeout, client.resolve(name, rtype))
        .await
        .with_context(|| format!("no reply for {} {} within {:?}", name, rtype, timeout))??;

    println!(";; ANSWER SECTION:");
    for answer in &received.answers {
        println!("{}", answer);
    }
    Ok(())
}

/// Token cancelled on the first Ctrl-C.
fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                trigger.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
    token
}
