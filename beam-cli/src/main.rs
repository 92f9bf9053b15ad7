use anyhow::{Context, Result, bail};
use beam_core::IceServerConfig;
use beam_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use beam_server::{ServerConfig, serve};
use clap::Parser;
use colored::*;
use std::net::IpAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Signaling relay pairing a screen sharer with a single viewer.
#[derive(Parser, Debug)]
#[command(name = "beam-relay", version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, env = "BEAM_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// STUN/TURN URLs pushed to every client. Repeat or comma separate.
    #[arg(
        long = "ice-server",
        env = "BEAM_ICE_SERVERS",
        value_delimiter = ',',
        default_values_t = [DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()]
    )]
    ice_servers: Vec<String>,

    /// Username for `turn:` / `turns:` servers.
    #[arg(long, env = "BEAM_TURN_USERNAME", requires = "turn_credential")]
    turn_username: Option<String>,

    #[arg(long, env = "BEAM_TURN_CREDENTIAL", requires = "turn_username")]
    turn_credential: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut ice_servers = Vec::new();
        for url in self.ice_servers.iter().map(|u| u.trim()) {
            if url.is_empty() {
                continue;
            }
            if !IceServerConfig::is_turn_url(url) {
                ice_servers.push(IceServerConfig::stun(url));
                continue;
            }
            let (Some(username), Some(credential)) = (&self.turn_username, &self.turn_credential)
            else {
                bail!("{} needs --turn-username and --turn-credential", url);
            };
            ice_servers.push(IceServerConfig::turn(url, username, credential));
        }

        Ok(ServerConfig {
            host: self.host,
            port: self.port,
            ice_servers,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Args::parse().into_config()?;
    let addr = config.addr();
    info!(
        "Relay configured on {} with {} ICE server(s)",
        addr,
        config.ice_servers.len()
    );

    println!("{}", "📡 Starting Beam relay...".green().bold());
    println!("   🌐 WebSocket: ws://{}/ws", addr);
    println!("   ❤️  Health:    http://{}/health", addr);
    for server in &config.ice_servers {
        println!("   🧊 ICE:       {}", server.urls.join(", ").cyan());
    }

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    serve(listener, config).await
}
