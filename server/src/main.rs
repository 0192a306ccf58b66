use clap::Parser;
use log::{error, info};
use server::network::{BoxError, Server, ServerMessage};
use server::{ServerConfig, DEFAULT_TICK_MS};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Milliseconds between world ticks
    #[arg(short, long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    /// Seed for pipe gaps and generated names
    #[arg(short, long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let config = ServerConfig {
        tick_duration: Duration::from_millis(args.tick_ms.max(1)),
        seed: args.seed,
    };

    info!("Starting server on {}", address);
    let mut server = Server::new(&address, config).await?;

    let shutdown = server.sender();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down...");
                let _ = shutdown.send(ServerMessage::Shutdown);
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    server.run().await?;

    Ok(())
}
