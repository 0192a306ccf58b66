use clap::Parser;
use client::network::{BoxError, Client};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server WebSocket URL to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Controls: Enter or /flap to flap, /restart for a new round, /quit to leave");
    info!("Anything else you type is sent as chat");

    let mut client = Client::new(&args.server);
    client.run().await?;

    Ok(())
}
