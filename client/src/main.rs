use clap::Parser;
use client::network::Client;
use client::presentation::LogPresentation;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:9999")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut client = Client::connect(&args.server, Box::new(LogPresentation)).await?;

    tokio::select! {
        _ = client.run() => {},
        _ = tokio::signal::ctrl_c() => {
            log::info!("Received Ctrl+C, disconnecting");
        }
    }

    Ok(())
}
