use clap::Parser;
use log::{error, info};
use server::config::HubConfig;
use server::hub::EchoPolicy;
use server::network::Server;
use shared::{DEFAULT_HOST, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum number of concurrent sessions
    #[arg(short, long, default_value = "1024")]
    max_sessions: usize,

    /// Frames queued per session before it is dropped as backlogged
    #[arg(long, default_value = "256")]
    outbound_capacity: usize,

    /// Also relay updates back to the session that sent them
    #[arg(long)]
    echo_to_sender: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = HubConfig {
        max_sessions: args.max_sessions,
        outbound_capacity: args.outbound_capacity,
        echo: if args.echo_to_sender {
            EchoPolicy::IncludeSource
        } else {
            EchoPolicy::SkipSource
        },
        ..HubConfig::new(&args.host, args.port)
    };

    info!("Starting scoreboard hub...");
    info!(
        "Max sessions: {}, outbound queue: {}, echo: {:?}",
        config.max_sessions, config.outbound_capacity, config.echo
    );

    let server = Server::bind(&config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
