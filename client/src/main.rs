use clap::Parser;
use client::network::{Client, ScoreConnection};
use client::reconciler::{LastWriteWins, MergeStrategy, PreserveRecentEdits, Reconciler};
use client::snapshot::load_competition;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hub WebSocket URL
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Competition snapshot (JSON) to score
    #[arg(short = 'c', long)]
    competition: PathBuf,

    /// Quiet period after the last edit before the sheet is submitted
    #[arg(short = 'd', long, default_value = "300")]
    debounce_ms: u64,

    /// Keep cells edited locally within this many ms when a remote update
    /// arrives (0 = last write wins)
    #[arg(short = 'p', long, default_value = "0")]
    protect_edits_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let competition = load_competition(&args.competition).await?;
    info!("Loaded competition {} ({})", competition.name, competition.id);
    info!("Connecting to: {}", args.server);
    info!("Commands: <lake>/<player>=<score>, show, send, quit");

    let strategy: Box<dyn MergeStrategy> = if args.protect_edits_ms > 0 {
        Box::new(PreserveRecentEdits {
            window: Duration::from_millis(args.protect_edits_ms),
        })
    } else {
        Box::new(LastWriteWins)
    };

    let connection = ScoreConnection::connect(&args.server).await?;
    let mut client = Client::new(
        connection,
        competition,
        Reconciler::new(strategy),
        Duration::from_millis(args.debounce_ms),
    )?;

    client.run().await?;

    Ok(())
}
