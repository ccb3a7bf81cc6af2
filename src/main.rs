use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_designer::{api, config::DesignerConfig};

#[derive(Parser)]
#[command(name = "designer")]
#[command(about = "Designer backend for editing app layouts in developer working copies")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the designer server
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding the developers' working copies
        #[arg(short, long)]
        repos: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "studio_designer=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: DesignerConfig) -> anyhow::Result<()> {
    let repo = config.open_repository()?;
    tracing::info!("Serving working copies from {}", repo.root().display());
    if config.security.api_key.is_none() {
        tracing::warn!("DESIGNER_API_KEY not set, bearer authentication disabled");
    }

    let address = config.bind_address();
    let app = api::create_router(repo, config.security);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Designer server listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = DesignerConfig::from_env();
    match cli.command {
        Some(Commands::Serve { port, repos }) => serve(config.with_overrides(port, repos)).await,
        // Default: start server
        None => serve(config).await,
    }
}
