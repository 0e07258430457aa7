use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};

use oxidized_agenda::{
    config::Config,
    ingest::UploadedFile,
    llm::{LLMProviderConfig, LLM},
    routes::create_router,
    utils::init_logger,
    AppState,
};

#[derive(Parser)]
#[command(name = "oxidized-agenda", version, about = "Generate meeting agendas from documents")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Generate an agenda for one file and print it as JSON
    Agenda {
        /// Document to process
        path: PathBuf,
        /// Override the MIME type guessed from the file extension
        #[arg(long)]
        mime: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    let _log_guard = init_logger(&config.logging);
    info!("Configuration loaded: {:?}", config.llm);

    if config.llm.google_api_key.is_empty() {
        warn!("GOOGLE_API_KEY is not set; agenda generation will fail until it is configured");
    }

    let llm = LLM::new(LLMProviderConfig::from(&config.llm))?;
    let state = AppState::new(config.clone(), llm);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, &config).await,
        Command::Agenda { path, mime } => {
            let upload = UploadedFile::from_path(&path, mime).await?;
            let record = state.pipeline.process(upload).await?;
            println!("{}", serde_json::to_string_pretty(&record.agenda)?);
            Ok(())
        }
    }
}

async fn serve(state: AppState, config: &Config) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
