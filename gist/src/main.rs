use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gist::api::{create_router, AppState};
use gist::config::Config;
use gist::llm::LlmProvider;
use gist::ocr::OcrProvider;
use gist::pipeline::Analyzer;
use gist::transcription::TranscriptionProvider;

#[derive(Parser)]
#[command(name = "gist")]
#[command(about = "Extract text from documents, images, audio and video, then summarize it")]
struct Args {
    /// Use the offline stand-in summarizer even when an LLM is configured
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize one file and print its file information
    Summarize { path: PathBuf },
    /// Extract a file once, then answer questions about it until `exit`
    Ask { path: Option<PathBuf> },
    /// Serve the upload API
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gist=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if args.offline {
        config.summary.offline = true;
    }
    config.validate()?;

    let (ocr, transcription, llm) = init_providers(&config);

    match args.command {
        Command::Summarize { path } => {
            let analyzer = Analyzer::from_providers(&config, ocr, transcription, &llm);
            let analysis = analyzer.analyze(&path).await?;
            println!("Summary:\n{}\n", analysis.summary);
            println!("{}", analysis.file);
        }
        Command::Ask { path } => {
            let analyzer = Analyzer::from_providers(&config, ocr, transcription, &llm);
            let stdin = BufReader::new(tokio::io::stdin());
            gist::cli::ask_loop(&analyzer, path, stdin, &mut std::io::stdout()).await?;
        }
        Command::Serve => serve(config, ocr, transcription, llm).await?,
    }

    Ok(())
}

fn init_providers(config: &Config) -> (OcrProvider, TranscriptionProvider, LlmProvider) {
    tracing::info!("Initializing OCR provider ({})...", config.ocr.languages);
    let ocr = OcrProvider::new(&config.ocr);
    if !ocr.is_available() {
        tracing::warn!("OCR unavailable - image files will be rejected");
    }

    tracing::info!(
        "Initializing transcription provider: {}...",
        config.transcription.model
    );
    let transcription = TranscriptionProvider::new(&config.transcription);
    if !transcription.is_available() {
        tracing::warn!("Transcription unavailable - audio and video files will be rejected");
    }

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if config.summary.offline || !llm.is_available() {
        tracing::warn!("Using the offline stand-in summarizer");
    }

    (ocr, transcription, llm)
}

async fn serve(
    config: Config,
    ocr: OcrProvider,
    transcription: TranscriptionProvider,
    llm: LlmProvider,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, ocr, transcription, llm);
    let cancel_token = state.shutdown.clone();
    let app = create_router(state);

    tracing::info!("Gist starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  Upload:       POST http://{}/api/v1/analyze", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling in-flight analyses...");
    cancel_token.cancel();
}
