use anyhow::Context;
use docent::{
    cli::{output::Output, Cli, Commands},
    ingest::{
        watermark::WatermarkStore, DocumentExtractor, GitHubClient, IngestionCoordinator,
        UploadOutcome,
    },
    llm::{FallbackChain, Provider},
    memory::SessionStore,
    orchestrator::{DirectAnswerer, IntakeDetails, PromptProfile, SessionOrchestrator},
    rag::{GeminiEmbeddings, RetrievalStore, TextChunker},
    utils::{config::Config, http_client},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output.error(&format!("Failed to load {}: {}", cli.config.display(), e));
            std::process::exit(2);
        }
    };

    init_tracing(&config, cli.verbose);

    if let Err(e) = run(cli.command, &config, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Log filter: `RUST_LOG` wins, then `--verbose`, then the configured level.
fn init_tracing(config: &Config, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("docent={0},docent_vector={0}", default_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn open_store(config: &Config, http: Arc<reqwest::Client>) -> anyhow::Result<Arc<RetrievalStore>> {
    let embedder = Arc::new(GeminiEmbeddings::from_config(config, http)?);
    let chunker = TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
    let store = RetrievalStore::open(&config.storage.index_dir, chunker, embedder)
        .await
        .with_context(|| format!("opening store at {}", config.storage.index_dir.display()))?;
    Ok(Arc::new(store))
}

fn completion_chain(config: &Config, http: Arc<reqwest::Client>) -> anyhow::Result<FallbackChain> {
    let primary = Provider::primary(config)?.create_client(http.clone());
    let fallback = Provider::fallback(config)?.create_client(http);
    Ok(FallbackChain::new(primary, fallback))
}

fn ingestion(config: &Config, store: Arc<RetrievalStore>, http: Arc<reqwest::Client>) -> IngestionCoordinator {
    IngestionCoordinator::new(
        store,
        Arc::new(GitHubClient::from_config(config, http)),
        Arc::new(DocumentExtractor),
        WatermarkStore::new(&config.storage.watermark_path),
        config.repository.allowed_extensions.iter().cloned(),
    )
}

async fn run(command: Commands, config: &Config, output: &Output) -> anyhow::Result<()> {
    let http = http_client(config)?;
    let store = open_store(config, http.clone()).await?;

    match command {
        Commands::IngestRepo { url, branch } => {
            let report = ingestion(config, store.clone(), http)
                .ingest_from_repository(&url, &branch)
                .await?;

            output.success(&format!(
                "{} at {} ({:?})",
                report.repository, report.commit, report.mode
            ));
            output.kv("ingested", &report.ingested.len().to_string());
            output.kv("removed", &report.removed.len().to_string());
            output.kv("skipped", &report.skipped.len().to_string());
            for failure in &report.failures {
                output.warning(&failure.to_string());
            }
            for warning in &report.warnings {
                output.warning(warning);
            }
        }

        Commands::IngestUpload { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match ingestion(config, store.clone(), http)
                .ingest_upload(&bytes, &filename)
                .await?
            {
                UploadOutcome::Ingested { doc_id, pages } => {
                    output.success(&format!("Ingested {} as {} page(s)", doc_id, pages));
                }
                UploadOutcome::Unsupported { extension } => {
                    output.warning(&format!("Unsupported file type '{}'", extension));
                    output.hint("Supported types: pdf, docx, txt, md, html");
                }
                UploadOutcome::Empty => output.warning("No text found in file"),
            }
        }

        Commands::Ask { query, k } => {
            let answerer = DirectAnswerer::new(
                store.clone(),
                completion_chain(config, http)?,
                config.rag.top_k,
            );
            let result = answerer
                .answer_with_k(&query, k.unwrap_or(config.rag.top_k))
                .await?;
            output.answer(&result.answer);
            output.list("Sources", &result.sources);
        }

        Commands::Chat {
            session,
            profile,
            message,
        } => {
            let profile = PromptProfile::by_name(&profile)?;
            let orchestrator = SessionOrchestrator::new(
                store.clone(),
                Arc::new(SessionStore::new(&config.storage.conversations_dir)),
                completion_chain(config, http)?,
                config.rag.top_k,
            );
            let turn = orchestrator.converse(&profile, &session, &message).await?;
            output.answer(&turn.answer);
            output.list("Sources", &turn.sources);
            if !turn.persisted {
                output.warning("The conversation history could not be saved");
            }
        }

        Commands::Intake {
            session,
            profile,
            fields,
        } => {
            let profile = PromptProfile::by_name(&profile)?;
            let orchestrator = SessionOrchestrator::new(
                store.clone(),
                Arc::new(SessionStore::new(&config.storage.conversations_dir)),
                completion_chain(config, http)?,
                config.rag.top_k,
            );
            let details = fields
                .into_iter()
                .fold(IntakeDetails::new(), |d, (label, value)| d.with(label, value));
            orchestrator.record_intake(&profile, &session, &details).await?;
            output.success(&format!("Recorded details for session {}", session));
        }

        Commands::Remove { doc_id } => {
            if store.remove_document(&doc_id).await? {
                output.success(&format!("Removed {}", doc_id));
            } else {
                output.info(&format!("{} was not in the store", doc_id));
            }
        }

        Commands::Stats => {
            let stats = store.stats();
            output.banner();
            output.kv("store", &config.storage.index_dir.display().to_string());
            output.kv("documents", &stats.documents.to_string());
            output.kv("vectors", &stats.vectors.to_string());
        }
    }

    Ok(())
}
