use std::sync::Arc;

use agios_api::{
    build_router,
    config::{Config, StorageBackend},
    logging::init_logging,
    state::AppState,
};
use agios_graph::Pipeline;
use agios_llm::{GeminiClient, GenerationClient};
use agios_persist::{FileStore, InMemoryPersistenceClient, LocalFileStore, PersistenceClient};
use agios_tools::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config.logging);

    tracing::info!("Starting Agios API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    tracing::info!(model = %config.llm.model, "Initializing generation client");
    let generation: Arc<dyn GenerationClient> =
        Arc::new(GeminiClient::new(config.llm.gemini(&config.gemini_api_key))?);

    let persistence = connect_persistence(&config).await?;

    let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(&config.storage.upload_dir));
    files.create_directory(files.root()).await?;

    let tools = ToolRegistry::standard(Arc::clone(&generation), reqwest::Client::new(), &config.tools);
    let pipeline = Pipeline::builder()
        .generation_client(Arc::clone(&generation))
        .tools(tools)
        .persistence(Arc::clone(&persistence))
        .config(config.pipeline.clone())
        .build()?;

    let model = generation.model().to_string();
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, persistence, files, pipeline, model));

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/api/v1/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_persistence(config: &Config) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Ok(Arc::new(InMemoryPersistenceClient::new()))
        }
        #[cfg(feature = "mongodb")]
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let uri = config
                .mongodb_uri
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("MONGODB_URI is required for the mongodb backend"))?;
            let client =
                agios_persist::MongoPersistenceClient::connect(uri, &config.storage.mongodb_database).await?;
            tracing::info!("MongoDB connected");
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "mongodb"))]
        StorageBackend::Mongodb => {
            anyhow::bail!("this build has no MongoDB support, enable the `mongodb` feature")
        }
    }
}
