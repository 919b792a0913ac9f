use anyhow::{Context, Result};
use axum::Router;
use download_lister::{
    config::{AppConfig, ConfigBackend, RunMode},
    models::request::ListRequest,
    routes,
    services::{
        config_store::{ConfigStore, StaticConfigStore},
        dynamo_config::DynamoConfigStore,
        list_service::ListService,
        object_lister::S3ObjectLister,
        sqlite_config::SqliteConfigStore,
    },
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{io::ErrorKind, path::Path, str::FromStr, sync::Arc};
use tokio::{fs, net::TcpListener};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + run mode ---
    let (cfg, mode) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting download-lister with config: {:?}", cfg);

    // --- Handle migration mode ---
    if mode == RunMode::Migrate {
        let store = sqlite_store(&cfg).await?;
        store.migrate().await?;
        tracing::info!("Configuration table {} is ready.", store.table());
        return Ok(()); // exit after migration
    }

    // --- Initialize collaborators ---
    let sdk_config = cfg.aws_sdk_config().await;
    let config_store: Arc<dyn ConfigStore> = match (&cfg.data_bucket, cfg.backend) {
        (Some(bucket), _) => {
            tracing::info!("Using injected data bucket {}", bucket);
            Arc::new(StaticConfigStore::new(bucket.clone()))
        }
        (None, ConfigBackend::Dynamodb) => {
            Arc::new(DynamoConfigStore::new(&sdk_config, cfg.config_table.clone()))
        }
        (None, ConfigBackend::Sqlite) => Arc::new(sqlite_store(&cfg).await?),
    };
    let lister = Arc::new(S3ObjectLister::from_sdk_config(
        &sdk_config,
        cfg.endpoint_url.is_some(),
        cfg.max_list_pages,
    ));
    let service = ListService::new(config_store, lister, cfg.manifest_options());

    // --- One-shot event mode ---
    if let RunMode::Event(path) = &mode {
        return handle_event(&service, path).await;
    }

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the SQLite configuration store, creating the database file if needed.
async fn sqlite_store(cfg: &AppConfig) -> Result<SqliteConfigStore> {
    let db_url = &cfg.database_url;
    tracing::debug!("Connecting using raw URL => {}", db_url);

    let options = SqliteConnectOptions::from_str(db_url)
        .with_context(|| format!("parsing database URL `{}`", db_url))?
        .create_if_missing(true);

    // Create parent directory if needed
    if let Some(parent) = Path::new(options.get_filename()).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("connecting to {}", db_url))?;

    Ok(SqliteConfigStore::new(Arc::new(db), cfg.config_table.clone())?)
}

/// Run the handler once on an event file and print the response envelope.
async fn handle_event(service: &ListService, path: &Path) -> Result<()> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading event file {}", path.display()))?;
    let request: ListRequest = serde_json::from_str(&raw)
        .with_context(|| format!("parsing event file {}", path.display()))?;

    let response = service.handle(&request).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
