//! Registrar server: reads settings from the environment, opens the document store, serves the API.

use registrar::{
    all_schemas,
    app,
    ensure_collections,
    ensure_database_exists,
    AppState,
    DocumentStore,
    MemoryStore,
    PgDocumentStore,
    Settings,
    StoreKind,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("registrar=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let store: Arc<dyn DocumentStore> = match settings.store {
        StoreKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.database_url)
                .await?;
            let collections: Vec<&str> = all_schemas().iter().map(|s| s.collection).collect();
            ensure_collections(&pool, &settings.schema, &collections).await?;
            Arc::new(PgDocumentStore::new(pool, settings.schema.clone()))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; documents are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let app = app(AppState::new(store), settings.body_limit);
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
