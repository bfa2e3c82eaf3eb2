// Customer Statement - Web Server
// REST API with Axum over a read-only ledger database

use anyhow::{Context, Result};
use customer_statement::api::{router, AppState};
use customer_statement::{StatementConfig, StatementEngine};
use rusqlite::{Connection, OpenFlags};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "customer_statement=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🌐 Customer Statement - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = PathBuf::from(env::var("STATEMENT_DB").unwrap_or_else(|_| "statement.db".to_string()));
    let config_path = env::var("STATEMENT_CONFIG").ok().map(PathBuf::from);
    let addr = env::var("STATEMENT_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    if !db_path.exists() {
        eprintln!("❌ Database not found at {:?}", db_path);
        eprintln!("   Run: customer-statement import ledger <file.csv>");
        eprintln!("   to load a ledger first.");
        std::process::exit(1);
    }

    // Statements only read the ledger
    let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;
    println!("✓ Database opened: {:?}", db_path);

    let config = StatementConfig::load_or_default(config_path.as_deref())?;
    let engine = StatementEngine::with_config(config)?;

    let app = router(AppState::new(conn, engine));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "statement server listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/statements/<customer>?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
