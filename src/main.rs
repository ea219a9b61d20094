//! DOCX MCP Server entry point.
//!
//! This binary starts the MCP server using STDIO transport.

use docx_mcp_server::{DocumentStore, DocxServer, ServerConfig};
use rmcp::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to stderr (important for STDIO transport)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docx_mcp_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        documents_dir = %config.documents_dir.display(),
        max_documents = config.max_documents,
        "Starting DOCX MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let store = DocumentStore::with_config(config);
    let server = DocxServer::with_store(store.clone());

    // Serve over STDIO
    let service = server.serve(rmcp::transport::stdio()).await?;

    // Wait for the service to complete
    service.waiting().await?;

    let discarded = store.close_all()?;
    tracing::info!(discarded, "DOCX MCP Server stopped");
    Ok(())
}
