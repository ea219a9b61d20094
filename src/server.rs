//! MCP server implementation with tool routing.

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, InitializeResult,
    ListToolsResult, PaginatedRequestParams, ServerCapabilities, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, ServerHandler};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

use crate::command::{self, Command, JsonObject};
use crate::error::{DocxServerError, Result};
use crate::state::DocumentStore;

/// DOCX MCP Server.
///
/// Exposes Word document editing as MCP tools over a shared document store.
#[derive(Clone)]
pub struct DocxServer {
    /// Document store for stateful operations.
    store: DocumentStore,
}

impl DocxServer {
    /// Create a server with default configuration.
    pub fn new() -> Self {
        Self::with_store(DocumentStore::new())
    }

    /// Create a server over an existing store.
    pub fn with_store(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    fn make_tool(name: &str, description: &str, schema: JsonObject) -> Tool {
        Tool {
            name: Cow::Owned(name.to_string()),
            title: None,
            description: Some(Cow::Owned(description.to_string())),
            input_schema: Arc::new(schema),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }

    /// Parse and run one command on a blocking worker.
    pub async fn execute(&self, name: &str, args: JsonObject) -> Result<Value> {
        let command = Command::parse(name, args)?;
        let store = self.store.clone();
        tracing::debug!(command = command.name(), "dispatching");

        tokio::task::spawn_blocking(move || command.execute(&store))
            .await
            .map_err(|e| DocxServerError::internal(format!("command task failed: {e}")))?
    }

    /// Run a tool call and convert the outcome into an MCP result.
    ///
    /// Failures become `is_error` results carrying `{"kind", "message"}`.
    pub async fn dispatch(&self, name: &str, args: JsonObject) -> CallToolResult {
        match self.execute(name, args).await {
            Ok(value) => CallToolResult::success(vec![Content::text(value.to_string())]),
            Err(e) => {
                tracing::warn!(command = name, kind = e.kind().as_str(), "command failed: {e}");
                let payload = serde_json::to_string(&e.to_payload()).unwrap_or_else(|_| {
                    format!(r#"{{"kind":"{}","message":""}}"#, e.kind().as_str())
                });
                CallToolResult::error(vec![Content::text(payload)])
            }
        }
    }
}

impl Default for DocxServer {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerHandler for DocxServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: Default::default(),
            server_info: Implementation {
                name: "docx-mcp-server".to_string(),
                title: Some("DOCX MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Word (.docx) editing server. \
                 Call create_document or open_document to get a document_id, \
                 pass it to the editing tools, then save_document and close_document. \
                 Blocks (paragraphs, page breaks, tables, pictures) are addressed by their index \
                 as reported by list_blocks; indices shift after inserts and deletes. \
                 Errors are returned as {\"kind\", \"message\"}."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<ListToolsResult, McpError>> + Send + '_
    {
        async move {
            let tools = command::catalog()
                .into_iter()
                .map(|spec| Self::make_tool(spec.name, spec.description, spec.input_schema))
                .collect();

            Ok(ListToolsResult {
                tools,
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<CallToolResult, McpError>> + Send + '_
    {
        let name = request.name.clone();
        let args = request.arguments.clone().unwrap_or_default();

        async move { Ok(self.dispatch(&name, args).await) }
    }
}
