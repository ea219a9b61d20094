//! DOCX MCP Server library.
//!
//! This library provides an MCP server that creates, opens, edits and saves
//! Word (.docx) documents: an in-memory document model, a registry of open
//! documents addressed by opaque ids, and a closed table of commands over it.

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod model;
pub mod server;
pub mod state;
pub mod tools;

pub use codec::{DocumentCodec, DocxCodec};
pub use command::Command;
pub use config::ServerConfig;
pub use error::{DocxServerError, ErrorKind, ErrorPayload, Result};
pub use server::DocxServer;
pub use state::DocumentStore;
