//! Foxit PDF MCP Server Library
//!
//! This crate exposes the Foxit PDF cloud API as MCP tools:
//! - Document lifecycle: `upload_document`, `download_document`, `delete_document`
//! - Creation and conversion: `pdf_from_*`, `pdf_to_*`
//! - Manipulation, security, optimization, analysis and forms
//!
//! Every operation submits one remote task and waits for it through
//! [`cloud::TaskEngine`].

pub mod cloud;
pub mod config;
pub mod envelope;
pub mod error;
pub mod server;
pub mod source;

pub use config::{ApiConfig, ServerConfig};
pub use error::{Error, Result};
pub use server::{run_server_with_config, PdfCloudServer};
