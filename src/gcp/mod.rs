//! GCP API interaction module
//!
//! This module provides the plumbing for talking to Google Cloud
//! Platform APIs: authentication, the HTTP client, and the listing
//! reader the discovery registry runs against.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials
//! - [`http`] - HTTP utilities for REST API calls
//! - [`reader`] - listing reader: one call per discoverable resource kind
//!
//! # Example
//!
//! ```ignore
//! use crate::gcp::reader::{GcpReader, Reader};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let reader = GcpReader::new("my-project", "us-central1-a").await?;
//!     let networks = reader.list_networks("").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod http;
pub mod reader;
