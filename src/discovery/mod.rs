//! Resource discovery core
//!
//! Given a resource type, the registry selects the bound fetch strategy,
//! executes it against the GCP reader, applies optional label filtering
//! and normalizes the response into [`ResourceHandle`]s with stable
//! identifiers.
//!
//! # Architecture
//!
//! - `registry` - dispatch table from [`ResourceType`] to fetch
//!   strategy, plus the strategies themselves
//! - `filter` - compiles label predicates into the provider `filter`
//!   query fragment
//! - `handle` - normalized discovery output and identifier schemes
//!
//! # Example
//!
//! ```ignore
//! use gcpinv::discovery::{Discovery, FilterSpec, ResourceType};
//! use gcpinv::gcp::reader::GcpReader;
//! use std::sync::Arc;
//!
//! async fn list_disk_ids() -> anyhow::Result<Vec<String>> {
//!     let reader = GcpReader::new("my-project", "us-central1-a").await?;
//!     let discovery = Discovery::new(Arc::new(reader), "my-project");
//!     let handles = discovery
//!         .discover(ResourceType::ComputeDisk, &FilterSpec::none())
//!         .await?;
//!     Ok(handles.iter().map(|h| h.id().to_string()).collect())
//! }
//! ```

mod filter;
mod handle;
mod registry;

pub use filter::{FilterSpec, TagPredicate};
pub use handle::{ResourceHandle, ZonedIdScheme};
pub use registry::{Discovery, ResourceType};
