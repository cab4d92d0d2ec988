//! Resource Handles
//!
//! The normalized discovery output: a synthesized identifier, the owning
//! resource type, and a back-reference to the discovery context. The
//! identifier is the only correlation key downstream tooling gets, so
//! every scheme here must stay stable across runs.

use super::registry::{Discovery, ResourceType};
use std::fmt;

/// Identifier layout for zone-partitioned listings.
///
/// Each strategy declares its scheme explicitly instead of branching on
/// the resource type at use sites. Disks omit the project segment while
/// instances and instance groups carry it; downstream correlation
/// depends on that asymmetry, so it is preserved as observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZonedIdScheme {
    /// `<zone>/<name>` (disks).
    ZoneName,
    /// `<project>/<zone>/<name>` (instances, instance groups).
    ProjectZoneName,
    /// `projects/<project>/zones/<zone>/instances/<name>`, the cloud
    /// resource-path convention used to address instance IAM policies.
    InstancePath,
}

impl ZonedIdScheme {
    pub fn render(self, project: &str, zone: &str, name: &str) -> String {
        match self {
            ZonedIdScheme::ZoneName => format!("{}/{}", zone, name),
            ZonedIdScheme::ProjectZoneName => format!("{}/{}/{}", project, zone, name),
            ZonedIdScheme::InstancePath => {
                format!("projects/{}/zones/{}/instances/{}", project, zone, name)
            }
        }
    }
}

/// Identifier for a DNS record set: `<zone>/<name>/<recordType>`.
pub(crate) fn record_set_id(zone: &str, name: &str, record_type: &str) -> String {
    format!("{}/{}/{}", zone, name, record_type)
}

/// A discovered resource, normalized across all listing shapes.
///
/// Handles borrow the [`Discovery`] context that produced them; the
/// context is shared by every handle of a run and is used later for
/// detail fetching. It always outlives the handles.
#[derive(Clone)]
pub struct ResourceHandle<'a> {
    id: String,
    resource_type: ResourceType,
    provider: &'a Discovery,
}

impl<'a> ResourceHandle<'a> {
    pub(crate) fn new(id: String, resource_type: ResourceType, provider: &'a Discovery) -> Self {
        Self {
            id,
            resource_type,
            provider,
        }
    }

    /// The synthesized identifier, unique per resource type within a run.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// The discovery context this handle was produced by.
    pub fn provider(&self) -> &'a Discovery {
        self.provider
    }
}

impl fmt::Debug for ResourceHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("id", &self.id)
            .field("resource_type", &self.resource_type)
            .finish()
    }
}
