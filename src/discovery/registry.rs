//! Discovery Registry
//!
//! Maps every discoverable resource type to the fetch strategy that
//! knows how to list it, filter it, and normalize the upstream response
//! into resource handles. The dispatch table is plain data (resource
//! type to function pointer), built once at construction and immutable
//! afterwards.

use super::filter::FilterSpec;
use super::handle::{record_set_id, ResourceHandle, ZonedIdScheme};
use crate::gcp::reader::{Item, Reader, Zoned};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Neutral filter for listings that do not support label filtering.
const NO_FILTER: &str = "";

/// One kind of discoverable resource.
///
/// Closed set; the string form is the Terraform resource type name, so
/// identifiers pair directly with the declarative description that
/// consumes the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceType {
    ComputeInstance,
    ComputeFirewall,
    ComputeNetwork,
    // An HTTP(S) load balancer has three parts:
    // * backend configuration: instance_group, backend_service and health_check
    // * host and path rules: url_map
    // * frontend configuration: target_http(s)_proxy + global_forwarding_rule
    ComputeHealthCheck,
    ComputeInstanceGroup,
    ComputeInstanceIamPolicy,
    ComputeBackendBucket,
    ComputeBackendService,
    ComputeSslCertificate,
    ComputeTargetHttpProxy,
    ComputeTargetHttpsProxy,
    ComputeUrlMap,
    ComputeGlobalForwardingRule,
    ComputeForwardingRule,
    ComputeDisk,
    DnsManagedZone,
    DnsRecordSet,
    ProjectIamCustomRole,
    StorageBucket,
    StorageBucketIamPolicy,
    SqlDatabaseInstance,
}

impl ResourceType {
    /// Every discoverable type, in declaration order.
    pub const ALL: &'static [ResourceType] = &[
        ResourceType::ComputeInstance,
        ResourceType::ComputeFirewall,
        ResourceType::ComputeNetwork,
        ResourceType::ComputeHealthCheck,
        ResourceType::ComputeInstanceGroup,
        ResourceType::ComputeInstanceIamPolicy,
        ResourceType::ComputeBackendBucket,
        ResourceType::ComputeBackendService,
        ResourceType::ComputeSslCertificate,
        ResourceType::ComputeTargetHttpProxy,
        ResourceType::ComputeTargetHttpsProxy,
        ResourceType::ComputeUrlMap,
        ResourceType::ComputeGlobalForwardingRule,
        ResourceType::ComputeForwardingRule,
        ResourceType::ComputeDisk,
        ResourceType::DnsManagedZone,
        ResourceType::DnsRecordSet,
        ResourceType::ProjectIamCustomRole,
        ResourceType::StorageBucket,
        ResourceType::StorageBucketIamPolicy,
        ResourceType::SqlDatabaseInstance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::ComputeInstance => "google_compute_instance",
            ResourceType::ComputeFirewall => "google_compute_firewall",
            ResourceType::ComputeNetwork => "google_compute_network",
            ResourceType::ComputeHealthCheck => "google_compute_health_check",
            ResourceType::ComputeInstanceGroup => "google_compute_instance_group",
            ResourceType::ComputeInstanceIamPolicy => "google_compute_instance_iam_policy",
            ResourceType::ComputeBackendBucket => "google_compute_backend_bucket",
            ResourceType::ComputeBackendService => "google_compute_backend_service",
            ResourceType::ComputeSslCertificate => "google_compute_ssl_certificate",
            ResourceType::ComputeTargetHttpProxy => "google_compute_target_http_proxy",
            ResourceType::ComputeTargetHttpsProxy => "google_compute_target_https_proxy",
            ResourceType::ComputeUrlMap => "google_compute_url_map",
            ResourceType::ComputeGlobalForwardingRule => "google_compute_global_forwarding_rule",
            ResourceType::ComputeForwardingRule => "google_compute_forwarding_rule",
            ResourceType::ComputeDisk => "google_compute_disk",
            ResourceType::DnsManagedZone => "google_dns_managed_zone",
            ResourceType::DnsRecordSet => "google_dns_record_set",
            ResourceType::ProjectIamCustomRole => "google_project_iam_custom_role",
            ResourceType::StorageBucket => "google_storage_bucket",
            ResourceType::StorageBucketIamPolicy => "google_storage_bucket_iam_policy",
            ResourceType::SqlDatabaseInstance => "google_sql_database_instance",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ResourceType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown resource type: {}", s))
    }
}

/// A fetch strategy bound to exactly one resource type.
type StrategyFn =
    for<'a> fn(&'a Discovery, &'a FilterSpec) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>>;

/// The discovery context: the reader capability, the owning project and
/// the dispatch table from resource type to fetch strategy.
///
/// Holds no mutable state, so independent `discover` calls on the same
/// context may run concurrently. Construct one per project; contexts are
/// fully independent of each other.
pub struct Discovery {
    reader: Arc<dyn Reader>,
    project: String,
    strategies: BTreeMap<ResourceType, StrategyFn>,
}

impl Discovery {
    /// Build a registry with every supported resource type bound.
    pub fn new(reader: Arc<dyn Reader>, project: impl Into<String>) -> Self {
        Self {
            reader,
            project: project.into(),
            strategies: strategies(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn reader(&self) -> &dyn Reader {
        self.reader.as_ref()
    }

    /// Execute the strategy bound to `resource_type` and return the
    /// normalized handles.
    ///
    /// A type absent from the dispatch table fails before any client
    /// call is made. [`Discovery::new`] binds the full set, so in normal
    /// use every type resolves.
    pub async fn discover<'a>(
        &'a self,
        resource_type: ResourceType,
        filters: &'a FilterSpec,
    ) -> Result<Vec<ResourceHandle<'a>>> {
        let Some(strategy) = self.strategies.get(&resource_type) else {
            return Err(anyhow::anyhow!(
                "unsupported resource type: {}",
                resource_type
            ));
        };
        strategy(self, filters).await
    }
}

fn strategies() -> BTreeMap<ResourceType, StrategyFn> {
    BTreeMap::from([
        (ResourceType::ComputeInstance, compute_instance as StrategyFn),
        (ResourceType::ComputeFirewall, compute_firewall as StrategyFn),
        (ResourceType::ComputeNetwork, compute_network as StrategyFn),
        (ResourceType::ComputeHealthCheck, compute_health_check as StrategyFn),
        (ResourceType::ComputeInstanceGroup, compute_instance_group as StrategyFn),
        (ResourceType::ComputeInstanceIamPolicy, compute_instance_iam_policy as StrategyFn),
        (ResourceType::ComputeBackendBucket, compute_backend_bucket as StrategyFn),
        (ResourceType::ComputeBackendService, compute_backend_service as StrategyFn),
        (ResourceType::ComputeSslCertificate, compute_ssl_certificate as StrategyFn),
        (ResourceType::ComputeTargetHttpProxy, compute_target_http_proxy as StrategyFn),
        (ResourceType::ComputeTargetHttpsProxy, compute_target_https_proxy as StrategyFn),
        (ResourceType::ComputeUrlMap, compute_url_map as StrategyFn),
        (ResourceType::ComputeGlobalForwardingRule, compute_global_forwarding_rule as StrategyFn),
        (ResourceType::ComputeForwardingRule, compute_forwarding_rule as StrategyFn),
        (ResourceType::ComputeDisk, compute_disk as StrategyFn),
        (ResourceType::DnsManagedZone, dns_managed_zone as StrategyFn),
        (ResourceType::DnsRecordSet, dns_record_set as StrategyFn),
        (ResourceType::ProjectIamCustomRole, project_iam_custom_role as StrategyFn),
        (ResourceType::StorageBucket, storage_bucket as StrategyFn),
        (ResourceType::StorageBucketIamPolicy, storage_bucket_iam_policy as StrategyFn),
        (ResourceType::SqlDatabaseInstance, sql_database_instance as StrategyFn),
    ])
}

/// Map a flat listing to handles identified by the bare item name.
fn named_handles<'a>(
    d: &'a Discovery,
    resource_type: ResourceType,
    items: &[Item],
) -> Vec<ResourceHandle<'a>> {
    items
        .iter()
        .map(|item| ResourceHandle::new(item.name.clone(), resource_type, d))
        .collect()
}

/// Flatten a zone-partitioned listing into handles, one per
/// (zone, item) pair, using the strategy's identifier scheme. A zone
/// with zero items contributes zero handles.
fn zoned_handles<'a>(
    d: &'a Discovery,
    resource_type: ResourceType,
    scheme: ZonedIdScheme,
    listing: &Zoned<Item>,
) -> Vec<ResourceHandle<'a>> {
    let mut resources = Vec::new();
    for (zone, items) in listing {
        for item in items {
            let id = scheme.render(d.project(), zone, &item.name);
            resources.push(ResourceHandle::new(id, resource_type, d));
        }
    }
    resources
}

/// Shared shape for flat listings without filter support.
fn flat<'a, F>(
    d: &'a Discovery,
    resource_type: ResourceType,
    what: &'static str,
    list: F,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>>
where
    F: FnOnce(&'a dyn Reader) -> BoxFuture<'a, Result<Vec<Item>>> + Send + 'a,
{
    Box::pin(async move {
        let items = list(d.reader())
            .await
            .with_context(|| format!("unable to list {} from reader", what))?;
        Ok(named_handles(d, resource_type, &items))
    })
}

fn compute_instance<'a>(
    d: &'a Discovery,
    filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    Box::pin(async move {
        let f = filters.compile();
        let instances = d
            .reader()
            .list_instances(&f)
            .await
            .context("unable to list instances from reader")?;
        Ok(zoned_handles(
            d,
            ResourceType::ComputeInstance,
            ZonedIdScheme::ProjectZoneName,
            &instances,
        ))
    })
}

fn compute_firewall<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::ComputeFirewall, "firewalls", |r| {
        r.list_firewalls(NO_FILTER)
    })
}

fn compute_network<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::ComputeNetwork, "networks", |r| {
        r.list_networks(NO_FILTER)
    })
}

fn compute_health_check<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::ComputeHealthCheck, "health checks", |r| {
        r.list_health_checks(NO_FILTER)
    })
}

fn compute_instance_group<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    Box::pin(async move {
        let groups = d
            .reader()
            .list_instance_groups(NO_FILTER)
            .await
            .context("unable to list instance groups from reader")?;
        Ok(zoned_handles(
            d,
            ResourceType::ComputeInstanceGroup,
            ZonedIdScheme::ProjectZoneName,
            &groups,
        ))
    })
}

/// Imports the policies bound to compute instances. Enumerates the same
/// upstream instances as [`compute_instance`], but each policy is a
/// resource of its own, addressed by the cloud resource path rather than
/// the inventory's project/zone/name scheme.
fn compute_instance_iam_policy<'a>(
    d: &'a Discovery,
    filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    Box::pin(async move {
        let f = filters.compile();
        let instances = d
            .reader()
            .list_instances(&f)
            .await
            .context("unable to list compute instances from reader")?;
        Ok(zoned_handles(
            d,
            ResourceType::ComputeInstanceIamPolicy,
            ZonedIdScheme::InstancePath,
            &instances,
        ))
    })
}

fn compute_backend_bucket<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::ComputeBackendBucket, "backend buckets", |r| {
        r.list_backend_buckets(NO_FILTER)
    })
}

fn compute_backend_service<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::ComputeBackendService, "backend services", |r| {
        r.list_backend_services(NO_FILTER)
    })
}

fn compute_ssl_certificate<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::ComputeSslCertificate, "SSL certificates", |r| {
        r.list_ssl_certificates(NO_FILTER)
    })
}

fn compute_target_http_proxy<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::ComputeTargetHttpProxy, "target http proxies", |r| {
        r.list_target_http_proxies(NO_FILTER)
    })
}

fn compute_target_https_proxy<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::ComputeTargetHttpsProxy, "target https proxies", |r| {
        r.list_target_https_proxies(NO_FILTER)
    })
}

fn compute_url_map<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::ComputeUrlMap, "URL maps", |r| {
        r.list_url_maps(NO_FILTER)
    })
}

fn compute_global_forwarding_rule<'a>(
    d: &'a Discovery,
    filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    Box::pin(async move {
        let f = filters.compile();
        let rules = d
            .reader()
            .list_global_forwarding_rules(&f)
            .await
            .context("unable to list global forwarding rules from reader")?;
        Ok(named_handles(
            d,
            ResourceType::ComputeGlobalForwardingRule,
            &rules,
        ))
    })
}

fn compute_forwarding_rule<'a>(
    d: &'a Discovery,
    filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    Box::pin(async move {
        let f = filters.compile();
        let rules = d
            .reader()
            .list_forwarding_rules(&f)
            .await
            .context("unable to list forwarding rules from reader")?;
        Ok(named_handles(d, ResourceType::ComputeForwardingRule, &rules))
    })
}

fn compute_disk<'a>(
    d: &'a Discovery,
    filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    Box::pin(async move {
        let f = filters.compile();
        let disks = d
            .reader()
            .list_disks(&f)
            .await
            .context("unable to list disks from reader")?;
        Ok(zoned_handles(
            d,
            ResourceType::ComputeDisk,
            ZonedIdScheme::ZoneName,
            &disks,
        ))
    })
}

fn dns_managed_zone<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::DnsManagedZone, "DNS managed zones", |r| {
        r.list_managed_zones()
    })
}

/// Two-stage strategy: record sets can only be listed per managed zone,
/// so the current zone set is resolved through the registry first and
/// fed into the record-set listing. An empty zone set is a valid input
/// and yields an empty result; a zone-resolution failure aborts before
/// the record-set call is attempted.
fn dns_record_set<'a>(
    d: &'a Discovery,
    filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    Box::pin(async move {
        let managed_zones = d
            .discover(ResourceType::DnsManagedZone, filters)
            .await
            .context("unable to resolve managed zones")?;
        let zones: Vec<String> = managed_zones
            .iter()
            .map(|zone| zone.id().to_string())
            .collect();
        let rrsets = d
            .reader()
            .list_record_sets(&zones)
            .await
            .context("unable to list resource record sets from reader")?;
        let mut resources = Vec::new();
        for (zone, sets) in &rrsets {
            for rrset in sets {
                let id = record_set_id(zone, &rrset.name, &rrset.record_type);
                resources.push(ResourceHandle::new(id, ResourceType::DnsRecordSet, d));
            }
        }
        Ok(resources)
    })
}

/// Custom roles are scoped by a `projects/<project>` parent path rather
/// than a label filter.
fn project_iam_custom_role<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    Box::pin(async move {
        let parent = format!("projects/{}", d.project());
        let roles = d
            .reader()
            .list_custom_roles(&parent)
            .await
            .context("unable to list project IAM custom roles from reader")?;
        Ok(named_handles(d, ResourceType::ProjectIamCustomRole, &roles))
    })
}

fn storage_bucket<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::StorageBucket, "buckets", |r| r.list_buckets())
}

/// Imports the policies bound to buckets. Reuses the bucket listing;
/// each policy is registered as a resource in its own right.
fn storage_bucket_iam_policy<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::StorageBucketIamPolicy, "bucket policies", |r| {
        r.list_buckets()
    })
}

fn sql_database_instance<'a>(
    d: &'a Discovery,
    _filters: &'a FilterSpec,
) -> BoxFuture<'a, Result<Vec<ResourceHandle<'a>>>> {
    flat(d, ResourceType::SqlDatabaseInstance, "sql database instances", |r| {
        r.list_sql_instances(NO_FILTER)
    })
}
