//! GCP Listing Reader
//!
//! [`Reader`] is the capability the discovery registry consumes: one
//! listing call per resource kind. [`GcpReader`] implements it over the
//! GCP REST APIs and owns everything the registry does not want to know
//! about: URL construction, pagination, and the aggregated (per-zone)
//! response shape.

use super::auth::Credentials;
use super::http::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Zone-partitioned listing: scope key to the items in that scope.
pub type Zoned<T> = BTreeMap<String, Vec<T>>;

/// Minimal upstream item shape shared by every listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub name: String,
}

impl From<&Value> for Item {
    fn from(value: &Value) -> Self {
        Self {
            name: value
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// A DNS record set: name plus record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSetItem {
    pub name: String,
    pub record_type: String,
}

impl From<&Value> for RecordSetItem {
    fn from(value: &Value) -> Self {
        Self {
            name: value
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            record_type: value
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// One listing call per discoverable resource kind.
///
/// `filter` is a compiled label filter; the empty string means
/// unfiltered. Zone-partitioned listings return a [`Zoned`] map keyed by
/// zone name.
#[async_trait]
pub trait Reader: Send + Sync {
    async fn list_instances(&self, filter: &str) -> Result<Zoned<Item>>;
    async fn list_instance_groups(&self, filter: &str) -> Result<Zoned<Item>>;
    async fn list_disks(&self, filter: &str) -> Result<Zoned<Item>>;
    async fn list_firewalls(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_networks(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_health_checks(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_backend_services(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_backend_buckets(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_ssl_certificates(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_target_http_proxies(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_target_https_proxies(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_url_maps(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_global_forwarding_rules(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_forwarding_rules(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_buckets(&self) -> Result<Vec<Item>>;
    async fn list_sql_instances(&self, filter: &str) -> Result<Vec<Item>>;
    async fn list_managed_zones(&self) -> Result<Vec<Item>>;
    /// Record sets for each of the given managed zones, keyed by zone.
    /// Every requested zone gets an entry, empty when it has no records.
    async fn list_record_sets(&self, zones: &[String]) -> Result<Zoned<RecordSetItem>>;
    /// Custom roles under the given parent path (`projects/<project>`).
    async fn list_custom_roles(&self, parent: &str) -> Result<Vec<Item>>;
}

/// API hosts, overridable for emulators and tests.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub compute: String,
    pub dns: String,
    pub storage: String,
    pub sqladmin: String,
    pub iam: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            compute: "https://compute.googleapis.com".to_string(),
            dns: "https://dns.googleapis.com".to_string(),
            storage: "https://storage.googleapis.com".to_string(),
            sqladmin: "https://sqladmin.googleapis.com".to_string(),
            iam: "https://iam.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at a single base URL (emulators, wiremock).
    pub fn single_host(base: &str) -> Self {
        Self {
            compute: base.to_string(),
            dns: base.to_string(),
            storage: base.to_string(),
            sqladmin: base.to_string(),
            iam: base.to_string(),
        }
    }
}

/// Production reader over the GCP REST APIs.
#[derive(Clone)]
pub struct GcpReader {
    credentials: Credentials,
    http: HttpClient,
    endpoints: Endpoints,
    project: String,
    zone: String,
}

impl GcpReader {
    /// Create a reader authenticated via Application Default Credentials
    /// against the production API hosts.
    pub async fn new(project: &str, zone: &str) -> Result<Self> {
        let credentials = Credentials::application_default()
            .await
            .context("Failed to initialize GCP credentials")?;
        Self::with_endpoints(credentials, Endpoints::default(), project, zone)
    }

    /// Create a reader with explicit credentials and API hosts.
    pub fn with_endpoints(
        credentials: Credentials,
        endpoints: Endpoints,
        project: &str,
        zone: &str,
    ) -> Result<Self> {
        Ok(Self {
            credentials,
            http: HttpClient::new()?,
            endpoints,
            project: project.to_string(),
            zone: zone.to_string(),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Region derived from the configured zone
    /// (`us-central1-a` -> `us-central1`).
    fn region(&self) -> String {
        let parts: Vec<&str> = self.zone.rsplitn(2, '-').collect();
        if parts.len() == 2 {
            parts[1].to_string()
        } else {
            self.zone.clone()
        }
    }

    // =========================================================================
    // URL builders
    // =========================================================================

    fn compute_url(&self, path: &str) -> String {
        format!(
            "{}/compute/v1/projects/{}/{}",
            self.endpoints.compute, self.project, path
        )
    }

    fn compute_global_url(&self, resource: &str) -> String {
        self.compute_url(&format!("global/{}", resource))
    }

    fn compute_regional_url(&self, resource: &str) -> String {
        self.compute_url(&format!("regions/{}/{}", self.region(), resource))
    }

    fn compute_aggregated_url(&self, resource: &str) -> String {
        self.compute_url(&format!("aggregated/{}", resource))
    }

    fn dns_url(&self, path: &str) -> String {
        format!(
            "{}/dns/v1/projects/{}/{}",
            self.endpoints.dns, self.project, path
        )
    }

    fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.endpoints.storage, path)
    }

    fn sqladmin_url(&self, path: &str) -> String {
        format!(
            "{}/v1/projects/{}/{}",
            self.endpoints.sqladmin, self.project, path
        )
    }

    fn iam_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.endpoints.iam, path)
    }

    /// Append filter and page-token query parameters. The neutral
    /// (empty) filter is never sent.
    fn paged_url(url: &str, filter: &str, page_token: Option<&str>) -> String {
        let mut query_parts: Vec<String> = Vec::new();
        if !filter.is_empty() {
            query_parts.push(format!("filter={}", urlencoding::encode(filter)));
        }
        if let Some(token) = page_token {
            query_parts.push(format!("pageToken={}", urlencoding::encode(token)));
        }

        if query_parts.is_empty() {
            url.to_string()
        } else if url.contains('?') {
            format!("{}&{}", url, query_parts.join("&"))
        } else {
            format!("{}?{}", url, query_parts.join("&"))
        }
    }

    async fn get(&self, url: &str) -> Result<Value> {
        let token = self.credentials.token().await?;
        self.http.get(url, &token).await
    }

    /// Fetch every page of a flat listing, collecting the arrays under
    /// `items_key`.
    async fn list_flat<T>(&self, url: &str, items_key: &str, filter: &str) -> Result<Vec<T>>
    where
        T: for<'v> From<&'v Value>,
    {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .get(&Self::paged_url(url, filter, page_token.as_deref()))
                .await?;
            if let Some(arr) = page.get(items_key).and_then(|v| v.as_array()) {
                items.extend(arr.iter().map(T::from));
            }

            page_token = page
                .get("nextPageToken")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            if page_token.is_none() {
                break;
            }
        }

        Ok(items)
    }

    /// Fetch every page of an aggregated compute listing, keeping the
    /// per-zone partitioning. Scope keys arrive as `zones/<zone>`;
    /// entries without the collection key carry only a warning and are
    /// skipped.
    async fn list_aggregated(
        &self,
        resource: &str,
        collection_key: &str,
        filter: &str,
    ) -> Result<Zoned<Item>> {
        let url = self.compute_aggregated_url(resource);
        let mut zoned: Zoned<Item> = BTreeMap::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .get(&Self::paged_url(&url, filter, page_token.as_deref()))
                .await?;
            if let Some(scopes) = page.get("items").and_then(|v| v.as_object()) {
                for (scope, entry) in scopes {
                    let Some(arr) = entry.get(collection_key).and_then(|v| v.as_array()) else {
                        continue;
                    };
                    let zone = scope.strip_prefix("zones/").unwrap_or(scope).to_string();
                    zoned.entry(zone).or_default().extend(arr.iter().map(Item::from));
                }
            }

            page_token = page
                .get("nextPageToken")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            if page_token.is_none() {
                break;
            }
        }

        Ok(zoned)
    }
}

#[async_trait]
impl Reader for GcpReader {
    async fn list_instances(&self, filter: &str) -> Result<Zoned<Item>> {
        self.list_aggregated("instances", "instances", filter).await
    }

    async fn list_instance_groups(&self, filter: &str) -> Result<Zoned<Item>> {
        self.list_aggregated("instanceGroups", "instanceGroups", filter)
            .await
    }

    async fn list_disks(&self, filter: &str) -> Result<Zoned<Item>> {
        self.list_aggregated("disks", "disks", filter).await
    }

    async fn list_firewalls(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("firewalls"), "items", filter)
            .await
    }

    async fn list_networks(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("networks"), "items", filter)
            .await
    }

    async fn list_health_checks(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("healthChecks"), "items", filter)
            .await
    }

    async fn list_backend_services(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("backendServices"), "items", filter)
            .await
    }

    async fn list_backend_buckets(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("backendBuckets"), "items", filter)
            .await
    }

    async fn list_ssl_certificates(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("sslCertificates"), "items", filter)
            .await
    }

    async fn list_target_http_proxies(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("targetHttpProxies"), "items", filter)
            .await
    }

    async fn list_target_https_proxies(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("targetHttpsProxies"), "items", filter)
            .await
    }

    async fn list_url_maps(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("urlMaps"), "items", filter)
            .await
    }

    async fn list_global_forwarding_rules(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_global_url("forwardingRules"), "items", filter)
            .await
    }

    async fn list_forwarding_rules(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.compute_regional_url("forwardingRules"), "items", filter)
            .await
    }

    async fn list_buckets(&self) -> Result<Vec<Item>> {
        let url = self.storage_url(&format!("b?project={}", self.project));
        self.list_flat(&url, "items", "").await
    }

    async fn list_sql_instances(&self, filter: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.sqladmin_url("instances"), "items", filter)
            .await
    }

    async fn list_managed_zones(&self) -> Result<Vec<Item>> {
        self.list_flat(&self.dns_url("managedZones"), "managedZones", "")
            .await
    }

    async fn list_record_sets(&self, zones: &[String]) -> Result<Zoned<RecordSetItem>> {
        let mut zoned: Zoned<RecordSetItem> = BTreeMap::new();
        for zone in zones {
            let url = self.dns_url(&format!("managedZones/{}/rrsets", zone));
            let sets = self.list_flat(&url, "rrsets", "").await?;
            zoned.insert(zone.clone(), sets);
        }
        Ok(zoned)
    }

    async fn list_custom_roles(&self, parent: &str) -> Result<Vec<Item>> {
        self.list_flat(&self.iam_url(&format!("{}/roles", parent)), "roles", "")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reader() -> GcpReader {
        GcpReader::with_endpoints(
            Credentials::with_static_token("test-token"),
            Endpoints::default(),
            "test-project",
            "us-central1-a",
        )
        .unwrap()
    }

    #[test]
    fn test_region_is_derived_from_zone() {
        assert_eq!(reader().region(), "us-central1");
    }

    #[test]
    fn test_paged_url_skips_neutral_filter() {
        let url = GcpReader::paged_url("https://x/instances", "", None);
        assert_eq!(url, "https://x/instances");
    }

    #[test]
    fn test_paged_url_encodes_filter_and_token() {
        let url = GcpReader::paged_url("https://x/instances", "(labels.env=prod)", Some("t1"));
        assert_eq!(
            url,
            "https://x/instances?filter=%28labels.env%3Dprod%29&pageToken=t1"
        );
    }

    #[test]
    fn test_paged_url_appends_to_existing_query() {
        let url = GcpReader::paged_url("https://x/b?project=p", "", Some("t1"));
        assert_eq!(url, "https://x/b?project=p&pageToken=t1");
    }

    #[test]
    fn test_item_from_json_value() {
        let item = Item::from(&json!({"name": "web-1", "status": "RUNNING"}));
        assert_eq!(item.name, "web-1");
    }

    #[test]
    fn test_record_set_item_from_json_value() {
        let rrset = RecordSetItem::from(&json!({"name": "www", "type": "A", "ttl": 300}));
        assert_eq!(rrset.name, "www");
        assert_eq!(rrset.record_type, "A");
    }

    #[test]
    fn test_compute_urls() {
        let r = reader();
        assert_eq!(
            r.compute_global_url("networks"),
            "https://compute.googleapis.com/compute/v1/projects/test-project/global/networks"
        );
        assert_eq!(
            r.compute_aggregated_url("instances"),
            "https://compute.googleapis.com/compute/v1/projects/test-project/aggregated/instances"
        );
        assert_eq!(
            r.compute_regional_url("forwardingRules"),
            "https://compute.googleapis.com/compute/v1/projects/test-project/regions/us-central1/forwardingRules"
        );
    }
}
