//! Integration tests for the discovery registry using wiremock
//!
//! These tests drive the full stack - registry, reader, HTTP client -
//! against mocked GCP REST endpoints, covering the aggregated (per-zone)
//! response shape, pagination, the two-stage DNS strategy and error
//! propagation.

use gcpinv::discovery::{Discovery, FilterSpec, ResourceType, TagPredicate};
use gcpinv::gcp::auth::Credentials;
use gcpinv::gcp::reader::{Endpoints, GcpReader};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{bearer_token, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn discovery_for(server: &MockServer) -> Discovery {
    let reader = GcpReader::with_endpoints(
        Credentials::with_static_token("test-token"),
        Endpoints::single_host(&server.uri()),
        "test-project",
        "us-central1-a",
    )
    .expect("reader should build");
    Discovery::new(Arc::new(reader), "test-project")
}

fn ids(handles: &[gcpinv::ResourceHandle<'_>]) -> Vec<String> {
    handles.iter().map(|h| h.id().to_string()).collect()
}

/// Aggregated instance listing keeps its zone partitioning and produces
/// project/zone/name identifiers; warning-only zones contribute nothing.
#[tokio::test]
async fn test_aggregated_instances_become_zone_scoped_handles() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/compute/v1/projects/test-project/aggregated/instances",
        ))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": {
                "zones/us-central1-a": {
                    "instances": [{"name": "web-1"}, {"name": "web-2"}]
                },
                "zones/us-central1-b": {
                    "warning": {"code": "NO_RESULTS_ON_PAGE"}
                }
            }
        })))
        .mount(&server)
        .await;

    let discovery = discovery_for(&server);
    let handles = discovery
        .discover(ResourceType::ComputeInstance, &FilterSpec::none())
        .await
        .expect("discovery should succeed");

    assert_eq!(
        ids(&handles),
        vec![
            "test-project/us-central1-a/web-1",
            "test-project/us-central1-a/web-2"
        ]
    );
    assert!(handles
        .iter()
        .all(|h| h.resource_type() == ResourceType::ComputeInstance));
}

/// The compiled label filter is sent as the `filter` query parameter.
#[tokio::test]
async fn test_label_filter_reaches_the_listing_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/test-project/aggregated/disks"))
        .and(query_param("filter", "(labels.env=prod)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": {
                "zones/us-east1-b": {
                    "disks": [{"name": "disk-1"}, {"name": "disk-2"}]
                }
            }
        })))
        .mount(&server)
        .await;

    let discovery = discovery_for(&server);
    let filters = FilterSpec::new(vec![TagPredicate::new("env", "prod")]);
    let handles = discovery
        .discover(ResourceType::ComputeDisk, &filters)
        .await
        .expect("discovery should succeed");

    // Disk identifiers carry no project segment.
    assert_eq!(ids(&handles), vec!["us-east1-b/disk-1", "us-east1-b/disk-2"]);
}

/// Flat listings follow nextPageToken until exhausted.
#[tokio::test]
async fn test_flat_listing_paginates() {
    let server = MockServer::start().await;

    // First page
    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/test-project/global/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "net-1"}],
            "nextPageToken": "token-page-2"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // Second page
    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/test-project/global/networks"))
        .and(query_param("pageToken", "token-page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "net-2"}]
        })))
        .mount(&server)
        .await;

    let discovery = discovery_for(&server);
    let handles = discovery
        .discover(ResourceType::ComputeNetwork, &FilterSpec::none())
        .await
        .expect("discovery should succeed");

    assert_eq!(ids(&handles), vec!["net-1", "net-2"]);
}

/// Regional listings derive the region from the configured zone.
#[tokio::test]
async fn test_forwarding_rules_use_the_derived_region() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/compute/v1/projects/test-project/regions/us-central1/forwardingRules",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "rule-1"}]
        })))
        .mount(&server)
        .await;

    let discovery = discovery_for(&server);
    let handles = discovery
        .discover(ResourceType::ComputeForwardingRule, &FilterSpec::none())
        .await
        .expect("discovery should succeed");

    assert_eq!(ids(&handles), vec!["rule-1"]);
}

/// The two-stage DNS strategy resolves managed zones first, then lists
/// record sets per zone and joins zone, name and record type.
#[tokio::test]
async fn test_record_sets_resolve_zones_then_list_per_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dns/v1/projects/test-project/managedZones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "managedZones": [{"name": "z1"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dns/v1/projects/test-project/managedZones/z1/rrsets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rrsets": [
                {"name": "www", "type": "A"},
                {"name": "api", "type": "CNAME"}
            ]
        })))
        .mount(&server)
        .await;

    let discovery = discovery_for(&server);
    let handles = discovery
        .discover(ResourceType::DnsRecordSet, &FilterSpec::none())
        .await
        .expect("discovery should succeed");

    assert_eq!(ids(&handles), vec!["z1/www/A", "z1/api/CNAME"]);
    assert!(handles
        .iter()
        .all(|h| h.resource_type() == ResourceType::DnsRecordSet));
}

/// A zone-resolution failure aborts before the record-set endpoint is
/// ever contacted.
#[tokio::test]
async fn test_zone_resolution_failure_never_contacts_record_sets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dns/v1/projects/test-project/managedZones"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Permission denied"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"/rrsets$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rrsets": []})))
        .expect(0)
        .mount(&server)
        .await;

    let discovery = discovery_for(&server);
    let err = discovery
        .discover(ResourceType::DnsRecordSet, &FilterSpec::none())
        .await
        .expect_err("discovery should fail");

    assert_eq!(err.to_string(), "unable to resolve managed zones");
    assert!(format!("{:#}", err).contains("API request failed: 403"));
}

/// Buckets and bucket IAM policies share the same upstream listing but
/// are distinct resource types.
#[tokio::test]
async fn test_buckets_and_bucket_policies_share_the_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(query_param("project", "test-project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "bucket-a"}, {"name": "bucket-b"}]
        })))
        .mount(&server)
        .await;

    let discovery = discovery_for(&server);
    let buckets = discovery
        .discover(ResourceType::StorageBucket, &FilterSpec::none())
        .await
        .expect("bucket discovery should succeed");
    let policies = discovery
        .discover(ResourceType::StorageBucketIamPolicy, &FilterSpec::none())
        .await
        .expect("policy discovery should succeed");

    assert_eq!(ids(&buckets), vec!["bucket-a", "bucket-b"]);
    assert_eq!(ids(&policies), vec!["bucket-a", "bucket-b"]);
    assert!(buckets
        .iter()
        .all(|h| h.resource_type() == ResourceType::StorageBucket));
    assert!(policies
        .iter()
        .all(|h| h.resource_type() == ResourceType::StorageBucketIamPolicy));
}

/// Custom roles are listed under the projects/<project> parent path.
#[tokio::test]
async fn test_custom_roles_list_under_the_project_parent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/test-project/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "roles": [{"name": "projects/test-project/roles/ci-deployer"}]
        })))
        .mount(&server)
        .await;

    let discovery = discovery_for(&server);
    let handles = discovery
        .discover(ResourceType::ProjectIamCustomRole, &FilterSpec::none())
        .await
        .expect("discovery should succeed");

    assert_eq!(ids(&handles), vec!["projects/test-project/roles/ci-deployer"]);
}

/// Upstream failures surface with the strategy's context attached.
#[tokio::test]
async fn test_listing_failure_is_wrapped_with_strategy_context() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/compute/v1/projects/test-project/aggregated/instances",
        ))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": 500, "message": "backend error"}
        })))
        .mount(&server)
        .await;

    let discovery = discovery_for(&server);
    let err = discovery
        .discover(ResourceType::ComputeInstance, &FilterSpec::none())
        .await
        .expect_err("discovery should fail");

    assert_eq!(err.to_string(), "unable to list instances from reader");
    assert!(format!("{:#}", err).contains("API request failed: 500"));
}
