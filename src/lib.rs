/// Baykeeper - cluster bay lifecycle
///
/// The resource-lifecycle layer of a container-cluster management service:
/// reconciles declarative manifests (pods, services, replication controllers)
/// against a cluster API endpoint via kubectl, and maintains the catalog of
/// bays and their child resources in a relational store.
pub mod config;
pub mod kube;
pub mod store;
pub mod utils;
