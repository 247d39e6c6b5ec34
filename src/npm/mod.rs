//! npm registry integration: version lookup and publishing

pub mod npm_client;
pub mod registry_client;

pub use npm_client::{NpmClient, NpmClientFactory, classify_publish_failure};
pub use registry_client::{NpmRegistryClient, escape_package_name, latest_version};
