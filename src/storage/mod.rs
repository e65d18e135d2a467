//! The medallion storage layer.
//!
//! One storage account holds three containers. [`ObjectStore`] addresses an
//! object by container and path; every `put` replaces whatever was there.

mod adls;
mod codec;
mod local;
mod s3;

pub use adls::AdlsStore;
pub use codec::{decode_body, read_csv, write_csv, write_json};
pub(crate) use codec::fetch_object;
pub use local::LocalStore;
pub use s3::S3Store;

use crate::config::{AdlsCredential, StorageConfig};
use crate::error::Result;
use crate::fetch::BasicClient;
use crate::fetch::auth::{ApiKey, SasToken};
use async_trait::async_trait;
use std::fmt;
use tracing::info;

/// Bronze holds raw data, Silver cleaned data, Gold aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Bronze,
    Silver,
    Gold,
}

impl Container {
    pub const ALL: [Container; 3] = [Container::Bronze, Container::Silver, Container::Gold];

    /// Filesystem name as provisioned by Terraform.
    pub fn name(self) -> &'static str {
        match self {
            Container::Bronze => "bronze",
            Container::Silver => "silver",
            Container::Gold => "gold",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logs and errors.
    fn backend(&self) -> &'static str;

    /// Reads a whole object. `Ok(None)` means the object does not exist.
    async fn get(&self, container: Container, path: &str) -> Result<Option<Vec<u8>>>;

    /// Creates or overwrites an object.
    async fn put(&self, container: Container, path: &str, body: Vec<u8>) -> Result<()>;
}

/// Object names used by the stages.
pub mod objects {
    pub const RAW: &str = "ridership_raw.csv";
    pub const CLEAN: &str = "ridership_clean.csv";
    pub const FEATURES: &str = "ridership_features.csv";
    pub const MODEL: &str = "models/ridership_model.json";

    /// Silver and Gold objects get a `.gz` suffix when compression is on.
    pub fn with_compression(name: &str, gzip: bool) -> String {
        if gzip {
            format!("{name}.gz")
        } else {
            name.to_string()
        }
    }
}

/// Builds the configured backend. Credentials are resolved here, once.
pub async fn connect(config: &StorageConfig) -> Result<Box<dyn ObjectStore>> {
    let store: Box<dyn ObjectStore> = match config {
        StorageConfig::Adls {
            account,
            credential,
        } => {
            let client = BasicClient::new()?;
            match credential {
                AdlsCredential::Sas(token) => {
                    Box::new(AdlsStore::new(account, SasToken::new(client, token)))
                }
                AdlsCredential::Bearer(token) => {
                    Box::new(AdlsStore::new(account, ApiKey::bearer(client, token)?))
                }
            }
        }
        StorageConfig::S3 { bucket } => {
            let sdk_config = aws_config::load_from_env().await;
            Box::new(S3Store::new(aws_sdk_s3::Client::new(&sdk_config), bucket))
        }
        StorageConfig::Local { root } => Box::new(LocalStore::new(root)),
    };

    info!(backend = store.backend(), "Storage backend ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_names_match_filesystems() {
        let names: Vec<_> = Container::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["bronze", "silver", "gold"]);
        assert_eq!(Container::Gold.to_string(), "gold");
    }

    #[test]
    fn test_compressed_object_name() {
        assert_eq!(
            objects::with_compression(objects::CLEAN, true),
            "ridership_clean.csv.gz"
        );
        assert_eq!(objects::with_compression(objects::CLEAN, false), objects::CLEAN);
    }
}
