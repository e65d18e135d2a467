//! Process configuration.
//!
//! Everything is read once at start-up from the environment (after `.env`
//! has been loaded) and held for the lifetime of the process.

mod columns;

pub use columns::{ColumnMapping, normalize_column};

use crate::error::{PipelineError, Result};
use std::path::PathBuf;

pub const ACCOUNT_NAME_VAR: &str = "AZURE_STORAGE_ACCOUNT_NAME";
pub const SAS_TOKEN_VAR: &str = "AZURE_STORAGE_SAS_TOKEN";
pub const ACCESS_TOKEN_VAR: &str = "AZURE_STORAGE_ACCESS_TOKEN";
pub const BACKEND_VAR: &str = "LAKE_BACKEND";
pub const S3_BUCKET_VAR: &str = "LAKE_S3_BUCKET";
pub const LOCAL_ROOT_VAR: &str = "LAKE_LOCAL_ROOT";
pub const GZIP_VAR: &str = "LAKE_GZIP";
pub const APP_TOKEN_VAR: &str = "TRANSIT_APP_TOKEN";

/// Credential used against the Data Lake DFS endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdlsCredential {
    /// Shared access signature, appended to every request URL.
    Sas(String),
    /// OAuth access token, sent as `Authorization: Bearer`.
    Bearer(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Adls {
        account: String,
        credential: AdlsCredential,
    },
    S3 {
        bucket: String,
    },
    Local {
        root: PathBuf,
    },
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::Adls { .. } => "adls",
            StorageConfig::S3 { .. } => "s3",
            StorageConfig::Local { .. } => "local",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LakeConfig {
    pub storage: StorageConfig,
    /// Gzip Silver and Gold objects.
    pub gzip: bool,
    /// Optional Socrata application token for the ingestion API.
    pub app_token: Option<String>,
}

impl LakeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Empty
    /// values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = get(BACKEND_VAR).unwrap_or_else(|| "adls".to_string());
        let storage = match backend.to_ascii_lowercase().as_str() {
            "adls" => {
                let account = get(ACCOUNT_NAME_VAR).ok_or_else(|| {
                    PipelineError::Configuration(format!(
                        "{ACCOUNT_NAME_VAR} is not set; use the storage_account_name Terraform output"
                    ))
                })?;
                let credential = if let Some(sas) = get(SAS_TOKEN_VAR) {
                    AdlsCredential::Sas(sas.trim_start_matches('?').to_string())
                } else if let Some(token) = get(ACCESS_TOKEN_VAR) {
                    AdlsCredential::Bearer(token)
                } else {
                    return Err(PipelineError::Configuration(format!(
                        "either {SAS_TOKEN_VAR} or {ACCESS_TOKEN_VAR} must be set"
                    )));
                };
                StorageConfig::Adls {
                    account,
                    credential,
                }
            }
            "s3" => StorageConfig::S3 {
                bucket: get(S3_BUCKET_VAR).ok_or_else(|| {
                    PipelineError::Configuration(format!("{S3_BUCKET_VAR} is not set"))
                })?,
            },
            "local" => StorageConfig::Local {
                root: PathBuf::from(get(LOCAL_ROOT_VAR).unwrap_or_else(|| "lake".to_string())),
            },
            other => {
                return Err(PipelineError::Configuration(format!(
                    "unknown {BACKEND_VAR} '{other}' (expected adls, s3 or local)"
                )));
            }
        };

        let gzip = match get(GZIP_VAR).as_deref() {
            None => false,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => {
                return Err(PipelineError::Configuration(format!(
                    "{GZIP_VAR} must be true or false, got '{other}'"
                )));
            }
        };

        Ok(Self {
            storage,
            gzip,
            app_token: get(APP_TOKEN_VAR),
        })
    }
}
