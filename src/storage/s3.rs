use super::{Container, ObjectStore};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

/// One S3 bucket standing in for the storage account; containers become the
/// first key segment (`bronze/ridership_raw.csv`).
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }
}

fn object_key(container: Container, path: &str) -> String {
    format!("{}/{}", container.name(), path.trim_start_matches('/'))
}

#[async_trait]
impl ObjectStore for S3Store {
    fn backend(&self) -> &'static str {
        "s3"
    }

    async fn get(&self, container: Container, path: &str) -> Result<Option<Vec<u8>>> {
        let key = object_key(container, path);
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    return Ok(None);
                }
                return Err(PipelineError::storage(
                    "s3",
                    format!("GetObject {key}: {}", DisplayErrorContext(&service)),
                ));
            }
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| PipelineError::storage("s3", format!("reading {key}: {e}")))?
            .into_bytes();

        debug!(bucket = %self.bucket, key = %key, bytes = body.len(), "S3 object read");
        Ok(Some(body.to_vec()))
    }

    async fn put(&self, container: Container, path: &str, body: Vec<u8>) -> Result<()> {
        let key = object_key(container, path);
        let len = body.len();
        let content_type = if key.ends_with(".json") {
            "application/json"
        } else if key.ends_with(".gz") {
            "application/gzip"
        } else {
            "text/csv"
        };

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                PipelineError::storage("s3", format!("PutObject {key}: {}", DisplayErrorContext(&e)))
            })?;

        debug!(bucket = %self.bucket, key = %key, bytes = len, "S3 object written");
        Ok(())
    }
}
