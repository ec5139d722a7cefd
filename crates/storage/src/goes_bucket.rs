//! Anonymous read access to the public NOAA GOES bucket.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use chrono::{TimeZone, Utc};
use sat_common::{SatError, SatResult};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::scene::{ObjectEntry, SceneSource};

/// Bucket connection settings.
#[derive(Debug, Clone)]
pub struct GoesBucketConfig {
    pub bucket: String,
    pub region: String,
    /// Applied to every S3 operation, including the full download.
    pub operation_timeout: Duration,
    /// Page size for `list_objects_v2`.
    pub page_size: i32,
}

impl Default for GoesBucketConfig {
    fn default() -> Self {
        Self {
            bucket: "noaa-goes19".to_string(),
            region: "us-east-1".to_string(),
            operation_timeout: Duration::from_secs(120),
            page_size: 1000,
        }
    }
}

/// [`SceneSource`] backed by unsigned S3 requests.
#[derive(Clone)]
pub struct GoesBucket {
    client: aws_sdk_s3::Client,
    config: GoesBucketConfig,
}

impl GoesBucket {
    /// Build a client that sends unsigned requests, which the NOAA open data
    /// buckets accept.
    pub async fn anonymous(config: GoesBucketConfig) -> Self {
        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(config.operation_timeout)
            .build();
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .no_credentials()
            .timeout_config(timeouts)
            .load()
            .await;
        Self {
            client: aws_sdk_s3::Client::new(&aws_config),
            config,
        }
    }
}

#[async_trait]
impl SceneSource for GoesBucket {
    #[instrument(skip(self), fields(bucket = %self.config.bucket))]
    async fn list(&self, prefix: &str) -> SatResult<Vec<ObjectEntry>> {
        let mut entries = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(prefix)
                .max_keys(self.config.page_size);

            if let Some(ref token) = continuation_token {
                request = request.continuation_token(token.clone());
            }

            let response = request.send().await.map_err(|e| {
                SatError::Upstream(format!(
                    "S3 list_objects_v2 {} failed: {}",
                    prefix,
                    DisplayErrorContext(&e)
                ))
            })?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    entries.push(ObjectEntry {
                        key: key.to_string(),
                        last_modified: object
                            .last_modified()
                            .and_then(|t| Utc.timestamp_opt(t.secs(), 0).single()),
                        size: object.size(),
                    });
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        debug!(count = entries.len(), "Listed objects");
        Ok(entries)
    }

    #[instrument(skip(self, dest), fields(bucket = %self.config.bucket))]
    async fn download(&self, key: &str, dest: &Path) -> SatResult<u64> {
        let output = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                SatError::Upstream(format!("S3 get_object {} failed: {}", key, DisplayErrorContext(&e)))
            })?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut body = output.body;
        let mut written = 0u64;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| SatError::Upstream(format!("S3 body for {} failed: {}", key, e)))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(bytes = written, "Downloaded object");
        Ok(written)
    }
}
