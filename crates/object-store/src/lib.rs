use aws_sdk_s3::primitives::ByteStream;
use chrono::NaiveDate;
use screener_core::ScreenError;
use std::path::Path;

/// S3 sink for run artifacts. Constructed only when `AWS_BUCKET` is set;
/// an absent store means uploads are silently skipped upstream.
pub struct ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
}

impl ObjectStore {
    /// Build from `AWS_BUCKET` / `AWS_REGION` / `S3_PREFIX`. Returns
    /// `None` when no bucket is configured.
    pub async fn from_env() -> Option<Self> {
        let bucket = std::env::var("AWS_BUCKET").ok().filter(|s| !s.is_empty())?;
        let prefix = std::env::var("S3_PREFIX").unwrap_or_default();

        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(std::time::Duration::from_secs(60))
            .build();
        let mut loader = aws_config::from_env().timeout_config(timeouts);
        if let Ok(region) = std::env::var("AWS_REGION") {
            if !region.is_empty() {
                loader = loader.region(aws_config::Region::new(region));
            }
        }
        let config = loader.load().await;

        tracing::info!("Object store enabled (bucket: {})", bucket);
        Some(Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket,
            prefix,
        })
    }

    /// Dated object key for one artifact kind, e.g.
    /// `{prefix}screening_results_2026-08-07.csv`.
    pub fn dated_key(&self, kind: &str, date: NaiveDate) -> String {
        format!("{}{}_{}.csv", self.prefix, kind, date.format("%Y-%m-%d"))
    }

    /// Upload one local file under the given key.
    pub async fn upload_file(&self, local: &Path, key: &str) -> Result<(), ScreenError> {
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| ScreenError::SinkFailure(format!("read {}: {}", local.display(), e)))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("text/csv")
            .body(body)
            .send()
            .await
            .map_err(|e| ScreenError::SinkFailure(format!("upload s3://{}/{}: {}", self.bucket, key, e)))?;

        tracing::info!("Uploaded {} to s3://{}/{}", local.display(), self.bucket, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_for_tests(prefix: &str) -> ObjectStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        ObjectStore {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket: "bucket".to_string(),
            prefix: prefix.to_string(),
        }
    }

    #[test]
    fn dated_keys_follow_layout() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let store = store_for_tests("screens/");
        assert_eq!(
            store.dated_key("screening_results", date),
            "screens/screening_results_2026-08-07.csv"
        );
        assert_eq!(
            store.dated_key("watchlist", date),
            "screens/watchlist_2026-08-07.csv"
        );
    }

    #[test]
    fn empty_prefix_is_bare_key() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let store = store_for_tests("");
        assert_eq!(store.dated_key("watchlist", date), "watchlist_2026-08-07.csv");
    }
}
