//! Configuration for the S3 cache backend.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tidycache_core::{Error, Result};

/// Environment variable consulted when no endpoint is configured.
pub const ENDPOINT_ENV: &str = "CLANG_TIDY_CACHE_S3_BASE_ENDPOINT";
/// Environment variable consulted when no bucket is configured.
pub const BUCKET_ENV: &str = "CLANG_TIDY_CACHE_S3_BUCKET_NAME";

/// Explicit backend configuration. Every field is optional; empty strings
/// count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct S3Configuration {
    /// S3 endpoint URL, e.g. `http://localhost:9000`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_endpoint: Option<String>,
    /// Bucket holding all cache objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    /// Region override. Falls back to the AWS provider chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Address buckets by path instead of virtual host (MinIO and friends).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_path_style: Option<bool>,
    /// Per-operation timeout applied by the S3 client, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl S3Configuration {
    /// Create a config with an explicit endpoint and bucket.
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            base_endpoint: Some(endpoint.into()),
            bucket_name: Some(bucket.into()),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_force_path_style(mut self, enable: bool) -> Self {
        self.force_path_style = Some(enable);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        // Sub-millisecond timeouts round up to 1 ms
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.request_timeout_ms = Some(if timeout.is_zero() { 0 } else { millis.max(1) });
        self
    }

    /// Load configuration from a JSON or YAML file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&contents)?),
            _ => Ok(serde_json::from_str(&contents)?),
        }
    }

    /// Resolve endpoint and bucket, consulting `lookup` for anything the
    /// explicit configuration leaves empty.
    ///
    /// The endpoint is mandatory. An empty bucket is tolerated here and
    /// surfaces later as a failed bucket check.
    pub fn resolve<F>(&self, lookup: F) -> Result<ResolvedConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = non_empty(self.base_endpoint.as_deref())
            .or_else(|| non_empty(lookup(ENDPOINT_ENV).as_deref()))
            .ok_or_else(|| Error::Configuration(format!("`{}` must be set", ENDPOINT_ENV)))?;

        let bucket = non_empty(self.bucket_name.as_deref())
            .or_else(|| lookup(BUCKET_ENV))
            .unwrap_or_default();

        let request_timeout = match self.request_timeout_ms {
            Some(0) => {
                return Err(Error::Configuration(
                    "request timeout must be greater than zero".into(),
                ));
            }
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        Ok(ResolvedConfig {
            endpoint,
            bucket,
            region: non_empty(self.region.as_deref()),
            force_path_style: self.force_path_style.unwrap_or(false),
            request_timeout,
        })
    }
}

/// Read a variable from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Fully resolved configuration, fixed for the lifetime of an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub bucket: String,
    pub region: Option<String>,
    pub force_path_style: bool,
    pub request_timeout: Option<Duration>,
}

impl ResolvedConfig {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            region: None,
            force_path_style: false,
            request_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_explicit_values_win_over_env() {
        let config = S3Configuration::new("http://explicit:9000", "explicit-bucket");
        let resolved = config
            .resolve(env(&[
                (ENDPOINT_ENV, "http://env:9000"),
                (BUCKET_ENV, "env-bucket"),
            ]))
            .unwrap();

        assert_eq!(resolved, ResolvedConfig::new("http://explicit:9000", "explicit-bucket"));
    }

    #[test]
    fn test_env_fills_missing_values() {
        let resolved = S3Configuration::default()
            .resolve(env(&[
                (ENDPOINT_ENV, "http://env:9000"),
                (BUCKET_ENV, "env-bucket"),
            ]))
            .unwrap();

        assert_eq!(resolved.endpoint, "http://env:9000");
        assert_eq!(resolved.bucket, "env-bucket");
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let config = S3Configuration {
            base_endpoint: Some(String::new()),
            bucket_name: Some(String::new()),
            ..Default::default()
        };
        let resolved = config
            .resolve(env(&[
                (ENDPOINT_ENV, "http://env:9000"),
                (BUCKET_ENV, "env-bucket"),
            ]))
            .unwrap();

        assert_eq!(resolved.endpoint, "http://env:9000");
        assert_eq!(resolved.bucket, "env-bucket");
    }

    #[test]
    fn test_missing_endpoint_is_configuration_error() {
        let err = S3Configuration::default().resolve(env(&[])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains(ENDPOINT_ENV));

        let err = S3Configuration::default()
            .resolve(env(&[(ENDPOINT_ENV, "")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_missing_bucket_is_tolerated() {
        let resolved = S3Configuration::default()
            .resolve(env(&[(ENDPOINT_ENV, "http://env:9000")]))
            .unwrap();
        assert_eq!(resolved.bucket, "");
    }

    #[test]
    fn test_values_are_not_normalized() {
        let config = S3Configuration::new(" http://host:9000/ ", " Bucket ");
        let resolved = config.resolve(env(&[])).unwrap();
        assert_eq!(resolved.endpoint, " http://host:9000/ ");
        assert_eq!(resolved.bucket, " Bucket ");
    }

    #[test]
    fn test_supplemental_settings() {
        let config = S3Configuration::new("http://host:9000", "cache")
            .with_region("eu-west-1")
            .with_force_path_style(true)
            .with_request_timeout(Duration::from_secs(30));
        let resolved = config.resolve(env(&[])).unwrap();

        assert_eq!(resolved.region.as_deref(), Some("eu-west-1"));
        assert!(resolved.force_path_style);
        assert_eq!(resolved.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_subsecond_timeout_is_kept() {
        let resolved = S3Configuration::new("http://host:9000", "cache")
            .with_request_timeout(Duration::from_millis(500))
            .resolve(env(&[]))
            .unwrap();
        assert_eq!(resolved.request_timeout, Some(Duration::from_millis(500)));

        let resolved = S3Configuration::new("http://host:9000", "cache")
            .with_request_timeout(Duration::from_millis(1900))
            .resolve(env(&[]))
            .unwrap();
        assert_eq!(resolved.request_timeout, Some(Duration::from_millis(1900)));

        let resolved = S3Configuration::new("http://host:9000", "cache")
            .with_request_timeout(Duration::from_micros(10))
            .resolve(env(&[]))
            .unwrap();
        assert_eq!(resolved.request_timeout, Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_zero_timeout_is_configuration_error() {
        let err = S3Configuration::new("http://host:9000", "cache")
            .with_request_timeout(Duration::ZERO)
            .resolve(env(&[]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let config: S3Configuration =
            serde_json::from_str(r#"{"baseEndpoint": "http://host:9000", "requestTimeoutMs": 0}"#)
                .unwrap();
        assert!(matches!(config.resolve(env(&[])), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"baseEndpoint": "http://localhost:9000", "bucketName": "test-bucket"}}"#
        )
        .unwrap();

        let config = S3Configuration::from_file(file.path()).unwrap();
        assert_eq!(
            config,
            S3Configuration::new("http://localhost:9000", "test-bucket")
        );
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "baseEndpoint: http://localhost:9000").unwrap();
        writeln!(file, "forcePathStyle: true").unwrap();

        let config = S3Configuration::from_file(file.path()).unwrap();
        assert_eq!(config.base_endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.bucket_name, None);
        assert_eq!(config.force_path_style, Some(true));
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "not json").unwrap();

        let err = S3Configuration::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
