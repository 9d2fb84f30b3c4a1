//! MinIO container standing in for the remote cache bucket store.

use crate::context::s3_client;
use aws_sdk_s3::Client;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::minio::MinIO;

const MINIO_TAG: &str = "RELEASE.2024-10-13T13-34-11Z";
const S3_PORT: u16 = 9000;

/// Root credentials the server is started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinioCredentials {
    pub access_key: String,
    pub secret_key: String,
}

impl MinioCredentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl Default for MinioCredentials {
    fn default() -> Self {
        Self::new("tidycache", "tidycache-secret")
    }
}

/// A running MinIO server with an admin client bound to its root user.
pub struct MinioContainer {
    // Dropping the handle stops the container
    _container: ContainerAsync<MinIO>,
    endpoint: String,
    credentials: MinioCredentials,
    admin: Client,
}

impl MinioContainer {
    /// Start MinIO with default credentials and no buckets.
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(MinioCredentials::default(), &[]).await
    }

    /// Start MinIO as `credentials` and create `buckets` before returning.
    pub async fn start_with(
        credentials: MinioCredentials,
        buckets: &[&str],
    ) -> anyhow::Result<Self> {
        let container = MinIO::default()
            .with_tag(MINIO_TAG)
            .with_env_var("MINIO_ROOT_USER", credentials.access_key.clone())
            .with_env_var("MINIO_ROOT_PASSWORD", credentials.secret_key.clone())
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(S3_PORT).await?;
        let endpoint = format!("http://{}:{}", host, port);
        let admin = s3_client(&endpoint, &credentials.access_key, &credentials.secret_key);

        let minio = Self {
            _container: container,
            endpoint,
            credentials,
            admin,
        };
        for bucket in buckets {
            minio.create_bucket(bucket).await?;
        }
        Ok(minio)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credentials(&self) -> &MinioCredentials {
        &self.credentials
    }

    /// Client authenticated as the root user.
    pub fn admin(&self) -> &Client {
        &self.admin
    }

    pub async fn create_bucket(&self, bucket: &str) -> anyhow::Result<()> {
        self.admin.create_bucket().bucket(bucket).send().await?;
        Ok(())
    }
}
