//! Object storage over the hosted storage API.

use reqwest::Method;
use serde::Serialize;
use shutterfeed_core::repository::MediaStore;
use shutterfeed_types::error::RepositoryError;

use super::client::HostedClient;

#[derive(Serialize)]
struct RemoveBody<'a> {
    prefixes: &'a [String],
}

pub struct HostedMediaStore {
    client: HostedClient,
}

impl HostedMediaStore {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }
}

impl MediaStore for HostedMediaStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, RepositoryError> {
        let request = self
            .client
            .request(Method::POST, &format!("/storage/v1/object/{bucket}/{path}"))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes.to_vec());
        self.client.send(request).await?;
        tracing::debug!(bucket, path, size = bytes.len(), "object uploaded");
        Ok(self.public_url(bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), RepositoryError> {
        if paths.is_empty() {
            return Ok(());
        }
        let request = self
            .client
            .request(Method::DELETE, &format!("/storage/v1/object/{bucket}"))
            .json(&RemoveBody { prefixes: paths });
        match self.client.send(request).await {
            Ok(_) | Err(RepositoryError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.client.base_url()
        )
    }
}
