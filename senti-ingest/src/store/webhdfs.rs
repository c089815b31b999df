//! Secondary store over the WebHDFS REST API
//!
//! Operations used:
//! - `PUT  /webhdfs/v1/<path>?op=MKDIRS`
//! - `PUT  /webhdfs/v1/<path>?op=CREATE&overwrite=true` (two-step: the namenode
//!   answers 307 with a datanode `Location`, the data is PUT there)
//! - `GET  /webhdfs/v1/<path>?op=GETFILESTATUS`
//!
//! API Documentation: https://hadoop.apache.org/docs/stable/hadoop-project-dist/hadoop-hdfs/WebHDFS.html

use super::{ObjectStore, StoreError};
use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode, Url};
use senti_common::config::SecondaryConfig;
use std::path::{Component, Path};
use std::time::Duration;

/// WebHDFS client
///
/// Holds one pooled HTTP client; cheap to share behind an `Arc`.
pub struct WebHdfsStore {
    client: Client,
    base_url: String,
    user: Option<String>,
}

impl WebHdfsStore {
    /// Build a client for the namenode at `base_url` (e.g. `http://localhost:9870`)
    pub fn new(
        base_url: impl Into<String>,
        user: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        // Redirects are followed by hand so the body goes only to the datanode
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| StoreError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user,
        })
    }

    pub fn from_config(config: &SecondaryConfig) -> Result<Self, StoreError> {
        Self::new(
            config.uri.clone(),
            config.user.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Open a connection: verify the namenode answers, then create the mirror roots
    pub async fn connect(config: &SecondaryConfig) -> Result<Self, StoreError> {
        let store = Self::from_config(config)?;

        store
            .exists(Path::new("/"))
            .await
            .map_err(|e| StoreError::Unavailable(format!("{} unreachable: {}", config.uri, e)))?;

        store.mkdir_all(Path::new(&config.raw_root)).await?;
        store.mkdir_all(Path::new(&config.preprocessed_root)).await?;

        tracing::info!("Connected to WebHDFS at {}", config.uri);
        Ok(store)
    }

    fn op_url(&self, path: &Path, op: &str, extra: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&format!("{}/webhdfs/v1{}", self.base_url, hdfs_path(path)))
            .map_err(|e| StoreError::Http(format!("Invalid WebHDFS URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("op", op);
            for (key, value) in extra {
                query.append_pair(key, value);
            }
            if let Some(user) = &self.user {
                query.append_pair("user.name", user);
            }
        }
        Ok(url)
    }

    async fn status_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        StoreError::Status { status, message }
    }
}

/// Render a path as an absolute, `/`-separated HDFS path
pub fn hdfs_path(path: &Path) -> String {
    let segments: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    format!("/{}", segments.join("/"))
}

fn http_error(e: reqwest::Error) -> StoreError {
    StoreError::Http(e.to_string())
}

#[async_trait]
impl ObjectStore for WebHdfsStore {
    fn name(&self) -> &str {
        "webhdfs"
    }

    async fn mkdir_all(&self, path: &Path) -> Result<(), StoreError> {
        let url = self.op_url(path, "MKDIRS", &[])?;
        let response = self.client.put(url).send().await.map_err(http_error)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    async fn create_or_truncate(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        let url = self.op_url(path, "CREATE", &[("overwrite", "true")])?;
        let response = self.client.put(url.clone()).send().await.map_err(http_error)?;

        let response = match response.status() {
            StatusCode::TEMPORARY_REDIRECT => {
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| StoreError::Status {
                        status: 307,
                        message: "CREATE redirect without Location header".to_string(),
                    })?;
                let target = url
                    .join(location)
                    .map_err(|e| StoreError::Http(format!("Invalid datanode location: {}", e)))?;

                tracing::debug!("WebHDFS CREATE redirected to {}", target);
                self.client
                    .put(target)
                    .body(contents.to_vec())
                    .send()
                    .await
                    .map_err(http_error)?
            }
            _ => return Err(Self::status_error(response).await),
        };

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        let url = self.op_url(path, "GETFILESTATUS", &[])?;
        let response = self.client.get(url).send().await.map_err(http_error)?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::status_error(response).await),
        }
    }
}
