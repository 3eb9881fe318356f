//! HTTP Object Storage - 通过 HTTP PUT 上传到对象存储
//!
//! PUT {endpoint}/{bucket}/{folder}/{file_name}

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::local_object_storage::object_key;
use crate::application::ports::{ObjectStoragePort, StorageError, UploadObject};

#[derive(Debug, Clone)]
pub struct HttpObjectStorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: Option<String>,
    /// 对外访问的 URL 前缀
    pub public_base_url: String,
    pub timeout_secs: u64,
}

pub struct HttpObjectStorage {
    client: Client,
    config: HttpObjectStorageConfig,
}

impl HttpObjectStorage {
    pub fn new(config: HttpObjectStorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::NetworkError(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn upload_url(&self, key: &str) -> String {
        let endpoint = self.config.endpoint.trim_end_matches('/');
        let bucket = self.config.bucket.trim_matches('/');
        if bucket.is_empty() {
            format!("{}/{}", endpoint, key)
        } else {
            format!("{}/{}/{}", endpoint, bucket, key)
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl ObjectStoragePort for HttpObjectStorage {
    async fn upload(&self, object: UploadObject) -> Result<String, StorageError> {
        let key = object_key(&object.folder, &object.file_name)?;
        let size = object.data.len();

        let mut builder = self
            .client
            .put(self.upload_url(&key))
            .header(reqwest::header::CONTENT_TYPE, object.content_type)
            .body(object.data);
        if let Some(access_key) = &self.config.access_key {
            builder = builder.bearer_auth(access_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StorageError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UploadRejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let url = self.public_url(&key);
        tracing::info!(url = %url, size = size, "Object uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(bucket: &str) -> HttpObjectStorage {
        HttpObjectStorage::new(HttpObjectStorageConfig {
            endpoint: "http://s3.local/".into(),
            bucket: bucket.into(),
            access_key: None,
            public_base_url: "https://cdn.example.com/".into(),
            timeout_secs: 30,
        })
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let s = storage("media");
        assert_eq!(s.upload_url("sound/music/a.mp3"), "http://s3.local/media/sound/music/a.mp3");
        assert_eq!(s.public_url("sound/music/a.mp3"), "https://cdn.example.com/sound/music/a.mp3");
        assert_eq!(storage("").upload_url("a.mp3"), "http://s3.local/a.mp3");
    }
}
