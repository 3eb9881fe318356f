//! Local Object Storage - 本地目录对象存储
//!
//! 文件写到 `{base_dir}/{folder}/{file_name}`，URL 为 `{public_base_url}/{folder}/{file_name}`

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{ObjectStoragePort, StorageError, UploadObject};

/// 拼接对象 key，拒绝越界路径
pub(crate) fn object_key(folder: &str, file_name: &str) -> Result<String, StorageError> {
    let folder = folder.trim_matches('/');
    let key = if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", folder, file_name)
    };

    let valid = !file_name.is_empty()
        && !file_name.contains('/')
        && key.split('/').all(|part| !part.is_empty() && part != "." && part != "..")
        && !key.contains('\\');
    if !valid {
        return Err(StorageError::InvalidKey(key));
    }
    Ok(key)
}

/// 本地目录存储
pub struct LocalObjectStorage {
    /// 存储根目录
    base_dir: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(base_dir: impl AsRef<Path>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// 获取存储根目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl ObjectStoragePort for LocalObjectStorage {
    async fn upload(&self, object: UploadObject) -> Result<String, StorageError> {
        let key = object_key(&object.folder, &object.file_name)?;
        let path = self.base_dir.join(&key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::IoError(e.to_string()))?;
        }
        fs::write(&path, &object.data)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        tracing::debug!(
            path = %path.display(),
            size = object.data.len(),
            content_type = %object.content_type,
            "Stored object locally"
        );

        Ok(format!("{}/{}", self.public_base_url, key))
    }
}
