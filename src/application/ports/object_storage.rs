//! Object Storage Port - 对象存储上传

use async_trait::async_trait;
use thiserror::Error;

/// 存储错误
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Upload rejected (HTTP {status}): {message}")]
    UploadRejected { status: u16, message: String },

    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

/// 上传对象
#[derive(Debug, Clone)]
pub struct UploadObject {
    pub data: Vec<u8>,
    /// 目标目录（如 `sound/effects`）
    pub folder: String,
    /// 文件名（含扩展名）
    pub file_name: String,
    pub content_type: String,
}

/// 根据内容生成对象文件名：`{md5}.{ext}`
///
/// 相同内容得到相同 key，重复上传会覆盖同一对象
pub fn content_addressed_name(data: &[u8], extension: &str) -> String {
    let digest = md5::compute(data);
    format!("{:x}.{}", digest, extension)
}

/// Object Storage Port
#[async_trait]
pub trait ObjectStoragePort: Send + Sync {
    /// 上传并返回公开访问 URL
    async fn upload(&self, object: UploadObject) -> Result<String, StorageError>;
}
