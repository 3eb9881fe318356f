//! Storage Adapter - 对象存储实现

mod http_object_storage;
mod local_object_storage;

pub use http_object_storage::{HttpObjectStorage, HttpObjectStorageConfig};
pub use local_object_storage::LocalObjectStorage;
