//! Audio Probe Port - 音频时长探测

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AudioProbeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Audio Probe Port
///
/// 纯 CPU 操作，同步接口
pub trait AudioProbePort: Send + Sync {
    /// 返回音频时长（秒）
    fn duration_secs(&self, data: &[u8], extension_hint: &str) -> Result<f64, AudioProbeError>;
}
