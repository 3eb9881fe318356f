//! HTTP Handlers
//!
//! 校验请求 → 调用功能服务 → 包装为统一响应

mod creative;
mod ping;
mod sound;
mod text;

pub use creative::*;
pub use ping::*;
pub use sound::*;
pub use text::*;
