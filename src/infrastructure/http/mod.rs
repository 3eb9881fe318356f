//! HTTP Layer - RESTful API
//!
//! 每个功能一个 POST 路由，统一 `{errno, error, data}` 响应信封

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{HttpServer, ServerConfig};
pub use state::AppState;
