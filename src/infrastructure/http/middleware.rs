//! HTTP Middleware
//!
//! 请求耗时与 HTTP 状态码日志

use std::time::{Duration, Instant};

use axum::{extract::Request, middleware::Next, response::Response};

/// 超过该耗时的请求记为慢请求
const SLOW_REQUEST: Duration = Duration::from_secs(60);

/// 请求日志中间件
///
/// 4xx/5xx 按级别记录；业务错误（errno != 0）仍是 HTTP 200，在 ApiError::into_response() 中记录。
/// 工作流请求可能持续数分钟，慢请求单独告警。
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    } else if started.elapsed() >= SLOW_REQUEST {
        tracing::warn!(method = %method, uri = %uri, elapsed_ms, "Slow request");
    } else {
        tracing::debug!(method = %method, uri = %uri, elapsed_ms, "Request finished");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;

    use crate::infrastructure::http::ApiError;

    async fn ok_handler() -> &'static str {
        "OK"
    }

    async fn bad_request_handler() -> Result<&'static str, ApiError> {
        Err(ApiError::BadRequest("count must be at least 1".into()))
    }

    async fn error_handler() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn create_test_router() -> Router {
        Router::new()
            .route("/ok", get(ok_handler))
            .route("/bad", get(bad_request_handler))
            .route("/error", get(error_handler))
            .layer(axum::middleware::from_fn(request_logging_middleware))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = HttpRequest::builder().uri(uri).body(Body::empty()).unwrap();
        create_test_router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_status_passes_through() {
        assert_eq!(status_of("/ok").await, StatusCode::OK);
        assert_eq!(status_of("/error").await, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_of("/missing").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_business_error_stays_http_200() {
        assert_eq!(status_of("/bad").await, StatusCode::OK);
    }
}
