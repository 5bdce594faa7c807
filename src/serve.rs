//! axum integration
//!
//! Handlers get the resolver by injection: either as an [`Extension`] on any
//! router (`router.layer(urls.layer())`) or as state of [`AssetServer`],
//! which redirects `/assets/*key` to the bucket.

use std::net::SocketAddr;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::assets::AssetStorage;
use crate::error::{AssetError, Result};
use crate::resolver::UrlResolver;

/// Cloneable handle handlers use to build asset URLs
#[derive(Clone)]
pub struct AssetUrls {
    resolver: UrlResolver,
}

impl AssetUrls {
    pub fn new(resolver: UrlResolver) -> Self {
        Self { resolver }
    }

    pub fn from_storage(storage: &AssetStorage) -> Self {
        Self::new(storage.resolver())
    }

    /// Public URL for an asset key
    pub async fn url_for(&self, key: &str) -> Result<String> {
        self.resolver.resolve(key).await
    }

    /// Layer exposing this handle to handlers as `Extension<AssetUrls>`
    pub fn layer(&self) -> Extension<AssetUrls> {
        Extension(self.clone())
    }
}

/// Map an error to the status a client should see
fn error_response(err: AssetError) -> Response {
    let status = match &err {
        AssetError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AssetError::CloudStorage(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!("Asset URL resolution failed: {}", err);
    (status, err.to_string()).into_response()
}

/// HTTP server redirecting asset requests to their bucket URL
pub struct AssetServer {
    urls: AssetUrls,
    addr: SocketAddr,
}

impl AssetServer {
    pub fn new(urls: AssetUrls, port: u16) -> Self {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        Self { urls, addr }
    }

    /// Build the router
    pub fn router(urls: AssetUrls) -> Router {
        Router::new()
            .route("/assets/*key", get(redirect_handler))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(urls)
    }

    /// Start the server
    pub async fn start(self) -> std::io::Result<()> {
        let app = Self::router(self.urls);

        tracing::info!("Asset server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Health check endpoint
async fn health_handler(State(urls): State<AssetUrls>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "bucket": urls.resolver.bucket(),
        "version": crate::VERSION,
    }))
}

/// Temporary redirect to the object's public URL
async fn redirect_handler(State(urls): State<AssetUrls>, Path(key): Path<String>) -> Response {
    match urls.url_for(&key).await {
        Ok(location) => (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, location)],
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_url_for() {
        let store = MemoryObjectStore::new();
        store.create_bucket("my-bucket").unwrap();
        let urls = AssetUrls::new(UrlResolver::new(
            Arc::new(store),
            "my-bucket",
            Duration::from_secs(100),
        ));
        assert_eq!(
            urls.url_for("style.css").await.unwrap(),
            "https://my-bucket.s3.amazonaws.com/style.css"
        );
    }

    #[test]
    fn test_error_statuses() {
        let response = error_response(AssetError::InvalidInput("empty".to_string()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = error_response(AssetError::CloudStorage("NoSuchBucket".to_string()));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
