use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::core::config::DEFAULT_FRONTEND_ORIGIN;

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_FRONTEND_ORIGIN.to_string()],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: vec![
                "Origin".to_string(),
                "Content-Type".to_string(),
                "Authorization".to_string(),
            ],
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn with_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Credentials rule out wildcards, so every origin is listed explicitly.
    pub fn build(self) -> CorsLayer {
        let mut origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring unparseable CORS origin: {o}");
                    None
                }
            })
            .collect();
        if origins.is_empty() {
            origins.push(HeaderValue::from_static(DEFAULT_FRONTEND_ORIGIN));
        }

        let headers: Vec<header::HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();

        let mut cors = CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(self.allowed_methods)
            .allow_headers(headers);

        if self.allow_credentials {
            cors = cors.allow_credentials(true);
        }

        cors
    }
}

pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    info!("CORS allowed origins: {:?}", allowed_origins);
    CorsConfig::new()
        .with_origins(allowed_origins.to_vec())
        .build()
}
