//! Emblemgen
//!
//! On-demand emblem compositor. An emblem is a recolored background sprite
//! with a recolored foreground mark blended over it, selected by seven small
//! integers and returned as a PNG.
//!
//! # Features
//!
//! - **Baseline PNG codec**: 8-bit decode with all five scanline filters,
//!   store-mode RGBA encode, no image crate required
//! - **Two-tone recoloring**: yellow/blue sprite masks mapped onto an 18-color palette
//! - **Pluggable origins and caches**: sprites come from any [`AssetOrigin`]
//!   (HTTP or a local directory), responses go into any [`ResponseCache`]
//!
//! # Example
//!
//! ```no_run
//! use emblemgen::{DirOrigin, EmblemService, MemoryCache, ServiceConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::default();
//! let service = EmblemService::new(DirOrigin::new("sprites"), MemoryCache::new(config.cache_capacity), config);
//!
//! let url = url::Url::parse("https://emblems.example/P10-S0-EP0-ES1-EF37-EB5-ET0.png")?;
//! let response = service.handle(&url).await;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;

pub mod error;
pub use error::{Error, Result};

// Baseline PNG reader/writer and checksums
pub mod png;

// Recolor and composite passes
pub mod rendering;

pub mod request;

// Sprite tables and the origins they are fetched from
pub mod assets;

pub mod cache;

// Request orchestration
pub mod service;

#[cfg(feature = "http")]
pub use assets::HttpOrigin;
pub use assets::{AssetOrigin, AssetPath, DirOrigin, Layer};
pub use cache::{MemoryCache, NoCache, ResponseCache};
pub use rendering::{compose_emblem, Bitmap, EmblemColors};
pub use request::EmblemRequest;
pub use service::{CacheStatus, EmblemResponse, EmblemService};

/// Configuration for the emblem service
///
/// Every field has a default, so a JSON config file only needs the keys it
/// changes.
///
/// # Examples
///
/// ```
/// let cfg: emblemgen::ServiceConfig = serde_json::from_str(r#"{"max_age_secs": 60}"#).unwrap();
/// assert_eq!(cfg.max_age_secs, 60);
/// assert_eq!(cfg.fallback_prefix, "emblems/rendered");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL (or directory) of the static sprite origin
    pub asset_origin: String,
    /// Sub-path holding pre-rendered `{key}.png` fallbacks
    pub fallback_prefix: String,
    /// User agent sent to an HTTP origin
    pub user_agent: String,
    /// Timeout for origin requests in milliseconds (none by default)
    pub timeout_ms: Option<u64>,
    /// `Cache-Control` max-age of rendered emblems
    pub max_age_secs: u64,
    /// `Cache-Control` max-age of fallback emblems
    pub fallback_max_age_secs: u64,
    /// Entries kept by the in-process response cache
    pub cache_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            asset_origin: "http://127.0.0.1:8080/".to_string(),
            fallback_prefix: "emblems/rendered".to_string(),
            user_agent: concat!("emblemgen/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: None,
            max_age_secs: 31_536_000,
            fallback_max_age_secs: 3600,
            cache_capacity: 4096,
        }
    }
}

impl ServiceConfig {
    /// Read a JSON config file; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text).map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.max_age_secs, 31_536_000);
        assert_eq!(cfg.fallback_max_age_secs, 3600);
        assert_eq!(cfg.cache_capacity, 4096);
        assert!(cfg.timeout_ms.is_none());
        assert!(cfg.user_agent.starts_with("emblemgen/"));
    }

    #[test]
    fn config_file_errors_are_config_errors() {
        let missing = std::env::temp_dir().join("emblemgen-no-such-config.json");
        assert!(matches!(ServiceConfig::from_json_file(&missing), Err(Error::ConfigError(_))));

        let bad = std::env::temp_dir().join(format!("emblemgen-bad-config-{}.json", std::process::id()));
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(ServiceConfig::from_json_file(&bad), Err(Error::ConfigError(_))));
        let _ = std::fs::remove_file(&bad);
    }
}
